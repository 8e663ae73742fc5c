//! Built-in command table.
//!
//! Template paths are relative to the asset root. Coordinates assume the background sizes noted
//! next to each command.

use std::{collections::BTreeSet, f64::consts::PI};

use crate::{
    dispatch::router::{
        CaptionPolicy, CommandAction, CommandDefinition, CommandTable, TargetPolicy,
    },
    foundation::core::{Color, Fps},
    foundation::error::BotResult,
    template::dsl::{animated_variant, avatar, image, invoker_avatar, static_variant, text},
    template::model::{ImageSource, Placement, TemplateVariant, TextSource},
};

pub const DEFAULT_FONT: &str = "fonts/DejaVuSans-Bold.ttf";

pub fn builtin_table() -> BotResult<CommandTable> {
    CommandTable::new(builtin_commands())
}

pub fn builtin_commands() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("hello", "Say hello.", CommandAction::Text("Hello!".into())),
        CommandDefinition::new("help", "List the available commands.", CommandAction::Help)
            .aliases(&["commands"]),
        CommandDefinition::new(
            "avatar",
            "Show someone's avatar (yours by default).",
            CommandAction::Avatar,
        )
        .aliases(&["av", "pfp"])
        .targets(TargetPolicy::OrSelf),
        media("slap", "Slap someone.", TargetPolicy::Required(1), slap()),
        media("punch", "Punch someone.", TargetPolicy::Required(1), punch()),
        media("hug", "Hug someone.", TargetPolicy::Required(1), hug()),
        media("pat", "Pat someone on the head.", TargetPolicy::Required(1), pat()),
        media("bonk", "Bonk someone.", TargetPolicy::Required(1), bonk()),
        media("ship", "Ship two people.", TargetPolicy::Required(2), ship()),
        media("wanted", "Put up a wanted poster.", TargetPolicy::OrSelf, wanted()),
        media("jail", "Lock someone up.", TargetPolicy::OrSelf, jail()),
        media("trash", "Take out the trash.", TargetPolicy::OrSelf, trash()),
        media("rip", "Rest in peace.", TargetPolicy::OrSelf, rip())
            .caption(CaptionPolicy::Optional)
            .max_caption_chars(40),
        media("triggered", "Get triggered.", TargetPolicy::OrSelf, triggered())
            .aliases(&["trigger"]),
        media("come", "Shout something.", TargetPolicy::None, come())
            .caption(CaptionPolicy::Required)
            .max_caption_chars(60),
        media("sign", "Hold up a sign.", TargetPolicy::None, sign())
            .caption(CaptionPolicy::Required)
            .max_caption_chars(120),
    ]
}

fn media(
    token: &str,
    description: &str,
    targets: TargetPolicy,
    variants: Vec<TemplateVariant>,
) -> CommandDefinition {
    CommandDefinition::new(token, description, CommandAction::Media(variants)).targets(targets)
}

/// Every template-directory asset the table references, for provisioning and checks.
pub fn required_assets(table: &CommandTable) -> BTreeSet<String> {
    table
        .iter()
        .filter_map(|c| match &c.action {
            CommandAction::Media(variants) => Some(variants),
            _ => None,
        })
        .flatten()
        .flat_map(|v| v.template_requests())
        .map(|r| r.asset.location().to_string())
        .collect()
}

fn fps(n: u32) -> Fps {
    Fps { num: n, den: 1 }
}

fn caption_text(size: f32, y: f64) -> Placement {
    text(TextSource::Caption, DEFAULT_FONT, size, 0.0, y)
        .fill(Color::WHITE)
        .stroke(Color::BLACK, 3.0)
        .build()
}

// 500x300 backgrounds
fn slap() -> Vec<TemplateVariant> {
    vec![
        static_variant(
            0,
            "templates/slap/0.png",
            vec![
                invoker_avatar(300.0, 40.0, 110.0).round().build(),
                avatar(0, 80.0, 120.0, 110.0).round().build(),
            ],
        ),
        static_variant(
            1,
            "templates/slap/1.png",
            vec![
                invoker_avatar(340.0, 20.0, 100.0).build(),
                avatar(0, 300.0, -150.0, 100.0).rotate(PI / 6.0).build(),
            ],
        ),
    ]
}

// 400x400 png or 400x400 gif
fn punch() -> Vec<TemplateVariant> {
    vec![
        static_variant(
            0,
            "templates/punch/0.png",
            vec![avatar(0, 230.0, 120.0, 130.0).round().build()],
        ),
        animated_variant(
            1,
            "templates/punch/anim.gif",
            fps(15),
            vec![avatar(0, 230.0, 120.0, 130.0).round().build()],
        ),
    ]
}

// 480x320
fn hug() -> Vec<TemplateVariant> {
    vec![
        static_variant(
            0,
            "templates/hug/0.png",
            vec![
                invoker_avatar(90.0, 60.0, 120.0).round().build(),
                avatar(0, 270.0, 60.0, 120.0).round().build(),
            ],
        ),
        static_variant(
            1,
            "templates/hug/1.png",
            vec![
                invoker_avatar(60.0, 90.0, 110.0).round().build(),
                avatar(0, 300.0, 90.0, 110.0).round().build(),
            ],
        ),
    ]
}

// 320x320 gif
fn pat() -> Vec<TemplateVariant> {
    vec![animated_variant(
        0,
        "templates/pat/pat.gif",
        fps(20),
        vec![avatar(0, 90.0, 150.0, 150.0).round().build()],
    )]
}

// 500x350
fn bonk() -> Vec<TemplateVariant> {
    vec![static_variant(
        0,
        "templates/bonk/0.png",
        vec![
            invoker_avatar(60.0, 80.0, 120.0).round().build(),
            avatar(0, 360.0, -40.0, 120.0)
                .rotate(PI / 12.0)
                .round()
                .build(),
        ],
    )]
}

// 600x300
fn ship() -> Vec<TemplateVariant> {
    let name = |i: usize, x: f64| {
        text(TextSource::SubjectName(i), DEFAULT_FONT, 22.0, x, 250.0)
            .absolute()
            .max_width(180.0)
            .fill(Color::WHITE)
            .stroke(Color::BLACK, 2.0)
            .build()
    };
    vec![static_variant(
        0,
        "templates/ship/0.png",
        vec![
            avatar(0, 40.0, 50.0, 180.0).round().build(),
            avatar(1, 380.0, 50.0, 180.0).round().build(),
            name(0, 40.0),
            name(1, 380.0),
        ],
    )]
}

// 400x560
fn wanted() -> Vec<TemplateVariant> {
    vec![static_variant(
        0,
        "templates/wanted/0.png",
        vec![
            avatar(0, 80.0, 150.0, 240.0).build(),
            text(TextSource::SubjectName(0), DEFAULT_FONT, 32.0, 0.0, 420.0)
                .uppercase()
                .fill(Color::rgb(0x3b, 0x24, 0x0b))
                .build(),
        ],
    )]
}

// 256x256, bars overlay with alpha
fn jail() -> Vec<TemplateVariant> {
    vec![static_variant(
        0,
        "templates/jail/bg.png",
        vec![
            avatar(0, 0.0, 0.0, 256.0).build(),
            image(ImageSource::Asset("templates/jail/bars.png".into()), 0.0, 0.0)
                .size(256.0, 256.0)
                .build(),
        ],
    )]
}

// 480x480
fn trash() -> Vec<TemplateVariant> {
    vec![static_variant(
        0,
        "templates/trash/0.png",
        vec![avatar(0, 300.0, 260.0, 140.0).rotate(-PI / 18.0).build()],
    )]
}

// 420x480
fn rip() -> Vec<TemplateVariant> {
    vec![static_variant(
        0,
        "templates/rip/0.png",
        vec![
            avatar(0, 150.0, 150.0, 120.0).round().build(),
            text(TextSource::SubjectName(0), DEFAULT_FONT, 26.0, 0.0, 290.0)
                .fill(Color::rgb(0x33, 0x33, 0x33))
                .build(),
            text(TextSource::Caption, DEFAULT_FONT, 18.0, 0.0, 330.0)
                .max_width(260.0)
                .fill(Color::rgb(0x33, 0x33, 0x33))
                .build(),
        ],
    )]
}

// 256x310 gif; the avatar covers the frame above the banner
fn triggered() -> Vec<TemplateVariant> {
    vec![animated_variant(
        0,
        "templates/triggered/0.gif",
        fps(20),
        vec![
            avatar(0, 0.0, 0.0, 256.0).build(),
            text(
                TextSource::Literal("TRIGGERED".into()),
                DEFAULT_FONT,
                36.0,
                0.0,
                262.0,
            )
            .fill(Color::rgb(0xff, 0x20, 0x20))
            .stroke(Color::BLACK, 2.0)
            .build(),
        ],
    )]
}

// 640x360
fn come() -> Vec<TemplateVariant> {
    vec![
        static_variant(0, "templates/come/0.png", vec![caption_text(40.0, 280.0)]),
        static_variant(1, "templates/come/1.png", vec![caption_text(40.0, 20.0)]),
    ]
}

// 500x500
fn sign() -> Vec<TemplateVariant> {
    vec![static_variant(
        0,
        "templates/sign/0.png",
        vec![
            text(TextSource::Caption, DEFAULT_FONT, 28.0, 120.0, 110.0)
                .absolute()
                .max_width(260.0)
                .fill(Color::BLACK)
                .build(),
        ],
    )]
}

#[cfg(test)]
#[path = "../../tests/unit/commands/catalog.rs"]
mod tests;
