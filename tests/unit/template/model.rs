use crate::assets::store::AssetKind;
use crate::template::dsl::{animated_variant, avatar, image, static_variant, text};

use super::*;

const FONT: &str = "fonts/DejaVuSans-Bold.ttf";

#[test]
fn template_requests_cover_background_overlays_and_fonts() {
    let v = static_variant(
        0,
        "wanted/bg.png",
        vec![
            avatar(0, 10.0, 10.0, 50.0).build(),
            image(ImageSource::Asset("wanted/stamp.png".into()), 0.0, 0.0).build(),
            text(TextSource::SubjectName(0), FONT, 20.0, 0.0, 100.0).build(),
        ],
    );

    let reqs = v.template_requests();
    assert_eq!(reqs.len(), 3);
    assert_eq!(reqs[0].kind, AssetKind::Image);
    assert_eq!(reqs[0].asset, AssetRef::local("wanted/bg.png"));
    assert_eq!(reqs[1].asset, AssetRef::local("wanted/stamp.png"));
    assert_eq!(reqs[2].kind, AssetKind::Font);
}

#[test]
fn animated_background_is_requested_as_animation() {
    let v = animated_variant(0, "t/anim.gif", Fps::new(10, 1).unwrap(), vec![]);
    assert_eq!(v.template_requests()[0].kind, AssetKind::Animation);
}

#[test]
fn subjects_used_counts_highest_index() {
    let v = static_variant(
        0,
        "ship/bg.png",
        vec![
            avatar(0, 0.0, 0.0, 10.0).build(),
            text(TextSource::SubjectName(1), FONT, 10.0, 0.0, 0.0).build(),
        ],
    );
    assert_eq!(v.subjects_used(), 2);
    assert_eq!(static_variant(0, "x.png", vec![]).subjects_used(), 0);
}

#[test]
fn validate_rejects_bad_geometry() {
    let ok = static_variant(0, "a.png", vec![avatar(0, 0.0, 0.0, 10.0).round().build()]);
    ok.validate().unwrap();

    let bad_size = static_variant(0, "a.png", vec![avatar(0, 0.0, 0.0, -1.0).build()]);
    assert!(bad_size.validate().is_err());

    let bad_rot = static_variant(0, "a.png", vec![avatar(0, 0.0, 0.0, 5.0).rotate(f64::NAN).build()]);
    assert!(bad_rot.validate().is_err());

    let bad_font = static_variant(0, "a.png", vec![text(TextSource::Caption, FONT, 0.0, 0.0, 0.0).build()]);
    assert!(bad_font.validate().is_err());

    assert!(static_variant(0, "  ", vec![]).validate().is_err());
}

#[test]
fn stroke_only_text_has_no_fill_pass() {
    let Placement::Text(t) = text(TextSource::Caption, FONT, 10.0, 0.0, 0.0)
        .stroke(Color::BLACK, 3.0)
        .build()
    else {
        panic!("expected text");
    };
    assert_eq!(t.effective_fill(), None);
    assert_eq!(t.effective_stroke(), Some((Color::BLACK, 3.0)));
}

#[test]
fn layout_round_trips_through_json() {
    let v = static_variant(
        7,
        "slap/bg.png",
        vec![
            avatar(0, 1.0, 2.0, 30.0).rotate(0.5).build(),
            text(TextSource::Caption, FONT, 18.0, 0.0, 4.0)
                .fill(Color::WHITE)
                .stroke(Color::BLACK, 2.0)
                .build(),
        ],
    );
    let json = serde_json::to_value(&v).unwrap();
    assert_eq!(json["kind"]["type"], "static");
    assert_eq!(json["layout"][0]["kind"], "image");
    assert_eq!(json["layout"][1]["fill_color"], "#ffffff");

    let back: TemplateVariant = serde_json::from_value(json).unwrap();
    assert_eq!(back, v);
}
