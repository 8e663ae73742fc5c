use std::sync::Arc;

use crate::assets::store::{PreparedAsset, PreparedFont};
use crate::foundation::core::Color;
use crate::template::dsl::{avatar, image, invoker_avatar, text};

use super::*;

const FONT: &str = "fonts/DejaVuSans-Bold.ttf";
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn solid(w: u32, h: u32, px: [u8; 4]) -> PreparedImage {
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(px.repeat((w * h) as usize)),
    }
}

fn pixel(frame: &RasterFrame, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    frame.rgba8_premul[i..i + 4].try_into().unwrap()
}

#[test]
fn text_only_layout_yields_background_sized_raster() {
    let Some(font) = crate::testutil::font_bytes() else {
        return;
    };
    let mut store = PreparedAssetStore::default();
    store.insert(
        AssetRef::local(FONT),
        PreparedAsset::Font(PreparedFont {
            bytes: Arc::new(font),
        }),
    );
    let bindings = LayoutBindings {
        caption: "hello there".to_string(),
        ..Default::default()
    };
    let placements = vec![
        text(TextSource::Caption, FONT, 24.0, 0.0, 10.0)
            .fill(Color::WHITE)
            .stroke(Color::BLACK, 2.0)
            .build(),
    ];

    let bg = solid(120, 60, BLUE);
    let mut painter = LayoutPainter::new(&store, &bindings);
    let frame = compose_static(&bg, &placements, &mut painter).unwrap();

    assert_eq!((frame.width, frame.height), (120, 60));
    assert_eq!(frame.rgba8_premul.len(), 120 * 60 * 4);
    assert!(frame.rgba8_premul.chunks_exact(4).any(|px| px != BLUE));
}

#[test]
fn empty_caption_draws_nothing_and_needs_no_font() {
    let store = PreparedAssetStore::default();
    let bindings = LayoutBindings::default();
    let placements = vec![text(TextSource::Caption, FONT, 24.0, 0.0, 0.0).build()];

    let bg = solid(10, 10, BLUE);
    let mut painter = LayoutPainter::new(&store, &bindings);
    let frame = compose_static(&bg, &placements, &mut painter).unwrap();
    assert!(frame.rgba8_premul.chunks_exact(4).all(|px| px == BLUE));
}

#[test]
fn avatars_and_overlays_resolve_by_role() {
    let mut store = PreparedAssetStore::default();
    store.insert(
        AssetRef::remote("https://cdn/a.png"),
        PreparedAsset::Image(solid(2, 2, GREEN)),
    );
    store.insert(
        AssetRef::local("stamp.png"),
        PreparedAsset::Image(solid(2, 2, [255, 0, 0, 255])),
    );
    let bindings = LayoutBindings {
        subjects: vec![SubjectBinding {
            display_name: "Alice".into(),
            avatar: Some(AssetRef::remote("https://cdn/a.png")),
        }],
        ..Default::default()
    };
    let placements = vec![
        avatar(0, 0.0, 0.0, 10.0).build(),
        image(ImageSource::Asset("stamp.png".into()), 20.0, 20.0)
            .size(10.0, 10.0)
            .build(),
        // invoker has no avatar URL: transparent placeholder
        invoker_avatar(30.0, 0.0, 10.0).build(),
    ];

    let bg = solid(40, 40, BLUE);
    let mut painter = LayoutPainter::new(&store, &bindings);
    let frame = compose_static(&bg, &placements, &mut painter).unwrap();
    assert_eq!(pixel(&frame, 5, 5), GREEN);
    assert_eq!(pixel(&frame, 25, 25), [255, 0, 0, 255]);
    assert_eq!(pixel(&frame, 35, 5), BLUE);
}

#[test]
fn rotation_does_not_leak_into_next_placement() {
    let mut store = PreparedAssetStore::default();
    store.insert(
        AssetRef::local("g.png"),
        PreparedAsset::Image(solid(2, 2, GREEN)),
    );
    let bindings = LayoutBindings::default();
    let placements = vec![
        image(ImageSource::Asset("g.png".into()), 0.0, 0.0)
            .size(4.0, 4.0)
            .rotate(std::f64::consts::FRAC_PI_2)
            .build(),
        image(ImageSource::Asset("g.png".into()), 10.0, 10.0)
            .size(10.0, 10.0)
            .build(),
    ];

    let bg = solid(30, 30, BLUE);
    let mut painter = LayoutPainter::new(&store, &bindings);
    let frame = compose_static(&bg, &placements, &mut painter).unwrap();
    assert_eq!(pixel(&frame, 15, 15), GREEN);
    assert_eq!(pixel(&frame, 25, 25), BLUE);
}

#[test]
fn unbound_subject_is_a_validation_error() {
    let store = PreparedAssetStore::default();
    let bindings = LayoutBindings::default();
    let placements = vec![avatar(1, 0.0, 0.0, 4.0).build()];

    let bg = solid(8, 8, BLUE);
    let mut painter = LayoutPainter::new(&store, &bindings);
    let err = compose_static(&bg, &placements, &mut painter).unwrap_err();
    assert!(matches!(err, BotError::Validation(_)));
}
