use std::sync::Arc;

use crate::assets::decode::decode_animation;
use crate::assets::source::AssetRef;
use crate::assets::store::{PreparedAsset, PreparedAssetStore, PreparedFrame, PreparedImage};
use crate::render::compose::{LayoutBindings, SubjectBinding};
use crate::template::dsl::avatar;

use super::*;

fn fps() -> Fps {
    Fps::new(20, 1).unwrap()
}

#[test]
fn frame_count_is_preserved() {
    for n in [1usize, 2, 7] {
        let colors: Vec<[u8; 4]> = (0..n).map(|i| [i as u8 * 30, 0, 0, 255]).collect();
        let anim = decode_animation(&crate::testutil::solid_gif(6, 4, &colors)).unwrap();
        let out = compose_animated(&anim, fps(), |_| Ok(())).unwrap();
        assert_eq!(out.frames.len(), n);
        assert_eq!((out.width, out.height), (6, 4));
    }
}

#[test]
fn no_op_callback_leaves_frames_unchanged() {
    let colors = [[200, 10, 10, 255], [10, 200, 10, 255], [10, 10, 200, 255]];
    let anim = decode_animation(&crate::testutil::solid_gif(8, 8, &colors)).unwrap();
    let out = compose_animated(&anim, fps(), |_| Ok(())).unwrap();

    for (src, dst) in anim.frames.iter().zip(&out.frames) {
        let diff = src
            .image
            .rgba8_premul
            .iter()
            .zip(&dst.rgba8_premul)
            .map(|(a, b)| a.abs_diff(*b))
            .max()
            .unwrap_or(0);
        assert!(diff <= 1, "max channel diff {diff}");
    }
}

#[test]
fn callback_sees_every_frame_in_order() {
    let anim = decode_animation(&crate::testutil::solid_gif(4, 4, &[[0, 0, 0, 255]; 4])).unwrap();
    let mut seen = Vec::new();
    compose_animated(&anim, fps(), |f| {
        assert_eq!(f.frame_count, 4);
        seen.push(f.index);
        Ok(())
    })
    .unwrap();
    assert_eq!(seen, vec![0, 1, 2, 3]);
}

#[test]
fn callback_error_aborts_composition() {
    let anim = decode_animation(&crate::testutil::solid_gif(4, 4, &[[0, 0, 0, 255]; 2])).unwrap();
    let err = compose_animated(&anim, fps(), |f| {
        if f.index == 1 {
            Err(BotError::render("boom"))
        } else {
            Ok(())
        }
    })
    .unwrap_err();
    assert!(matches!(err, BotError::Render(_)));
}

#[test]
fn empty_animation_is_an_asset_error() {
    let anim = PreparedAnimation {
        width: 4,
        height: 4,
        frames: vec![],
    };
    let err = compose_animated(&anim, fps(), |_| Ok(())).unwrap_err();
    assert!(matches!(err, BotError::AssetLoad(_)));
}

#[test]
fn layout_overlay_is_drawn_on_every_frame() {
    let frame = |px: [u8; 4]| PreparedFrame {
        image: PreparedImage {
            width: 10,
            height: 10,
            rgba8_premul: Arc::new(px.repeat(100)),
        },
        delay_ms: 50,
    };
    let anim = PreparedAnimation {
        width: 10,
        height: 10,
        frames: vec![frame([255, 0, 0, 255]), frame([0, 0, 255, 255])],
    };

    let mut store = PreparedAssetStore::default();
    store.insert(
        AssetRef::remote("u"),
        PreparedAsset::Image(PreparedImage {
            width: 1,
            height: 1,
            rgba8_premul: Arc::new(vec![0, 255, 0, 255]),
        }),
    );
    let bindings = LayoutBindings {
        subjects: vec![SubjectBinding {
            display_name: "x".into(),
            avatar: Some(AssetRef::remote("u")),
        }],
        ..Default::default()
    };
    let placements = vec![avatar(0, 0.0, 0.0, 4.0).build()];
    let mut painter = LayoutPainter::new(&store, &bindings);

    let out = compose_animated_layout(&anim, fps(), &placements, &mut painter).unwrap();
    for f in &out.frames {
        assert_eq!(&f.rgba8_premul[0..4], &[0, 255, 0, 255]);
        let last = f.rgba8_premul.len() - 4;
        assert_ne!(&f.rgba8_premul[last..], &[0, 255, 0, 255]);
    }
}
