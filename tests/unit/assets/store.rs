use crate::assets::source::MemorySource;
use crate::testutil::{font_bytes, mem_sources, solid_gif, solid_png};

use super::*;

#[tokio::test]
async fn prepare_loads_local_and_remote_assets() {
    let local = MemorySource::new()
        .with("slap/bg.png", solid_png(8, 4, [255, 0, 0, 255]))
        .with("triggered/anim.gif", solid_gif(2, 2, &[[0, 0, 0, 255]; 3]));
    let remote = MemorySource::new().with(
        "https://cdn.example/avatars/1/a.png?size=256",
        solid_png(2, 2, [0, 0, 255, 255]),
    );
    let sources = mem_sources(local, remote);

    let bg = AssetRef::local("slap/bg.png");
    let anim = AssetRef::local("triggered/anim.gif");
    let avatar = AssetRef::remote("https://cdn.example/avatars/1/a.png?size=256");
    let requests = vec![
        AssetRequest::image(bg.clone()),
        AssetRequest::animation(anim.clone()),
        AssetRequest::image(avatar.clone()),
        AssetRequest::image(avatar.clone()),
    ];

    let store = PreparedAssetStore::prepare(&requests, &sources).await.unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.image(&bg).unwrap().width, 8);
    assert_eq!(store.animation(&anim).unwrap().frames.len(), 3);
    assert_eq!(store.image(&avatar).unwrap().height, 2);
    assert!(store.animation(&bg).is_err());
}

#[tokio::test]
async fn prepare_fails_when_any_asset_is_missing() {
    let local = MemorySource::new().with("ok.png", solid_png(1, 1, [0, 0, 0, 255]));
    let sources = mem_sources(local, MemorySource::new());
    let requests = vec![
        AssetRequest::image(AssetRef::local("ok.png")),
        AssetRequest::image(AssetRef::local("missing.png")),
    ];

    let err = PreparedAssetStore::prepare(&requests, &sources)
        .await
        .unwrap_err();
    assert!(matches!(err, BotError::AssetLoad(_)), "{err}");
}

#[tokio::test]
async fn undecodable_bytes_surface_as_asset_load() {
    let local = MemorySource::new().with("bg.png", b"definitely not a png".to_vec());
    let sources = mem_sources(local, MemorySource::new());
    let err = PreparedAssetStore::prepare(&[AssetRequest::image(AssetRef::local("bg.png"))], &sources)
        .await
        .unwrap_err();
    assert!(matches!(err, BotError::AssetLoad(_)), "{err}");
    assert!(err.to_string().contains("bg.png"));
}

#[test]
fn unknown_asset_lookup_is_an_error() {
    let store = PreparedAssetStore::default();
    assert!(store.is_empty());
    assert!(store.get(&AssetRef::local("nope.png")).is_err());
}

#[test]
fn transparent_placeholder_is_one_clear_pixel() {
    let p = PreparedImage::transparent_placeholder();
    assert_eq!((p.width, p.height), (1, 1));
    assert_eq!(p.rgba8_premul.as_slice(), &[0, 0, 0, 0]);
}

#[test]
fn text_layout_smoke_with_bundled_font_if_present() {
    let Some(bytes) = font_bytes() else {
        return;
    };
    let font = PreparedFont {
        bytes: Arc::new(bytes),
    };

    let mut engine = TextLayoutEngine::new();
    let short = engine.layout_plain("hi", &font, 32.0, None).unwrap();
    let long = engine.layout_plain("hello there", &font, 32.0, None).unwrap();
    assert!(short.width() > 0.0);
    assert!(long.width() > short.width());
    assert!(engine.layout_plain("x", &font, 0.0, None).is_err());
}
