use super::*;

#[test]
fn canvas_rejects_zero_and_oversized() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    assert!(Canvas::new(70_000, 10).is_err());
    assert_eq!(
        Canvas::new(640, 480).unwrap(),
        Canvas {
            width: 640,
            height: 480
        }
    );
}

#[test]
fn fps_rejects_zero_and_reports_delay() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(10, 0).is_err());

    let fps = Fps::new(20, 1).unwrap();
    assert_eq!(fps.frame_delay_ms_ratio(), (1000, 20));
    assert_eq!(Fps::new(30, 2).unwrap().frame_delay_ms_ratio(), (2000, 30));
}

#[test]
fn parses_hex_rgb_and_rgba() {
    assert_eq!(Color::from_hex("#ff0000").unwrap(), Color::rgb(255, 0, 0));
    assert_eq!(
        Color::from_hex("0000FF80").unwrap(),
        Color::rgba(0, 0, 255, 0x80)
    );
    assert!(Color::from_hex("#fff").is_err());
    assert!(Color::from_hex("#gg0000").is_err());
}

#[test]
fn color_serde_uses_hex_strings() {
    let c: Color = serde_json::from_value(serde_json::json!("#10203040")).unwrap();
    assert_eq!(c, Color::rgba(0x10, 0x20, 0x30, 0x40));
    assert_eq!(
        serde_json::to_value(Color::WHITE).unwrap(),
        serde_json::json!("#ffffff")
    );
}

#[test]
fn embed_color_packs_rgb() {
    assert_eq!(Color::rgb(0x12, 0x34, 0x56).to_rgb_u32(), 0x123456);
}
