use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        BotError::argument_missing("x")
            .to_string()
            .contains("argument missing:")
    );
    assert!(
        BotError::asset_load("x")
            .to_string()
            .contains("asset load error:")
    );
    assert!(
        BotError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(BotError::render("x").to_string().contains("render error:"));
}

#[test]
fn only_argument_missing_is_silent() {
    assert!(BotError::argument_missing("no target").is_silent());
    assert!(!BotError::asset_load("bg.png").is_silent());
    assert!(!BotError::render("encode").is_silent());
    assert!(!BotError::Other(anyhow::anyhow!("boom")).is_silent());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = BotError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
