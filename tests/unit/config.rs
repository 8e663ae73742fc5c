use clap::Parser;

use super::*;

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    config: BotConfig,
}

fn config(token: Option<&str>) -> BotConfig {
    BotConfig {
        token: token.map(str::to_string),
        prefix: "!".into(),
        assets_root: "assets".into(),
        avatar_size: 256,
        ignore_bots: true,
        keepalive_port: None,
    }
}

#[test]
fn flags_parse_with_defaults() {
    let cli = TestCli::try_parse_from([
        "memeforge",
        "--token",
        "abc",
        "--prefix",
        "?",
        "--ignore-bots",
        "false",
        "--port",
        "3000",
        "--assets-root",
        "/srv/assets",
        "--avatar-size",
        "512",
    ])
    .unwrap();
    let c = cli.config;
    assert_eq!(c.validate().unwrap(), "abc");
    assert_eq!(c.prefix, "?");
    assert!(!c.ignore_bots);
    assert_eq!(c.keepalive_port, Some(3000));
    assert_eq!(c.avatar_size, 512);
}

#[test]
fn missing_or_blank_token_is_fatal() {
    assert!(config(None).validate().is_err());
    assert!(config(Some("   ")).validate().is_err());
    assert_eq!(config(Some(" t0k ")).validate().unwrap(), "t0k");
}

#[test]
fn bad_prefix_is_rejected() {
    let mut c = config(Some("t"));
    c.prefix = String::new();
    assert!(c.validate().is_err());
    c.prefix = "! ".into();
    assert!(c.validate().is_err());
}

#[test]
fn debug_never_prints_token() {
    let out = format!("{:?}", config(Some("super-secret")));
    assert!(!out.contains("super-secret"));
    assert!(out.contains("<redacted>"));
}
