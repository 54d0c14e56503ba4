use super::*;

#[test]
fn parses_account_and_config() {
    let cli = Cli::try_parse_from(["relaybot", "horse", "config.json"])
        .expect("expected valid cli args");

    assert_eq!(cli.account, "horse");
    assert_eq!(cli.config, PathBuf::from("config.json"));
    assert!(!cli.dry_run);
}

#[test]
fn parses_dry_run_flag() {
    let cli = Cli::try_parse_from(["relaybot", "horse", "config.json", "--dry-run"]).unwrap();
    assert!(cli.dry_run);
}

#[test]
fn parses_error_log_path() {
    let cli = Cli::try_parse_from([
        "relaybot",
        "--error-log",
        "/var/log/relaybot.log",
        "horse",
        "config.json",
    ])
    .unwrap();

    assert_eq!(cli.error_log, Some(PathBuf::from("/var/log/relaybot.log")));
}

#[test]
fn config_path_is_required() {
    assert!(Cli::try_parse_from(["relaybot", "horse"]).is_err());
}

#[test]
fn no_arguments_is_an_error() {
    assert!(Cli::try_parse_from(["relaybot"]).is_err());
}
