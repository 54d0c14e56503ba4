use std::io::Write;

use serde_json::json;

use super::*;

fn test_account() -> Value {
    json!({
        "consumer_key": "horse",
        "secret_consumer_key": "staple",
        "access_token": "correct",
        "secret_access_token": "battery",
        "hashtags": ["#wow", "#such", "#hashtag"],
        "error_message": "sample error message",
        "subreddit": "aww",
        "update_rate": "hour",
        "reddit_client_id": "client-id",
        "reddit_client_secret": "client-secret",
        "reddit_user_agent": "relaybot/0.1 by tester"
    })
}

fn document_with(account: Value) -> String {
    json!({ "TestAccount": account }).to_string()
}

fn without(field: &str) -> String {
    let mut account = test_account();
    account
        .as_object_mut()
        .expect("fixture is an object")
        .remove(field);
    document_with(account)
}

fn with(field: &str, value: Value) -> String {
    let mut account = test_account();
    account
        .as_object_mut()
        .expect("fixture is an object")
        .insert(field.to_string(), value);
    document_with(account)
}

#[test]
fn parses_required_fields() {
    let cfg = parse_account_config(&document_with(test_account()), "TestAccount").unwrap();
    assert_eq!(cfg.account, "TestAccount");
    assert_eq!(cfg.twitter.access_token, "correct");
    assert_eq!(cfg.twitter.consumer_key, "horse");
    assert_eq!(cfg.twitter.access_token_secret, "battery");
    assert_eq!(cfg.twitter.consumer_secret, "staple");
    assert_eq!(cfg.update_rate, Timeframe::Hour);
    assert_eq!(cfg.hashtags, vec!["#wow", "#such", "#hashtag"]);
    assert_eq!(cfg.error_message, "sample error message");
    assert_eq!(cfg.subreddit, "aww");
    assert_eq!(cfg.reddit.client_id, "client-id");
    assert_eq!(cfg.reddit.user_agent, "relaybot/0.1 by tester");
}

#[test]
fn applies_defaults_for_optional_fields() {
    let cfg = parse_account_config(&document_with(test_account()), "TestAccount").unwrap();
    assert_eq!(cfg.candidate_limit, 10);
    assert_eq!(cfg.media_hosts, vec!["imgur.com", "redd.it", "reddituploads.com"]);
    assert_eq!(cfg.max_media_bytes, 3_072_000);
    assert_eq!(cfg.max_message_length, 140);
    assert_eq!(cfg.link_length, 23);
    assert_eq!(cfg.max_video_secs, 30);
    assert_eq!(cfg.work_dir, std::env::temp_dir());
    assert_eq!(cfg.request_timeout_secs, 30);
    assert_eq!(cfg.run_timeout_secs, 300);
    assert!(!cfg.fallback_on_error);
}

#[test]
fn optional_fields_override_defaults() {
    let mut account = test_account();
    let obj = account.as_object_mut().expect("fixture is an object");
    obj.insert("candidate_limit".into(), json!(25));
    obj.insert("media_hosts".into(), json!(["i.redd.it"]));
    obj.insert("max_message_length".into(), json!(280));
    obj.insert("work_dir".into(), json!("/var/tmp/relaybot"));
    obj.insert("fallback_on_error".into(), json!(true));

    let cfg = parse_account_config(&document_with(account), "TestAccount").unwrap();

    assert_eq!(cfg.candidate_limit, 25);
    assert_eq!(cfg.media_hosts, vec!["i.redd.it"]);
    assert_eq!(cfg.max_message_length, 280);
    assert_eq!(cfg.work_dir, PathBuf::from("/var/tmp/relaybot"));
    assert!(cfg.fallback_on_error);
    assert_eq!(cfg.message_composer().unwrap().ceiling(), 280);
}

#[test]
fn unknown_account_fails() {
    let result = parse_account_config(&document_with(test_account()), "Nobody");
    assert!(
        matches!(result, Err(ConfigError::UnknownAccount(ref a)) if a == "Nobody"),
        "expected UnknownAccount(Nobody), got: {result:?}"
    );
}

#[test]
fn every_required_field_is_reported_when_missing() {
    for field in [
        "consumer_key",
        "secret_consumer_key",
        "access_token",
        "secret_access_token",
        "hashtags",
        "error_message",
        "subreddit",
        "update_rate",
        "reddit_client_id",
        "reddit_client_secret",
        "reddit_user_agent",
    ] {
        let result = parse_account_config(&without(field), "TestAccount");
        assert!(
            matches!(result, Err(ConfigError::MissingField { field: ref f, .. }) if f == field),
            "expected MissingField({field}), got: {result:?}"
        );
    }
}

#[test]
fn null_required_field_counts_as_missing() {
    let result = parse_account_config(&with("subreddit", Value::Null), "TestAccount");
    assert!(
        matches!(result, Err(ConfigError::MissingField { ref field, .. }) if field == "subreddit"),
        "expected MissingField(subreddit), got: {result:?}"
    );
}

#[test]
fn invalid_update_rate_fails() {
    let result = parse_account_config(&with("update_rate", json!("fortnight")), "TestAccount");
    assert!(
        matches!(result, Err(ConfigError::InvalidField { ref field, .. }) if field == "update_rate"),
        "expected InvalidField(update_rate), got: {result:?}"
    );
}

#[test]
fn non_string_hashtag_fails() {
    let result = parse_account_config(&with("hashtags", json!(["#ok", 7])), "TestAccount");
    assert!(
        matches!(result, Err(ConfigError::InvalidField { ref field, .. }) if field == "hashtags"),
        "expected InvalidField(hashtags), got: {result:?}"
    );
}

#[test]
fn wrong_type_for_credential_fails() {
    let result = parse_account_config(&with("access_token", json!(42)), "TestAccount");
    assert!(
        matches!(result, Err(ConfigError::InvalidField { ref field, .. }) if field == "access_token"),
        "expected InvalidField(access_token), got: {result:?}"
    );
}

#[test]
fn zero_candidate_limit_fails() {
    let result = parse_account_config(&with("candidate_limit", json!(0)), "TestAccount");
    assert!(
        matches!(result, Err(ConfigError::InvalidField { ref field, .. }) if field == "candidate_limit"),
        "expected InvalidField(candidate_limit), got: {result:?}"
    );
}

#[test]
fn tiny_message_ceiling_fails() {
    let result = parse_account_config(&with("max_message_length", json!(20)), "TestAccount");
    assert!(
        matches!(result, Err(ConfigError::MessageCeiling { ceiling: 20, .. })),
        "expected MessageCeiling, got: {result:?}"
    );
}

#[test]
fn error_message_longer_than_ceiling_fails() {
    let doc = with("error_message", json!("x".repeat(141)));
    let result = parse_account_config(&doc, "TestAccount");
    assert!(
        matches!(result, Err(ConfigError::InvalidField { ref field, .. }) if field == "error_message"),
        "expected InvalidField(error_message), got: {result:?}"
    );
}

#[test]
fn error_message_is_measured_against_configured_ceiling() {
    let mut account = test_account();
    let fields = account.as_object_mut().expect("fixture is an object");
    fields.insert("error_message".to_string(), json!("é".repeat(200)));
    fields.insert("max_message_length".to_string(), json!(200));

    let cfg = parse_account_config(&document_with(account), "TestAccount").unwrap();
    assert_eq!(cfg.error_message.chars().count(), 200);
}

#[test]
fn malformed_json_fails() {
    let result = parse_account_config("{ not json", "TestAccount");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn load_reads_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(document_with(test_account()).as_bytes())
        .unwrap();

    let cfg = load_account_config(file.path(), "TestAccount").unwrap();

    assert_eq!(cfg.subreddit, "aww");
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_account_config(&dir.path().join("absent.json"), "TestAccount");
    assert!(matches!(result, Err(ConfigError::Io { .. })));
}

#[test]
fn debug_output_redacts_secrets() {
    let cfg = parse_account_config(&document_with(test_account()), "TestAccount").unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("battery"));
    assert!(!rendered.contains("client-secret"));
}

#[test]
fn shipped_example_config_parses() {
    let cfg = parse_account_config(
        include_str!("../../../config.example.json"),
        "example_account",
    )
    .expect("example config should parse");

    assert_eq!(cfg.subreddit, "aww");
    assert_eq!(cfg.update_rate, Timeframe::Hour);
    assert!(!cfg.fallback_on_error);
}
