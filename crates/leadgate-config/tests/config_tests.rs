// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for layered config loading and diagnostics.

use leadgate_config::{ConfigError, load_and_validate_str, load_config_from_str};
use leadgate_core::NamePolicy;

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").unwrap();
    assert_eq!(config.site.name, "leadgate");
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert_eq!(config.gateway.port, 8620);
    assert_eq!(config.resolver.name_policy, NamePolicy::FirstWins);
}

#[test]
fn full_config_parses() {
    let config = load_config_from_str(
        r#"
[site]
name = "acme"
log_level = "debug"
system_prompt = "You are the Acme assistant."

[storage]
database_path = "/var/lib/acme/acme.db"
wal_mode = true

[gateway]
host = "0.0.0.0"
port = 8080
bearer_token = "s3cret"

[openai]
api_key = "sk-abc"
model = "gpt-4o"
max_tokens = 2048

[voice]
enabled = true
url = "wss://voice.example.com"
room_prefix = "acme-room"
webhook_secret = "hook-s3cret"

[resolver]
name_policy = "last-wins"
"#,
    )
    .unwrap();

    assert_eq!(config.site.name, "acme");
    assert_eq!(config.storage.database_path, "/var/lib/acme/acme.db");
    assert_eq!(config.gateway.bearer_token.as_deref(), Some("s3cret"));
    assert_eq!(config.openai.max_tokens, 2048);
    assert!(config.voice.enabled);
    assert_eq!(config.voice.room_prefix.as_deref(), Some("acme-room"));
    assert_eq!(config.resolver.name_policy, NamePolicy::LastWins);
}

#[test]
fn unknown_key_produces_suggestion_diagnostic() {
    let result = load_and_validate_str(
        r#"
[storage]
databse_path = "/tmp/x.db"
"#,
    );
    let errors = result.unwrap_err();
    assert!(!errors.is_empty());
    let found = errors.iter().any(|e| match e {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => key == "databse_path" && suggestion.as_deref() == Some("database_path"),
        _ => false,
    });
    assert!(found, "expected UnknownKey with suggestion, got {errors:?}");
}

#[test]
fn unknown_key_diagnostic_points_into_the_source() {
    let errors = load_and_validate_str("[gateway]\nprot = 8620\n").unwrap_err();
    let found = errors.iter().any(|e| match e {
        ConfigError::UnknownKey { key, span, src, .. } => {
            key == "prot" && span.is_some() && src.is_some()
        }
        _ => false,
    });
    assert!(found, "expected a spanned UnknownKey, got {errors:?}");
}

#[test]
fn invalid_type_is_reported() {
    let result = load_and_validate_str(
        r#"
[gateway]
port = "not-a-number"
"#,
    );
    let errors = result.unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. } | ConfigError::Other(_))),
        "expected a type diagnostic, got {errors:?}"
    );
}

#[test]
fn validation_runs_after_successful_parse() {
    let result = load_and_validate_str(
        r#"
[site]
log_level = "noisy"
"#,
    );
    let errors = result.unwrap_err();
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("log_level"))
    ));
}

#[test]
fn bad_name_policy_is_rejected_at_parse() {
    let result = load_config_from_str(
        r#"
[resolver]
name_policy = "newest"
"#,
    );
    assert!(result.is_err());
}
