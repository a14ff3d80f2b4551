use std::collections::HashMap;
use std::path::PathBuf;

use featbot_cli::config::{
    config_info, load_config_from, load_or_init, resolve_config_path, save_config_to,
    CredentialSource, FeatbotConfig, HISTORY_FILE_ENV, REGION_ENV,
};
use tempfile::TempDir;

#[test]
fn defaults_match_the_hosted_setup() {
    let config = FeatbotConfig::default();
    assert_eq!(config.region, "us-east-1");
    assert_eq!(config.chat.model_id, "anthropic.claude-3-haiku-20240307-v1:0");
    assert_eq!(config.chat.max_tokens, 300);
    assert_eq!(config.chat.stop_sequences, vec!["\n\nHuman:".to_string()]);
    let kb = config.knowledge_base.expect("knowledge base enabled by default");
    assert_eq!(kb.knowledge_base_id, "JOLJ0BNXVX");
    assert_eq!(kb.number_of_results, 4);
    assert_eq!(config.history.session_id, "server_1234");
    assert_eq!(config.history.recent_turns, 6);
    assert_eq!(config.memory.max_token_limit, 300);
    assert!(config.use_knowledge_base);
}

#[test]
fn save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut config = FeatbotConfig::default();
    config.region = "eu-west-1".to_string();
    config.chat.temperature = 0.5;
    config.history.session_id = "desk".to_string();
    save_config_to(&config, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    assert_eq!(loaded.config_version, 1);
    assert_eq!(loaded.region, "eu-west-1");
    assert_eq!(loaded.chat, config.chat);
    assert_eq!(loaded.history, config.history);
    assert!(!dir.path().join("nested").join("config.json.tmp").exists());
}

#[cfg(unix)]
#[test]
fn saved_config_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    save_config_to(&FeatbotConfig::default(), &path).unwrap();

    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn minimal_file_fills_in_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "config_version": 1,
            "region": "us-west-2",
            "credentials": { "type": "default_chain" },
            "knowledge_base": { "knowledge_base_id": "KB123" }
        }"#,
    )
    .unwrap();

    let config = load_config_from(&path).unwrap();
    assert!(matches!(config.credentials, CredentialSource::DefaultChain));
    assert_eq!(config.chat.top_p, 0.9);
    let kb = config.knowledge_base.unwrap();
    assert_eq!(kb.knowledge_base_id, "KB123");
    assert_eq!(kb.number_of_results, 4);
}

#[test]
fn null_knowledge_base_disables_it() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "config_version": 1,
            "region": "us-east-1",
            "credentials": { "type": "default_chain" },
            "knowledge_base": null
        }"#,
    )
    .unwrap();

    assert!(load_config_from(&path).unwrap().knowledge_base.is_none());
}

#[test]
fn unversioned_config_is_stamped_v1() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{
            "region": "us-east-1",
            "credentials": { "type": "profile", "profile_name": "work" },
            "knowledge_base": { "knowledge_base_id": "KB42" }
        }"#,
    )
    .unwrap();

    let config = load_config_from(&path).unwrap();
    assert_eq!(config.config_version, 1);
    assert!(matches!(
        config.credentials,
        CredentialSource::Profile { ref profile_name } if profile_name == "work"
    ));
    assert_eq!(config.knowledge_base.unwrap().knowledge_base_id, "KB42");
}

#[test]
fn newer_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "config_version": 99, "region": "us-east-1", "credentials": { "type": "default_chain" } }"#,
    )
    .unwrap();

    let err = load_config_from(&path).unwrap_err();
    assert!(err.to_string().contains("newer than this build supports"));
}

#[test]
fn config_info_redacts_inline_keys() {
    let config = FeatbotConfig {
        credentials: CredentialSource::Inline {
            access_key_id: "AKIAABCDEFGHWXYZ".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
        },
        ..FeatbotConfig::default()
    };

    let info = config_info(&config);
    assert_eq!(info.credential_type, "inline");
    assert_eq!(info.access_key_hint.as_deref(), Some("AKIA...WXYZ"));
    assert_eq!(info.knowledge_base_id.as_deref(), Some("JOLJ0BNXVX"));
    assert!(!serde_json::to_string(&info).unwrap().contains("secret"));
}

#[test]
fn non_ascii_access_key_is_redacted_by_character() {
    let config = FeatbotConfig {
        credentials: CredentialSource::Inline {
            access_key_id: "ÄÖÜßabcdéèêë".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
        },
        ..FeatbotConfig::default()
    };
    assert_eq!(
        config_info(&config).access_key_hint.as_deref(),
        Some("ÄÖÜß...éèêë")
    );

    let short = FeatbotConfig {
        credentials: CredentialSource::Inline {
            access_key_id: "aÄÄÄÄ".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
        },
        ..FeatbotConfig::default()
    };
    assert_eq!(config_info(&short).access_key_hint.as_deref(), Some("****"));
}

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn overrides_replace_history_path_and_region() {
    let mut config = FeatbotConfig::default();
    config.apply_overrides(env(&[
        (HISTORY_FILE_ENV, "/tmp/featbot/history.json"),
        (REGION_ENV, "eu-central-1"),
    ]));

    assert_eq!(config.history.path, PathBuf::from("/tmp/featbot/history.json"));
    assert_eq!(config.region, "eu-central-1");
}

#[test]
fn unset_or_blank_overrides_are_ignored() {
    let mut config = FeatbotConfig::default();
    config.apply_overrides(env(&[(REGION_ENV, "  "), (HISTORY_FILE_ENV, "")]));
    assert_eq!(config.region, "us-east-1");
    assert_eq!(config.history.path, PathBuf::from("chat_history.json"));

    config.apply_overrides(env(&[]));
    assert_eq!(config.region, "us-east-1");
}

#[test]
fn explicit_config_path_wins() {
    let path = resolve_config_path(Some("/etc/featbot.json".into())).unwrap();
    assert_eq!(path, PathBuf::from("/etc/featbot.json"));

    // The default location needs a config directory, which CI may not have.
    if let Ok(default) = resolve_config_path(None) {
        assert!(default.ends_with("featbot/config.json"));
    }
    if let Ok(blank) = resolve_config_path(Some("".into())) {
        assert!(blank.ends_with("featbot/config.json"));
    }
}

#[test]
fn missing_config_writes_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("featbot").join("config.json");

    let config = load_or_init(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.region, "us-east-1");

    let reloaded = load_config_from(&path).unwrap();
    assert_eq!(reloaded.config_version, 1);
    assert_eq!(reloaded.chat, config.chat);
    assert_eq!(reloaded.history, config.history);
}

#[test]
fn existing_config_is_not_overwritten() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    let mut config = FeatbotConfig::default();
    config.region = "ap-southeast-2".to_string();
    save_config_to(&config, &path).unwrap();

    let loaded = load_or_init(&path).unwrap();
    assert_eq!(loaded.region, "ap-southeast-2");
}

#[test]
fn unwritable_default_location_still_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();

    let config = load_or_init(&blocker.join("config.json")).unwrap();
    assert_eq!(config.region, "us-east-1");
}
