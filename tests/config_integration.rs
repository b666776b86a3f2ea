use serial_test::serial;
use std::env;
use std::fs;
use story_weaver::config::{AppConfig, ConfigError};
use story_weaver::generation::Backend;

const ARGV0: &str = "story-weaver";

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("STORY_SERVER__PORT");
        env::remove_var("STORY_PERSISTENCE__DATABASE_URL");
        env::remove_var("STORY_GENERATION__BACKEND");
        env::remove_var("STORY_GENERATION__MODEL");
        env::remove_var("STORY_SESSION__SERIALIZE_TURNS");
        env::remove_var("CONFIG_FILE");
        env::remove_var("DATABASE_URL");
        env::remove_var("PORT");
        env::remove_var("TIMEOUT_DISABLED");
    }
}

fn with_db() -> [&'static str; 3] {
    [ARGV0, "--database-url", "postgres://story@localhost/story"]
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args(with_db()).expect("defaults should load");

    assert_eq!(config.server.port, 3000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.persistence.embedding_model, "text-embedding-3-small");
    assert_eq!(config.generation.model, "llama3.2");
    assert_eq!(config.generation.base_url, "http://localhost:11434");
    assert!(config.session.serialize_turns);
    assert!(config.resilience.request_timeout().is_some());

    let settings = config.generation.to_settings().unwrap();
    assert_eq!(settings.backend, Backend::Ollama);
    assert!(settings.api_key.is_none());
}

#[test]
#[serial]
fn test_missing_database_url_fails_fast() {
    clear_env_vars();

    let err = AppConfig::load_from_args([ARGV0]).unwrap_err();

    assert!(matches!(err, ConfigError::Missing("persistence.database_url")));
}

#[test]
#[serial]
fn test_legacy_database_url_env() {
    clear_env_vars();
    unsafe {
        env::set_var("DATABASE_URL", "postgres://legacy@localhost/story");
    }

    let config = AppConfig::load_from_args([ARGV0]).expect("DATABASE_URL should satisfy config");
    assert_eq!(config.persistence.database_url, "postgres://legacy@localhost/story");

    clear_env_vars();
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("STORY_SERVER__PORT", "9090");
        env::set_var("STORY_GENERATION__MODEL", "mistral");
        env::set_var("STORY_SESSION__SERIALIZE_TURNS", "false");
    }

    let config = AppConfig::load_from_args(with_db()).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.generation.model, "mistral");
    assert!(!config.session.serialize_turns);

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_beats_env() {
    clear_env_vars();
    unsafe {
        env::set_var("STORY_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args([
        ARGV0,
        "--database-url",
        "postgres://story@localhost/story",
        "--port",
        "4040",
        "--model",
        "phi3",
        "--timeout-disabled",
        "true",
    ])
    .expect("Failed to load config");

    assert_eq!(config.server.port, 4040);
    assert_eq!(config.generation.model, "phi3");
    assert!(config.resilience.request_timeout().is_none());

    clear_env_vars();
}

#[test]
#[serial]
fn test_invalid_backend_rejected() {
    clear_env_vars();
    unsafe {
        env::set_var("STORY_GENERATION__BACKEND", "carrier-pigeon");
    }

    let err = AppConfig::load_from_args(with_db()).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "generation.backend",
            ..
        }
    ));

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let config_content = r#"
server:
  port: 7070
persistence:
  database_url: "postgres://file@localhost/story"
generation:
  backend: chat
  base_url: "https://api.openai.com"
  model: "gpt-4o-mini"
  api_key: "sk-file"
  fallback_response: "The bard is silent."
"#;

    let dir = tempfile::tempdir().expect("tempdir");
    let file_path = dir.path().join("story.yaml");
    fs::write(&file_path, config_content).expect("Failed to write temp config");

    let config = AppConfig::load_from_args([ARGV0, "--config", file_path.to_str().unwrap()])
        .expect("Failed to load config from file");

    assert_eq!(config.server.port, 7070);
    assert_eq!(config.persistence.database_url, "postgres://file@localhost/story");
    assert_eq!(config.generation.fallback_response, "The bard is silent.");
    let settings = config.generation.to_settings().unwrap();
    assert_eq!(settings.backend, Backend::Chat);
    assert_eq!(settings.api_key.as_deref(), Some("sk-file"));
    assert!(!format!("{:?}", config.generation).contains("sk-file"));
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_env_vars();

    let res = AppConfig::load_from_args([
        ARGV0,
        "--config",
        "/definitely/not/here/story.yaml",
        "--database-url",
        "postgres://story@localhost/story",
    ]);

    assert!(matches!(res, Err(ConfigError::Load(_))));
}
