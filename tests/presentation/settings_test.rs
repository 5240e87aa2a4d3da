use medscribe::presentation::{Environment, Settings};

#[test]
fn given_no_config_files_when_loading_then_defaults_apply() {
    let dir = tempfile::TempDir::new().unwrap();

    let settings = Settings::from_dir(Environment::Test, dir.path()).unwrap();

    assert_eq!(settings.server.port, 8000);
    assert_eq!(settings.llm.provider, "openai");
    assert_eq!(settings.llm.openai_api_key, None);
    assert_eq!(settings.llm.ollama_base_url, "http://localhost:11434/v1");
    assert_eq!(settings.llm.request_timeout_secs, 60);
    assert_eq!(settings.emr.api_url, None);
    assert_eq!(settings.upload.upload_dir, "uploads");
    assert_eq!(settings.upload.max_file_size_mb, 200);
    assert_eq!(settings.max_body_bytes(), 200 * 1024 * 1024);
    assert!(!settings.logging.enable_json);
}

#[test]
fn given_base_and_environment_files_when_loading_then_environment_file_wins() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("base.yaml"),
        "llm:\n  provider: \"ollama\"\nserver:\n  port: 9000\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("prod.yaml"),
        "server:\n  port: 9443\nemr:\n  api_url: \"http://emr.internal:8001\"\n",
    )
    .unwrap();

    let settings = Settings::from_dir(Environment::Prod, dir.path()).unwrap();

    assert_eq!(settings.llm.provider, "ollama");
    assert_eq!(settings.server.port, 9443);
    assert_eq!(settings.emr.api_url.as_deref(), Some("http://emr.internal:8001"));
}

#[test]
fn given_other_environment_file_when_loading_then_it_is_ignored() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("prod.yaml"), "server:\n  port: 9443\n").unwrap();

    let settings = Settings::from_dir(Environment::Local, dir.path()).unwrap();

    assert_eq!(settings.server.port, 8000);
}

#[test]
fn given_malformed_value_when_loading_then_error_is_returned() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("base.yaml"), "server:\n  port: \"not-a-port\"\n").unwrap();

    assert!(Settings::from_dir(Environment::Local, dir.path()).is_err());
}
