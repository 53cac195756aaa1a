use clap::Parser;
use miniapm::cli::Cli;
use miniapm::config::Config;
use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

/// A helper function to run a test with a temporary config file.
fn with_config_file<F>(toml_content: &str, test_fn: F)
where
    F: FnOnce(PathBuf),
{
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", toml_content).unwrap();
    test_fn(file.path().to_path_buf());
}

fn cli_for(path: &PathBuf, extra: &[&str]) -> Cli {
    let mut args = vec!["miniapm", "--config", path.to_str().unwrap()];
    args.extend_from_slice(extra);
    Cli::try_parse_from(args).unwrap()
}

#[test]
#[serial]
fn test_defaults_without_any_source() {
    let config = Config::load(&Cli::default()).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.agent.app_name, "MiniApm-App");
    assert_eq!(config.agent.collection_interval, Duration::from_secs(1));
}

#[test]
#[serial]
fn test_load_full_valid_config() {
    let toml_content = r#"
        log_level = "debug"
        [agent]
        app_name = "checkout-service"
        collection_interval_ms = 250
        console_logging = true
        publish_gauges = false
        [metrics]
        log_gauges = true
        log_interval_seconds = 30
    "#;

    with_config_file(toml_content, |path| {
        let config = Config::load(&cli_for(&path, &[])).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.agent.app_name, "checkout-service");
        assert_eq!(config.agent.collection_interval, Duration::from_millis(250));
        assert!(config.agent.console_logging);
        assert!(!config.agent.publish_gauges);
        assert!(config.metrics.log_gauges);
        assert_eq!(config.metrics.log_interval_seconds, 30);
    });
}

#[test]
#[serial]
fn test_partial_file_keeps_defaults() {
    let toml_content = r#"
        [agent]
        app_name = "partial"
    "#;

    with_config_file(toml_content, |path| {
        let config = Config::load(&cli_for(&path, &[])).unwrap();

        assert_eq!(config.agent.app_name, "partial");
        assert_eq!(config.agent.collection_interval, Duration::from_secs(1));
        assert!(config.agent.publish_gauges);
        assert_eq!(config.log_level, "info");
    });
}

#[test]
#[serial]
fn test_env_overrides_file_and_cli_overrides_env() {
    let toml_content = r#"
        [agent]
        app_name = "from-file"
        collection_interval_ms = 500
    "#;

    with_config_file(toml_content, |path| {
        std::env::set_var("MINIAPM_AGENT__APP_NAME", "from-env");
        std::env::set_var("MINIAPM_AGENT__COLLECTION_INTERVAL_MS", "750");
        std::env::set_var("MINIAPM_AGENT__CONSOLE_LOGGING", "true");

        let from_env = Config::load(&cli_for(&path, &[]));
        let from_cli = Config::load(&cli_for(&path, &["--app-name", "from-cli", "--interval-ms", "100"]));

        std::env::remove_var("MINIAPM_AGENT__APP_NAME");
        std::env::remove_var("MINIAPM_AGENT__COLLECTION_INTERVAL_MS");
        std::env::remove_var("MINIAPM_AGENT__CONSOLE_LOGGING");

        let from_env = from_env.unwrap();
        assert_eq!(from_env.agent.app_name, "from-env");
        assert_eq!(from_env.agent.collection_interval, Duration::from_millis(750));
        assert!(from_env.agent.console_logging);

        let from_cli = from_cli.unwrap();
        assert_eq!(from_cli.agent.app_name, "from-cli");
        assert_eq!(from_cli.agent.collection_interval, Duration::from_millis(100));
        assert!(from_cli.agent.console_logging, "untouched values still come from env");
    });
}

#[test]
#[serial]
fn test_zero_interval_fails_to_load() {
    let toml_content = r#"
        [agent]
        collection_interval_ms = 0
    "#;

    with_config_file(toml_content, |path| {
        let err = Config::load(&cli_for(&path, &[])).unwrap_err();
        assert!(err.to_string().contains("greater than zero"), "{}", err);
    });
}

#[test]
#[serial]
fn test_malformed_file_fails_to_load() {
    with_config_file("[agent\napp_name = ", |path| {
        assert!(Config::load(&cli_for(&path, &[])).is_err());
    });
}
