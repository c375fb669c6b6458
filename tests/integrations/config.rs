use alertsms::cli::Cli;
use alertsms::config::Config;
use serial_test::serial;
use std::io::Write;
use std::net::SocketAddr;
use tempfile::NamedTempFile;

const CREDENTIAL_VARS: [&str; 4] = ["SID", "TOKEN", "RECEIVER", "SENDER"];

fn clear_env() {
    for var in CREDENTIAL_VARS {
        std::env::remove_var(var);
    }
    for (key, _) in std::env::vars() {
        if key.starts_with("ALERTSMS_") {
            std::env::remove_var(key);
        }
    }
}

fn config_file(toml_content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", toml_content).unwrap();
    file
}

#[test]
#[serial]
fn test_load_full_valid_config() {
    clear_env();
    let file = config_file(
        r#"
        log_level = "debug"
        [server]
        listen_address = "127.0.0.1:9000"
        request_timeout_seconds = 30
        [dispatch]
        pacing_interval_ms = 250
        [twilio]
        account_sid = "AC123"
        auth_token = "secret"
        receiver = "+15550001111"
        sender = "+15550002222"
        api_base_url = "http://localhost:4010"
        timeout_seconds = 3
        [metrics]
        enabled = true
        listen_address = "127.0.0.1:9100"
    "#,
    );

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    let config = Config::load(&cli).unwrap();

    assert_eq!(config.log_level, "debug");
    assert_eq!(
        config.server.listen_address,
        "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
    );
    assert_eq!(config.server.request_timeout_seconds, Some(30));
    assert_eq!(config.dispatch.pacing_interval_ms, 250);
    assert_eq!(config.twilio.account_sid, "AC123");
    assert_eq!(config.twilio.auth_token, "secret");
    assert_eq!(config.twilio.receiver, "+15550001111");
    assert_eq!(config.twilio.sender, "+15550002222");
    assert_eq!(config.twilio.api_base_url, "http://localhost:4010");
    assert_eq!(config.twilio.timeout_seconds, 3);
    assert!(config.metrics.enabled);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_load_default_values() {
    clear_env();
    let file = config_file("");
    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    let config = Config::load(&cli).unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.dispatch.pacing_interval_ms, 100);
    // No credentials anywhere: the relay must refuse to start.
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn test_credentials_come_from_bare_environment_variables() {
    clear_env();
    std::env::set_var("SID", "AC999");
    std::env::set_var("TOKEN", "tok");
    std::env::set_var("RECEIVER", "+15550001111");
    std::env::set_var("SENDER", "+15550002222");

    let config = Config::load(&Cli::default()).unwrap();
    clear_env();

    assert_eq!(config.twilio.account_sid, "AC999");
    assert_eq!(config.twilio.auth_token, "tok");
    // Phone numbers stay strings.
    assert_eq!(config.twilio.receiver, "+15550001111");
    assert_eq!(config.twilio.sender, "+15550002222");
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_environment_overrides_file_and_cli_overrides_environment() {
    clear_env();
    let file = config_file(
        r#"
        [server]
        listen_address = "127.0.0.1:9000"
        [dispatch]
        pacing_interval_ms = 250
        [twilio]
        account_sid = "from-file"
    "#,
    );
    std::env::set_var("SID", "from-env");
    std::env::set_var("ALERTSMS_DISPATCH__PACING_INTERVAL_MS", "500");

    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        pacing_interval_ms: Some(750),
        listen_address: Some("127.0.0.1:9001".to_string()),
        ..Default::default()
    };
    let config = Config::load(&cli).unwrap();
    clear_env();

    assert_eq!(config.twilio.account_sid, "from-env");
    assert_eq!(config.dispatch.pacing_interval_ms, 750);
    assert_eq!(
        config.server.listen_address,
        "127.0.0.1:9001".parse::<SocketAddr>().unwrap()
    );
}

#[test]
#[serial]
fn test_prefixed_environment_variables_are_nested() {
    clear_env();
    std::env::set_var("ALERTSMS_DISPATCH__PACING_INTERVAL_MS", "500");
    std::env::set_var("ALERTSMS_SERVER__REQUEST_TIMEOUT_SECONDS", "15");

    let config = Config::load(&Cli::default()).unwrap();
    clear_env();

    assert_eq!(config.dispatch.pacing_interval_ms, 500);
    assert_eq!(config.server.request_timeout_seconds, Some(15));
}

#[test]
#[serial]
fn test_invalid_value_type() {
    clear_env();
    let file = config_file(
        r#"
        [dispatch]
        pacing_interval_ms = "fast"
    "#,
    );
    let cli = Cli {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };

    assert!(Config::load(&cli).is_err());
}

#[test]
#[serial]
fn test_missing_config_file_is_an_error() {
    clear_env();
    let cli = Cli {
        config: Some("/nonexistent/alertsms.toml".into()),
        ..Default::default()
    };

    assert!(Config::load(&cli).is_err());
}

#[test]
#[serial]
fn test_prefixed_credentials_keep_phone_numbers_as_strings() {
    clear_env();
    std::env::set_var("SENDER", "+15550000000");
    std::env::set_var("ALERTSMS_TWILIO__SENDER", "+15550002222");
    std::env::set_var("ALERTSMS_TWILIO__RECEIVER", "+15550001111");
    std::env::set_var("ALERTSMS_TWILIO__ACCOUNT_SID", "AC321");
    std::env::set_var("ALERTSMS_TWILIO__AUTH_TOKEN", "12345");
    std::env::set_var("ALERTSMS_TWILIO__TIMEOUT_SECONDS", "4");

    let config = Config::load(&Cli::default()).unwrap();
    clear_env();

    // The prefixed variable wins over the bare one.
    assert_eq!(config.twilio.sender, "+15550002222");
    assert_eq!(config.twilio.receiver, "+15550001111");
    assert_eq!(config.twilio.account_sid, "AC321");
    assert_eq!(config.twilio.auth_token, "12345");
    assert_eq!(config.twilio.timeout_seconds, 4);
    assert!(config.validate().is_ok());
}
