//! Tests for layered configuration loading and validation.

use adsync::config::{ConfigError, ConfigLoader};
use anyhow::Result;
use base64::{Engine as _, engine::general_purpose};
use std::fs;
use tempfile::TempDir;

fn crypto_key_b64() -> String {
    general_purpose::STANDARD.encode([7u8; 32])
}

fn write_env(dir: &TempDir, name: &str, contents: &str) {
    fs::write(dir.path().join(name), contents).expect("write env file");
}

fn base_env() -> String {
    format!(
        "ADSYNC_OPERATOR_TOKEN=op-secret\nADSYNC_CRYPTO_KEY={}\n",
        crypto_key_b64()
    )
}

#[test]
fn loads_a_minimal_env_file() -> Result<()> {
    let dir = TempDir::new()?;
    write_env(
        &dir,
        ".env",
        &format!("{}ADSYNC_DATABASE_URL=sqlite://adsync.db\n", base_env()),
    );

    let config = ConfigLoader::with_base_dir(dir.path().to_path_buf()).load()?;

    assert_eq!(config.database_url, "sqlite://adsync.db");
    assert_eq!(config.operator_tokens, vec!["op-secret".to_string()]);
    assert_eq!(config.crypto_key.as_ref().map(|k| k.len()), Some(32));
    assert_eq!(config.profile, "local");
    assert_eq!(config.sync.default_lookback_days, 7);

    Ok(())
}

#[test]
fn local_file_overrides_base_file() -> Result<()> {
    let dir = TempDir::new()?;
    write_env(&dir, ".env", &format!("{}ADSYNC_LOG_LEVEL=info\n", base_env()));
    write_env(&dir, ".env.local", "ADSYNC_LOG_LEVEL=debug\n");

    let config = ConfigLoader::with_base_dir(dir.path().to_path_buf()).load()?;

    assert_eq!(config.log_level, "debug");

    Ok(())
}

#[test]
fn profile_file_is_layered_on_top() -> Result<()> {
    let dir = TempDir::new()?;
    write_env(
        &dir,
        ".env",
        &format!("{}ADSYNC_PROFILE=staging\nADSYNC_WORKER_POLL_INTERVAL_MS=5000\n", base_env()),
    );
    write_env(&dir, ".env.staging", "ADSYNC_WORKER_POLL_INTERVAL_MS=250\n");

    let config = ConfigLoader::with_base_dir(dir.path().to_path_buf()).load()?;

    assert_eq!(config.profile, "staging");
    assert_eq!(config.worker.poll_interval_ms, 250);

    Ok(())
}

#[test]
fn comma_separated_operator_tokens_are_split() -> Result<()> {
    let dir = TempDir::new()?;
    write_env(
        &dir,
        ".env",
        &format!(
            "ADSYNC_OPERATOR_TOKENS=one, two ,three\nADSYNC_CRYPTO_KEY={}\n",
            crypto_key_b64()
        ),
    );

    let config = ConfigLoader::with_base_dir(dir.path().to_path_buf()).load()?;

    assert_eq!(
        config.operator_tokens,
        vec!["one".to_string(), "two".to_string(), "three".to_string()]
    );

    Ok(())
}

#[test]
fn missing_operator_tokens_fail_validation() {
    let dir = TempDir::new().unwrap();
    write_env(
        &dir,
        ".env",
        &format!("ADSYNC_CRYPTO_KEY={}\n", crypto_key_b64()),
    );

    let result = ConfigLoader::with_base_dir(dir.path().to_path_buf()).load();

    assert!(matches!(result, Err(ConfigError::MissingOperatorTokens)));
}

#[test]
fn invalid_crypto_key_base64_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_env(
        &dir,
        ".env",
        "ADSYNC_OPERATOR_TOKEN=op\nADSYNC_CRYPTO_KEY=!!!not-base64!!!\n",
    );

    let result = ConfigLoader::with_base_dir(dir.path().to_path_buf()).load();

    assert!(matches!(
        result,
        Err(ConfigError::InvalidCryptoKeyBase64 { .. })
    ));
}

#[test]
fn invalid_bind_addr_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_env(
        &dir,
        ".env",
        &format!("{}ADSYNC_API_BIND_ADDR=not-an-addr\n", base_env()),
    );

    let result = ConfigLoader::with_base_dir(dir.path().to_path_buf()).load();

    assert!(matches!(result, Err(ConfigError::InvalidBindAddr { .. })));
}

#[test]
fn out_of_bounds_lookback_fails_validation() {
    let dir = TempDir::new().unwrap();
    write_env(
        &dir,
        ".env",
        &format!("{}ADSYNC_SYNC_DEFAULT_LOOKBACK_DAYS=400\n", base_env()),
    );

    let result = ConfigLoader::with_base_dir(dir.path().to_path_buf()).load();

    assert!(matches!(
        result,
        Err(ConfigError::InvalidDefaultLookbackDays { .. })
    ));
}
