use std::env;

use pretty_assertions::assert_eq;
use serial_test::serial;

use techtrackr_be::config::Config;

mod common;

const CONFIG_KEYS: [&str; 6] = [
    "DATABASE_URL",
    "JWT_SECRET",
    "JWT_EXPIRATION_DAYS",
    "HOST",
    "PORT",
    "ENVIRONMENT",
];

fn snapshot_env() -> Vec<(&'static str, Option<String>)> {
    CONFIG_KEYS
        .iter()
        .map(|key| (*key, env::var(key).ok()))
        .collect()
}

fn restore_env(snapshot: Vec<(&'static str, Option<String>)>) {
    unsafe {
        for (key, value) in snapshot {
            match value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

#[test]
#[serial]
fn config_defaults_when_env_is_empty() {
    common::setup_test_env();
    let snapshot = snapshot_env();

    unsafe {
        for key in CONFIG_KEYS {
            env::remove_var(key);
        }
    }

    let config = Config::from_env_only().unwrap();

    assert_eq!(
        config.database_url,
        "postgres://@localhost:5432/techtrackr"
    );
    assert_eq!(config.jwt_expiration_days, 30);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8080);
    assert_eq!(config.environment, "development");
    assert!(config.is_development());
    assert!(!config.is_production());

    restore_env(snapshot);
}

#[test]
#[serial]
fn config_reads_custom_values() {
    common::setup_test_env();
    let snapshot = snapshot_env();

    unsafe {
        env::set_var("DATABASE_URL", "postgres://db:5432/wt");
        env::set_var("JWT_SECRET", "test-secret");
        env::set_var("JWT_EXPIRATION_DAYS", "7");
        env::set_var("HOST", "0.0.0.0");
        env::set_var("PORT", "3000");
        env::set_var("ENVIRONMENT", "production");
    }

    let config = Config::from_env_only().unwrap();

    assert_eq!(config.database_url, "postgres://db:5432/wt");
    assert_eq!(config.jwt_secret, "test-secret");
    assert_eq!(config.jwt_expiration_days, 7);
    assert_eq!(config.server_address(), "0.0.0.0:3000");
    assert!(config.is_production());

    restore_env(snapshot);
}

#[test]
#[serial]
fn invalid_numbers_fall_back_to_defaults() {
    common::setup_test_env();
    let snapshot = snapshot_env();

    unsafe {
        env::set_var("JWT_EXPIRATION_DAYS", "not-a-number");
        env::set_var("PORT", "also-not-a-number");
    }

    let config = Config::from_env_only().unwrap();

    assert_eq!(config.jwt_expiration_days, 30);
    assert_eq!(config.port, 8080);

    restore_env(snapshot);
}
