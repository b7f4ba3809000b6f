//! Global application configuration.
//!
//! `AppConfig` is a lazily initialized, process-wide singleton loaded from a
//! `.env` file and environment variables. Setters exist so tests and tools can
//! override individual values at runtime.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Runtime configuration for the roster tooling.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    /// SQLite file path or a full `sqlite:` DSN.
    pub database_path: String,
}

static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and the process environment.
    ///
    /// Every value has a default, so this never fails.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "rollcall".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "logs/rollcall.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/rollcall.db".into()),
        }
    }

    /// Returns a snapshot of the global configuration.
    pub fn global() -> AppConfig {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Reloads the configuration from the environment, dropping any overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = AppConfig::from_env();
        }
    }

    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        setter(&mut guard);
    }

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_project_name(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.project_name = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_file = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults_when_env_is_empty() {
        unsafe {
            env::remove_var("DATABASE_PATH");
            env::remove_var("LOG_TO_STDOUT");
            env::remove_var("PROJECT_NAME");
        }

        let cfg = AppConfig::from_env();
        assert_eq!(cfg.database_path, "data/rollcall.db");
        assert_eq!(cfg.project_name, "rollcall");
        assert!(!cfg.log_to_stdout);
    }

    #[test]
    #[serial]
    fn test_env_overrides_defaults() {
        unsafe {
            env::set_var("DATABASE_PATH", "/tmp/roster-test.db");
            env::set_var("LOG_TO_STDOUT", "TRUE");
        }

        let cfg = AppConfig::from_env();
        assert_eq!(cfg.database_path, "/tmp/roster-test.db");
        assert!(cfg.log_to_stdout);

        unsafe {
            env::remove_var("DATABASE_PATH");
            env::remove_var("LOG_TO_STDOUT");
        }
    }

    #[test]
    #[serial]
    fn test_setter_and_reset() {
        unsafe {
            env::remove_var("DATABASE_PATH");
        }
        AppConfig::set_database_path("sqlite::memory:");
        assert_eq!(AppConfig::global().database_path, "sqlite::memory:");

        AppConfig::reset();
        assert_eq!(AppConfig::global().database_path, "data/rollcall.db");
    }
}
