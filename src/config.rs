use anyhow::{bail, Context, Result};
use std::str::FromStr;
use std::time::Duration;

use crate::logging::LogOptions;

/// Default base URL of the Cloud Translation v3 REST API
pub const DEFAULT_TRANSLATION_API_URL: &str = "https://translation.googleapis.com/v3";

#[derive(Debug, Clone)]
pub struct Config {
    // HTTP
    pub app_port: u16,

    // Cloud Translation
    pub gcp_project_id: String,
    pub gcp_access_token: Option<String>,
    pub translation_api_url: String,

    // Redis
    pub redis_host: String,
    pub redis_port: u16,

    // Lifecycle
    pub ready_timeout: Duration,
    pub shutdown_timeout: Duration,

    // Logging
    pub logger: LogOptions,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            // HTTP
            app_port: parse_or(&var, "APP_PORT", 80)?,

            // Cloud Translation
            gcp_project_id: var("GOOGLE_CLOUD_PROJECT_ID")
                .context("GOOGLE_CLOUD_PROJECT_ID not set")?,
            gcp_access_token: var("GOOGLE_CLOUD_ACCESS_TOKEN"),
            translation_api_url: var("TRANSLATION_API_URL")
                .unwrap_or_else(|| DEFAULT_TRANSLATION_API_URL.to_string()),

            // Redis
            redis_host: var("REDIS_HOST").context("REDIS_HOST not set")?,
            redis_port: parse_or(&var, "REDIS_PORT", 6379)?,

            // Lifecycle
            ready_timeout: Duration::from_secs(parse_or(&var, "READY_TIMEOUT_SECS", 10)?),
            shutdown_timeout: Duration::from_secs(parse_or(&var, "SHUTDOWN_TIMEOUT_SECS", 10)?),

            // Logging
            logger: LogOptions {
                app_id: var("LOG_APP_ID"),
                json_format: parse_bool_or(&var, "LOG_FORMAT_JSON", false)?,
                output_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            },
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {}", key, value)),
        None => Ok(default),
    }
}

fn parse_bool_or<F>(var: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => bail!("{} has an invalid boolean value: {}", key, v),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("GOOGLE_CLOUD_PROJECT_ID", "demo-project"),
        ("REDIS_HOST", "localhost"),
    ];

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup(REQUIRED)).unwrap();

        assert_eq!(config.app_port, 80);
        assert_eq!(config.gcp_project_id, "demo-project");
        assert_eq!(config.gcp_access_token, None);
        assert_eq!(config.translation_api_url, DEFAULT_TRANSLATION_API_URL);
        assert_eq!(config.redis_host, "localhost");
        assert_eq!(config.redis_port, 6379);
        assert_eq!(config.ready_timeout, Duration::from_secs(10));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(10));
        assert_eq!(config.logger.output_level, "info");
        assert!(!config.logger.json_format);
        assert_eq!(config.logger.app_id, None);
    }

    #[test]
    fn test_missing_project_id_fails() {
        let err = Config::from_lookup(lookup(&[("REDIS_HOST", "localhost")])).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_CLOUD_PROJECT_ID"));
    }

    #[test]
    fn test_missing_redis_host_fails() {
        let err =
            Config::from_lookup(lookup(&[("GOOGLE_CLOUD_PROJECT_ID", "p")])).unwrap_err();
        assert!(err.to_string().contains("REDIS_HOST"));
    }

    #[test]
    fn test_empty_required_value_counts_as_missing() {
        let err = Config::from_lookup(lookup(&[
            ("GOOGLE_CLOUD_PROJECT_ID", "  "),
            ("REDIS_HOST", "localhost"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("GOOGLE_CLOUD_PROJECT_ID"));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend_from_slice(&[
            ("APP_PORT", "8080"),
            ("REDIS_PORT", "6380"),
            ("READY_TIMEOUT_SECS", "3"),
            ("SHUTDOWN_TIMEOUT_SECS", "5"),
            ("LOG_LEVEL", "debug"),
            ("LOG_FORMAT_JSON", "true"),
            ("LOG_APP_ID", "translator-1"),
            ("TRANSLATION_API_URL", "http://localhost:9000"),
            ("GOOGLE_CLOUD_ACCESS_TOKEN", "token"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.app_port, 8080);
        assert_eq!(config.redis_port, 6380);
        assert_eq!(config.ready_timeout, Duration::from_secs(3));
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
        assert_eq!(config.logger.output_level, "debug");
        assert!(config.logger.json_format);
        assert_eq!(config.logger.app_id.as_deref(), Some("translator-1"));
        assert_eq!(config.translation_api_url, "http://localhost:9000");
        assert_eq!(config.gcp_access_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_invalid_port_fails() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("APP_PORT", "eighty"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("APP_PORT"));
    }

    #[test]
    fn test_invalid_bool_fails() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LOG_FORMAT_JSON", "maybe"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("LOG_FORMAT_JSON"));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("GOOGLE_CLOUD_PROJECT_ID", "env-project");
        std::env::set_var("REDIS_HOST", "redis.internal");
        std::env::set_var("APP_PORT", "9090");

        let config = Config::from_env();

        std::env::remove_var("GOOGLE_CLOUD_PROJECT_ID");
        std::env::remove_var("REDIS_HOST");
        std::env::remove_var("APP_PORT");

        let config = config.unwrap();
        assert_eq!(config.gcp_project_id, "env-project");
        assert_eq!(config.redis_host, "redis.internal");
        assert_eq!(config.app_port, 9090);
    }
}
