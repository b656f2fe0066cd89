//! # Configuration
//!
//! Runtime settings read from the environment (a `.env` file is loaded first
//! by the binary). Every value has a development default so the server starts
//! with no configuration at all.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveTime;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite:finance.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8080";
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_MAIL_FROM: &str = "noreply@finance.local";

/// SMTP settings; mail falls back to the log when absent
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub cors_origin: String,
    /// Base URL of the web client, used for links in mails
    pub app_url: String,
    pub cache_ttl: Duration,
    pub smtp: Option<SmtpConfig>,
    pub mail_from: String,
    pub scheduler_enabled: bool,
    pub budget_check_at: NaiveTime,
    pub budget_renew_at: NaiveTime,
    /// Identifies this process when taking scheduler locks
    pub node_id: String,
}

impl Config {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address like 127.0.0.1:3000")?;

        let cache_ttl_secs = match get("CACHE_TTL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("CACHE_TTL_SECS must be a number of seconds, got {raw}"))?,
            None => DEFAULT_CACHE_TTL_SECS,
        };

        let smtp = match get("SMTP_HOST") {
            Some(host) => {
                let port = match get("SMTP_PORT") {
                    Some(raw) => raw
                        .parse::<u16>()
                        .with_context(|| format!("SMTP_PORT must be a port number, got {raw}"))?,
                    None => 587,
                };
                Some(SmtpConfig {
                    host,
                    port,
                    username: get("SMTP_USERNAME"),
                    password: get("SMTP_PASSWORD"),
                })
            }
            None => None,
        };

        let scheduler_enabled = match get("SCHEDULER_ENABLED") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| anyhow!("SCHEDULER_ENABLED must be true or false, got {raw}"))?,
            None => true,
        };

        let app_url = get("APP_URL").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string());

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr,
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            app_url: app_url.trim_end_matches('/').to_string(),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            smtp,
            mail_from: get("MAIL_FROM").unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
            scheduler_enabled,
            budget_check_at: parse_time("BUDGET_CHECK_AT", get("BUDGET_CHECK_AT"), (9, 0))?,
            budget_renew_at: parse_time("BUDGET_RENEW_AT", get("BUDGET_RENEW_AT"), (0, 5))?,
            node_id: get("NODE_ID").unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        })
    }

    /// Configuration used by tests: in-memory database, no SMTP, no scheduler
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            app_url: DEFAULT_CORS_ORIGIN.to_string(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            smtp: None,
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            scheduler_enabled: false,
            budget_check_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            budget_renew_at: NaiveTime::from_hms_opt(0, 5, 0).unwrap(),
            node_id: "test-node".to_string(),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_time(key: &str, raw: Option<String>, default: (u32, u32)) -> Result<NaiveTime> {
    match raw {
        Some(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .with_context(|| format!("{key} must be a time like 09:00, got {raw}")),
        None => NaiveTime::from_hms_opt(default.0, default.1, 0)
            .ok_or_else(|| anyhow!("invalid default time for {key}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.database_url, "sqlite:finance.db");
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert!(config.smtp.is_none());
        assert!(config.scheduler_enabled);
        assert_eq!(config.budget_check_at, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(config.budget_renew_at, NaiveTime::from_hms_opt(0, 5, 0).unwrap());
    }

    #[test]
    fn test_smtp_enabled_by_host() {
        let config = config_from(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "2525"),
            ("SMTP_USERNAME", "mailer"),
        ])
        .unwrap();
        let smtp = config.smtp.expect("smtp should be configured");
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 2525);
        assert_eq!(smtp.username.as_deref(), Some("mailer"));
        assert!(smtp.password.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("BIND_ADDR", "not-an-address")]).is_err());
        assert!(config_from(&[("CACHE_TTL_SECS", "soon")]).is_err());
        assert!(config_from(&[("BUDGET_CHECK_AT", "25:99")]).is_err());
        assert!(config_from(&[("SCHEDULER_ENABLED", "maybe")]).is_err());
    }

    #[test]
    fn test_app_url_trailing_slash_trimmed() {
        let config = config_from(&[("APP_URL", "https://finance.example.com/")]).unwrap();
        assert_eq!(config.app_url, "https://finance.example.com");
    }
}
