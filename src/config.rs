use std::env;

use chrono::Duration;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

const DEFAULT_ORIGIN: &str = "https://pollshare.app";
const DEFAULT_QR_ENDPOINT: &str = "https://api.qrserver.com/v1/create-qr-code/";
const DEFAULT_SESSION_IDLE_MINUTES: i64 = 120;
const MAX_SESSION_IDLE_MINUTES: i64 = 60 * 24 * 7;

lazy_static! {
    static ref ORIGIN_RE: Regex = Regex::new(r"^https?://[^\s/]+(/[^\s]*)?$").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Expected {0} in the environment")]
    Missing(&'static str),
    #[error("{name} must be an http(s) URL, got {value:?}")]
    InvalidUrl { name: &'static str, value: String },
    #[error("{name} must be between 1 and 10080 minutes, got {value:?}")]
    InvalidMinutes { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub origin: String,
    pub qr_endpoint: String,
    pub session_idle: Duration,
}

impl Config {
    /// Reads settings from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let origin = url_setting(&lookup, "POLLSHARE_ORIGIN", DEFAULT_ORIGIN)?;
        let qr_endpoint = url_setting(&lookup, "POLLSHARE_QR_ENDPOINT", DEFAULT_QR_ENDPOINT)?;

        let idle_minutes = match lookup("POLLSHARE_SESSION_IDLE_MINUTES") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(minutes) if (1..=MAX_SESSION_IDLE_MINUTES).contains(&minutes) => minutes,
                _ => {
                    return Err(ConfigError::InvalidMinutes {
                        name: "POLLSHARE_SESSION_IDLE_MINUTES",
                        value: raw,
                    })
                }
            },
            None => DEFAULT_SESSION_IDLE_MINUTES,
        };

        Ok(Self {
            discord_token,
            origin: origin.trim_end_matches('/').to_string(),
            qr_endpoint,
            session_idle: Duration::minutes(idle_minutes),
        })
    }
}

fn url_setting(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
) -> Result<String, ConfigError> {
    let value = lookup(name).unwrap_or_else(|| default.to_string());
    let value = value.trim().to_string();
    if ORIGIN_RE.is_match(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidUrl { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let config = load(&[("DISCORD_TOKEN", "abc")]).unwrap();
        assert_eq!(config.origin, "https://pollshare.app");
        assert_eq!(config.qr_endpoint, DEFAULT_QR_ENDPOINT);
        assert_eq!(config.session_idle, Duration::minutes(120));
    }

    #[test]
    fn token_is_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("DISCORD_TOKEN"));
        assert_eq!(load(&[("DISCORD_TOKEN", " ")]).unwrap_err(), ConfigError::Missing("DISCORD_TOKEN"));
    }

    #[test]
    fn origin_is_validated_and_trimmed() {
        let config = load(&[("DISCORD_TOKEN", "abc"), ("POLLSHARE_ORIGIN", "http://localhost:8080/")]).unwrap();
        assert_eq!(config.origin, "http://localhost:8080");

        let err = load(&[("DISCORD_TOKEN", "abc"), ("POLLSHARE_ORIGIN", "pollshare.app")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { name: "POLLSHARE_ORIGIN", .. }));
    }

    #[test]
    fn idle_minutes_must_be_positive() {
        let config = load(&[("DISCORD_TOKEN", "abc"), ("POLLSHARE_SESSION_IDLE_MINUTES", "15")]).unwrap();
        assert_eq!(config.session_idle, Duration::minutes(15));

        assert!(load(&[("DISCORD_TOKEN", "abc"), ("POLLSHARE_SESSION_IDLE_MINUTES", "0")]).is_err());
        assert!(load(&[("DISCORD_TOKEN", "abc"), ("POLLSHARE_SESSION_IDLE_MINUTES", "soon")]).is_err());
    }
}
