//! Server configuration from environment variables
//!
//! Environment:
//! - RELAY_HOST: Bind address (default 0.0.0.0)
//! - RELAY_PORT: Bind port, falls back to PORT (default 8000)
//! - RELAY_ALLOWED_ORIGINS: Comma-separated CORS origins (default http://localhost:5173)
//! - URL: Deployed frontend origin, appended to the allowed origins when set
//! - RELAY_OUTBOUND_BUFFER: Per-connection outbound queue size (default 256, max 65536)
//! - RELAY_HEARTBEAT_SECS: Server ping interval (default 25)
//! - RELAY_IDLE_TIMEOUT_SECS: Close connections silent for this long (default 60)
//! - RELAY_LOG_JSON: Emit JSON logs (default false)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{RelayError, RelayResult};

/// Largest accepted per-connection outbound queue
pub const MAX_OUTBOUND_BUFFER: usize = 65_536;

/// Runtime settings for the relay server
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub outbound_buffer: usize,
    pub heartbeat_interval: Duration,
    pub idle_timeout: Duration,
    pub json_logs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            allowed_origins: vec!["http://localhost:5173".to_string()],
            outbound_buffer: 256,
            heartbeat_interval: Duration::from_secs(25),
            idle_timeout: Duration::from_secs(60),
            json_logs: false,
        }
    }
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> RelayResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> RelayResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = parse_or(&lookup, "RELAY_HOST", defaults.host)?;
        let port = match lookup("RELAY_PORT") {
            Some(_) => parse_or(&lookup, "RELAY_PORT", defaults.port)?,
            None => parse_or(&lookup, "PORT", defaults.port)?,
        };

        let mut allowed_origins = match lookup("RELAY_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.allowed_origins,
        };
        if let Some(url) = lookup("URL").filter(|u| !u.trim().is_empty()) {
            let url = url.trim().trim_end_matches('/').to_string();
            if !allowed_origins.contains(&url) {
                allowed_origins.push(url);
            }
        }

        let outbound_buffer: usize = parse_or(&lookup, "RELAY_OUTBOUND_BUFFER", defaults.outbound_buffer)?;
        if outbound_buffer == 0 || outbound_buffer > MAX_OUTBOUND_BUFFER {
            return Err(RelayError::Config {
                key: "RELAY_OUTBOUND_BUFFER",
                value: outbound_buffer.to_string(),
            });
        }

        let heartbeat_secs = parse_or(&lookup, "RELAY_HEARTBEAT_SECS", defaults.heartbeat_interval.as_secs())?;
        let idle_secs = parse_or(&lookup, "RELAY_IDLE_TIMEOUT_SECS", defaults.idle_timeout.as_secs())?;
        if heartbeat_secs == 0 || idle_secs <= heartbeat_secs {
            return Err(RelayError::Config {
                key: "RELAY_IDLE_TIMEOUT_SECS",
                value: format!("{} (heartbeat {})", idle_secs, heartbeat_secs),
            });
        }

        Ok(Self {
            host,
            port,
            allowed_origins,
            outbound_buffer,
            heartbeat_interval: Duration::from_secs(heartbeat_secs),
            idle_timeout: Duration::from_secs(idle_secs),
            json_logs: parse_or(&lookup, "RELAY_LOG_JSON", defaults.json_logs)?,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> RelayResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => Ok(value),
            Err(_) => Err(RelayError::Config { key, value: raw }),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> RelayResult<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:8000");
    }

    #[test]
    fn test_port_fallback() {
        assert_eq!(load(&[("PORT", "3000")]).unwrap().port, 3000);
        assert_eq!(load(&[("PORT", "3000"), ("RELAY_PORT", "4000")]).unwrap().port, 4000);
    }

    #[test]
    fn test_origins_with_url() {
        let config = load(&[
            ("RELAY_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
            ("URL", "https://feed.example/"),
        ])
        .unwrap();
        assert_eq!(
            config.allowed_origins,
            vec!["http://a.test", "http://b.test", "https://feed.example"]
        );
    }

    #[test]
    fn test_invalid_number() {
        let err = load(&[("RELAY_OUTBOUND_BUFFER", "lots")]).unwrap_err();
        assert!(matches!(err, RelayError::Config { key: "RELAY_OUTBOUND_BUFFER", .. }));
    }

    #[test]
    fn test_outbound_buffer_bounds() {
        for raw in ["0", "65537", "18446744073709551615"] {
            let err = load(&[("RELAY_OUTBOUND_BUFFER", raw)]).unwrap_err();
            assert!(matches!(err, RelayError::Config { key: "RELAY_OUTBOUND_BUFFER", .. }), "{}", raw);
        }
        assert_eq!(load(&[("RELAY_OUTBOUND_BUFFER", "65536")]).unwrap().outbound_buffer, MAX_OUTBOUND_BUFFER);
    }

    #[test]
    fn test_idle_timeout_must_exceed_heartbeat() {
        assert!(load(&[("RELAY_HEARTBEAT_SECS", "30"), ("RELAY_IDLE_TIMEOUT_SECS", "30")]).is_err());
        let config = load(&[("RELAY_HEARTBEAT_SECS", "5"), ("RELAY_IDLE_TIMEOUT_SECS", "12")]).unwrap();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(config.idle_timeout, Duration::from_secs(12));
    }

    #[test]
    fn test_json_logs_flag() {
        assert!(load(&[("RELAY_LOG_JSON", "true")]).unwrap().json_logs);
        assert!(load(&[("RELAY_LOG_JSON", "yes")]).is_err());
    }
}
