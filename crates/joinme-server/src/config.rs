use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use joinme_gateway::DeliveryPolicy;

/// Placeholder secrets that must never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} is unset or still a placeholder")]
    Placeholder(&'static str),

    #[error("{key}='{value}' is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub blob_dir: PathBuf,
    pub public_url: String,
    pub platform_url: String,
    pub bot_token: String,
    pub event_secret: String,
    pub delivery_policy: DeliveryPolicy,
    pub pending_ttl: Duration,
    pub reap_interval: Duration,
    pub register_commands: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = or("JOINME_PORT", "3400");
        let port = port.parse().map_err(|_| ConfigError::Invalid {
            key: "JOINME_PORT",
            value: port.clone(),
            reason: "expected a port number",
        })?;

        let platform_url = get("JOINME_PLATFORM_URL").ok_or(ConfigError::Missing("JOINME_PLATFORM_URL"))?;
        let bot_token = secret(get("JOINME_BOT_TOKEN"), "JOINME_BOT_TOKEN")?;
        let event_secret = secret(get("JOINME_EVENT_SECRET"), "JOINME_EVENT_SECRET")?;

        let policy = or("JOINME_DELIVERY_POLICY", "all");
        let delivery_policy = DeliveryPolicy::parse(&policy).ok_or(ConfigError::Invalid {
            key: "JOINME_DELIVERY_POLICY",
            value: policy.clone(),
            reason: "expected 'all' or 'random'",
        })?;

        let register = or("JOINME_REGISTER_COMMANDS", "false");
        let register_commands = match register.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => {
                return Err(ConfigError::Invalid {
                    key: "JOINME_REGISTER_COMMANDS",
                    value: register,
                    reason: "expected true or false",
                });
            }
        };

        Ok(Self {
            host: or("JOINME_HOST", "0.0.0.0"),
            port,
            db_path: or("JOINME_DB_PATH", "joinme.db").into(),
            blob_dir: or("JOINME_BLOB_DIR", "./attachments").into(),
            public_url: or("JOINME_PUBLIC_URL", "http://localhost:3400")
                .trim_end_matches('/')
                .to_string(),
            platform_url: platform_url.trim_end_matches('/').to_string(),
            bot_token,
            event_secret,
            delivery_policy,
            pending_ttl: seconds("JOINME_PENDING_TTL_SECS", &or("JOINME_PENDING_TTL_SECS", "900"))?,
            reap_interval: seconds("JOINME_REAP_INTERVAL_SECS", &or("JOINME_REAP_INTERVAL_SECS", "300"))?,
            register_commands,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base url relayed blobs are served under.
    pub fn blob_base_url(&self) -> String {
        format!("{}/attachments", self.public_url)
    }
}

fn secret(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !PLACEHOLDER_SECRETS.contains(&v.as_str()) => Ok(v),
        _ => Err(ConfigError::Placeholder(key)),
    }
}

fn seconds(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.parse::<u32>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(u64::from(secs))),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: "expected a positive number of seconds",
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("JOINME_PLATFORM_URL", "http://bridge:8080/"),
        ("JOINME_BOT_TOKEN", "token-123"),
        ("JOINME_EVENT_SECRET", "s3cret"),
    ];

    #[test]
    fn defaults_apply_when_only_required_values_are_set() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:3400");
        assert_eq!(config.platform_url, "http://bridge:8080");
        assert_eq!(config.blob_base_url(), "http://localhost:3400/attachments");
        assert_eq!(config.delivery_policy, DeliveryPolicy::All);
        assert_eq!(config.pending_ttl, Duration::from_secs(900));
        assert_eq!(config.reap_interval, Duration::from_secs(300));
        assert!(!config.register_commands);
    }

    #[test]
    fn overrides_are_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("JOINME_PORT", "8000"),
            ("JOINME_DELIVERY_POLICY", "random"),
            ("JOINME_PENDING_TTL_SECS", "60"),
            ("JOINME_REGISTER_COMMANDS", "true"),
            ("JOINME_PUBLIC_URL", "https://joinme.example/"),
        ]);
        let config = load(&pairs).unwrap();

        assert_eq!(config.port, 8000);
        assert_eq!(config.delivery_policy, DeliveryPolicy::RandomOne);
        assert_eq!(config.pending_ttl, Duration::from_secs(60));
        assert!(config.register_commands);
        assert_eq!(config.blob_base_url(), "https://joinme.example/attachments");
    }

    #[test]
    fn missing_or_placeholder_secrets_are_fatal() {
        let err = load(&REQUIRED[..2]).err().unwrap();
        assert!(matches!(err, ConfigError::Placeholder("JOINME_EVENT_SECRET")));

        let mut pairs = REQUIRED.to_vec();
        pairs[1] = ("JOINME_BOT_TOKEN", "change-me");
        assert!(matches!(load(&pairs), Err(ConfigError::Placeholder("JOINME_BOT_TOKEN"))));

        assert!(matches!(
            load(&REQUIRED[1..]),
            Err(ConfigError::Missing("JOINME_PLATFORM_URL"))
        ));
    }

    #[test]
    fn invalid_values_are_fatal() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("JOINME_REAP_INTERVAL_SECS", "0"));
        assert!(matches!(
            load(&pairs),
            Err(ConfigError::Invalid { key: "JOINME_REAP_INTERVAL_SECS", .. })
        ));

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("JOINME_DELIVERY_POLICY", "first"));
        assert!(matches!(
            load(&pairs),
            Err(ConfigError::Invalid { key: "JOINME_DELIVERY_POLICY", .. })
        ));
    }
}
