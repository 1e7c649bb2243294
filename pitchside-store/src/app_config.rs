use pitchside_core::rules::BookingRules;
use pitchside_shared::pii::Masked;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub kafka: KafkaConfig,
    pub booking: BookingRules,
    pub gateway: GatewayConfig,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
}

/// Payment gateway credentials. The secret stays wrapped in [`Masked`]
/// from the moment it is read; only masked previews may appear in logs.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub key_id: Option<String>,
    pub key_secret: Option<Masked<String>>,
    #[serde(default)]
    pub allow_synthetic_orders: bool,
}

impl GatewayConfig {
    /// Both halves of the credential pair, when fully configured.
    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.key_id, &self.key_secret) {
            (Some(id), Some(secret)) => Some((id.clone(), secret.clone().into_inner())),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: Masked<String>,
    pub from_email: String,
    pub from_name: String,
}

fn default_smtp_port() -> u16 {
    587
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Layer on the environment-specific file, if any
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Finally environment variables, e.g. PITCHSIDE__SERVER__PORT=9000
            .add_source(config::Environment::with_prefix("PITCHSIDE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_credentials_need_both_halves() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{ "base_url": "https://pay.example.com", "key_id": "rzp_test_key" }"#,
        )
        .unwrap();
        assert!(config.credentials().is_none());
        assert!(!config.allow_synthetic_orders);

        let config: GatewayConfig = serde_json::from_str(
            r#"{ "base_url": "https://pay.example.com", "key_id": "rzp_test_key", "key_secret": "rzp_secret_value" }"#,
        )
        .unwrap();
        let (id, secret) = config.credentials().unwrap();
        assert_eq!(id, "rzp_test_key");
        assert_eq!(secret, "rzp_secret_value");
    }

    #[test]
    fn secrets_do_not_leak_through_debug() {
        let config: GatewayConfig = serde_json::from_str(
            r#"{ "base_url": "https://pay.example.com", "key_id": "rzp_test_key", "key_secret": "rzp_secret_value" }"#,
        )
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("rzp_secret_value"));
    }
}
