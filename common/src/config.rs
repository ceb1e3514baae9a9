// Configuration management with layered configuration (file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub engine: EngineSettings,
    pub http: HttpSettings,
    pub webhook: WebhookSettings,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Fixed tick period for the scheduler loop
    pub tick_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout for outbound fetches
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookSettings {
    /// Public host rendered into per-source webhook display URLs
    pub public_host: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub metrics_port: u16,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let defaults = Settings::default();
        let builder = Config::builder()
            .set_default("engine.tick_interval_seconds", defaults.engine.tick_interval_seconds)?
            .set_default("http.timeout_seconds", defaults.http.timeout_seconds)?
            .set_default("webhook.public_host", defaults.webhook.public_host)?
            .set_default("observability.log_level", defaults.observability.log_level)?
            .set_default(
                "observability.metrics_port",
                defaults.observability.metrics_port as i64,
            )?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Local overrides, not committed
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.engine.tick_interval_seconds == 0 {
            return Err("Engine tick_interval_seconds must be greater than 0".to_string());
        }
        if 60 % self.engine.tick_interval_seconds != 0 {
            // Exact-minute schedule matching misses due events otherwise
            return Err(
                "Engine tick_interval_seconds must divide evenly into 60".to_string(),
            );
        }
        if self.http.timeout_seconds == 0 {
            return Err("HTTP timeout_seconds must be greater than 0".to_string());
        }
        if self.webhook.public_host.is_empty() {
            return Err("Webhook public_host cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineSettings {
                tick_interval_seconds: 60,
            },
            http: HttpSettings {
                timeout_seconds: 30,
            },
            webhook: WebhookSettings {
                public_host: "stories.local".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                metrics_port: 9090,
            },
        }
    }
}
