use std::io;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// sqlx logs every statement at info; keep that out of normal runs.
pub const DEFAULT_LOG_FILTER: &str = "info,sqlx=warn";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_filter: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            loki_enabled: lookup("LOKI_ENABLED")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(false),
            loki_url: lookup("LOKI_URL").filter(|v| !v.trim().is_empty()),
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| "gold-tracker".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            log_filter: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.loki_enabled && self.loki_url.is_none() {
            return Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string());
        }
        Ok(())
    }
}

/// Install the global subscriber. Log lines go to stderr so command output
/// (CSV export in particular) can be piped from stdout untouched.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    #[cfg(feature = "loki")]
    {
        if let (true, Some(loki_url)) = (config.loki_enabled, config.loki_url.clone()) {
            return init_with_loki(config, &loki_url);
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(&config.log_filter)?)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()?;

    tracing::debug!("Console logging initialized with filter {}", config.log_filter);
    Ok(())
}

#[cfg(feature = "loki")]
fn init_with_loki(
    config: LoggingConfig,
    loki_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let (loki_layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url::Url::parse(loki_url)?)?;

    // Ships buffered log lines to Loki in the background
    tokio::spawn(task);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_new(&config.log_filter)?)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(loki_layer)
        .try_init()?;

    tracing::info!("✅ Loki logging initialized at {}", loki_url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> LoggingConfig {
        LoggingConfig::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
    }

    #[test]
    fn test_defaults_quiet_sqlx() {
        let config = config_from(&[]);
        assert!(!config.loki_enabled);
        assert_eq!(config.service_name, "gold-tracker");
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_loki_requires_url() {
        assert!(config_from(&[("LOKI_ENABLED", "true")]).validate().is_err());
        assert!(config_from(&[("LOKI_ENABLED", "true"), ("LOKI_URL", "http://localhost:3100")])
            .validate()
            .is_ok());
        assert!(config_from(&[("LOKI_ENABLED", "yes")]).validate().is_ok());
    }
}
