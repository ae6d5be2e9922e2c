//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use secrecy::SecretString;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values that take precedence over the config file.
///
/// Populated from command-line flags, which fall back to environment
/// variables (`CASTLE_API_SECRET`, `CASTLE_APP_ID`, ...).
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub api_secret: Option<SecretString>,
    pub app_id: Option<String>,
    pub risk_threshold: Option<f64>,
}

impl ConfigOverrides {
    /// Apply the overrides on top of `config`.
    pub fn apply(self, config: &mut GatewayConfig) {
        if let Some(bind_address) = self.bind_address {
            config.listener.bind_address = bind_address;
        }
        if let Some(secret) = self.api_secret {
            config.scoring.api_secret = Some(secret);
        }
        if let Some(app_id) = self.app_id {
            config.scoring.app_id = Some(app_id);
        }
        if let Some(threshold) = self.risk_threshold {
            config.scoring.risk_threshold = threshold;
        }
    }
}

/// Parse a configuration file without validating it.
pub fn read_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Build the effective configuration: defaults or file, then overrides,
/// then validation.
pub fn load_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => GatewayConfig::default(),
    };

    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    fn overrides() -> ConfigOverrides {
        ConfigOverrides {
            api_secret: Some(SecretString::from("secret")),
            app_id: Some("app".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_with_overrides() {
        let mut overrides = overrides();
        overrides.risk_threshold = Some(0.5);
        overrides.bind_address = Some("127.0.0.1:9999".to_string());

        let config = load_config(None, overrides).unwrap();
        assert_eq!(config.scoring.risk_threshold, 0.5);
        assert_eq!(config.listener.bind_address, "127.0.0.1:9999");
        assert_eq!(
            config.scoring.api_secret.as_ref().unwrap().expose_secret(),
            "secret"
        );
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let err = load_config(None, ConfigOverrides::default()).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(message.contains("CASTLE_API_SECRET not provided"));
        assert!(message.contains("CASTLE_APP_ID not provided"));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "risk-gateway-config-{}.toml",
            std::process::id()
        ));
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[scoring]\nrisk_threshold = 0.8\ntimeout_ms = 500").unwrap();

        let config = load_config(Some(&path), overrides()).unwrap();
        assert_eq!(config.scoring.risk_threshold, 0.8);
        assert_eq!(config.scoring.timeout_ms, 500);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Some(Path::new("/nonexistent/gateway.toml")), overrides())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
