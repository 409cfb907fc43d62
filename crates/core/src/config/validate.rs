use reqwest::Url;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Both endpoints are absolute http(s) URLs
/// - Timeout is not 0
/// - Batch size is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_url("endpoints.base_url", &config.endpoints.base_url)?;
    validate_url("endpoints.item_url", &config.endpoints.item_url)?;

    if config.client.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "client.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.batch.size == 0 {
        return Err(ConfigError::ValidationError(
            "batch.size cannot be 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::ValidationError(format!("{} is not a valid URL: {}", field, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::ValidationError(format!(
            "{} must use http or https, got {}",
            field, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BatchConfig, ClientConfig};

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_timeout_zero_fails() {
        let config = Config {
            client: ClientConfig { timeout_secs: 0 },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_batch_size_zero_fails() {
        let config = Config {
            batch: BatchConfig {
                size: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("batch.size"));
    }

    #[test]
    fn test_validate_relative_url_fails() {
        let mut config = Config::default();
        config.endpoints.item_url = "/items".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("endpoints.item_url"));
    }

    #[test]
    fn test_validate_non_http_scheme_fails() {
        let mut config = Config::default();
        config.endpoints.base_url = "ftp://127.0.0.1/".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }
}
