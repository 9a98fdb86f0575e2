use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use tracing::info;

use crate::domain::app_config::AppConfig;
use crate::domain::error::{AppError, Result};

/// Optional TOML file read from the working directory
pub const CONFIG_FILE: &str = "sheetsense.toml";

/// Prefix of environment overrides; nested keys are split on `__`,
/// e.g. `SHEETSENSE_PIPELINE__SAMPLE_SIZE=5`
pub const ENV_PREFIX: &str = "SHEETSENSE_";

pub struct ConfigService;

impl ConfigService {
    /// Built-in defaults, then the config file, then the environment
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<AppConfig> {
        Self::load_from(Self::figment())
    }

    pub fn load_from(figment: Figment) -> Result<AppConfig> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ValidationError(format!("invalid configuration: {}", e)))?;

        config
            .pipeline
            .validate()
            .map_err(|e| AppError::ValidationError(format!("invalid pipeline config: {}", e)))?;

        info!(
            host = %config.server.host,
            port = config.server.port,
            extensions = ?config.pipeline.supported_extensions,
            encodings = ?config.pipeline.csv_encodings,
            "Configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_toml(toml: &str) -> Result<AppConfig> {
        ConfigService::load_from(
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(toml)),
        )
    }

    #[test]
    fn test_defaults() {
        let config = with_toml("").unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.pipeline.max_file_size_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn test_toml_overrides_nested_keys() {
        let config = with_toml(
            r#"
            [server]
            port = 8080

            [pipeline]
            sample_size = 5
            csv_encodings = ["utf-8", "gb18030"]

            [pipeline.boolean_tokens]
            truthy = ["Y"]
            falsy = ["N"]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.pipeline.sample_size, 5);
        assert_eq!(config.pipeline.csv_encodings, vec!["utf-8", "gb18030"]);
        assert_eq!(config.pipeline.boolean_tokens.lookup("y"), Some(true));
        assert_eq!(config.pipeline.header_scan_rows, 3);
    }

    #[test]
    fn test_recommender_section() {
        let config = with_toml(
            r#"
            [recommender]
            api_key = "sk-test"
            model = "gpt-4o-mini"
            "#,
        )
        .unwrap();

        assert!(config.recommender.is_enabled());
        assert_eq!(config.recommender.model, "gpt-4o-mini");
        assert_eq!(config.recommender.max_tokens, 1500);
    }

    #[test]
    fn test_invalid_pipeline_is_rejected() {
        let err = with_toml(
            r#"
            [pipeline]
            csv_encodings = ["klingon-8"]
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(err.to_string().contains("klingon-8"));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let err = with_toml("[server]\nport = \"high\"\n").unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
