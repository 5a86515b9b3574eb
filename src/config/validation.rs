use super::{Config, MAX_INLINE_RESULTS};
use anyhow::Result;

/// Validation errors for configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validate a configuration object.
pub fn validate_config(config: &Config) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    match config.telegram.bot_token.as_deref() {
        Some(token) if !token.trim().is_empty() => {}
        _ => errors.push(ConfigValidationError {
            path: "telegram.botToken".to_string(),
            message: "Bot token is required (MEMINDEX_TELEGRAM_TOKEN)".to_string(),
        }),
    }

    if config.http.port == 0 {
        errors.push(ConfigValidationError {
            path: "http.port".to_string(),
            message: "Port must be greater than 0".to_string(),
        });
    }

    if let Err(e) = config.base_url() {
        errors.push(ConfigValidationError {
            path: "http.baseUrl".to_string(),
            message: e.to_string(),
        });
    }

    if config.query.max_results == 0 || config.query.max_results > MAX_INLINE_RESULTS {
        errors.push(ConfigValidationError {
            path: "query.maxResults".to_string(),
            message: format!("Must be between 1 and {MAX_INLINE_RESULTS}"),
        });
    }

    errors
}

/// Validate configuration and return Result.
pub fn validate_config_object(config: &Config) -> Result<()> {
    let errors = validate_config(config);
    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Configuration validation failed:\n{}", messages.join("\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        let mut config = Config::default();
        config.telegram.bot_token = Some("123:abc".to_string());
        config.http.base_url = Some("https://memes.example.com/caption".to_string());
        config
    }

    fn paths(config: &Config) -> Vec<String> {
        validate_config(config).into_iter().map(|e| e.path).collect()
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate_config_object(&valid()).is_ok());
    }

    #[test]
    fn missing_token_and_url_reported() {
        assert_eq!(
            paths(&Config::default()),
            vec!["telegram.botToken", "http.baseUrl"]
        );
    }

    #[test]
    fn blank_token_rejected() {
        let mut config = valid();
        config.telegram.bot_token = Some("  ".to_string());
        assert_eq!(paths(&config), vec!["telegram.botToken"]);
    }

    #[test]
    fn zero_port_rejected() {
        let mut config = valid();
        config.http.port = 0;
        assert_eq!(paths(&config), vec!["http.port"]);
    }

    #[test]
    fn unparseable_base_url_rejected() {
        let mut config = valid();
        config.http.base_url = Some("not a url".to_string());
        assert_eq!(paths(&config), vec!["http.baseUrl"]);
    }

    #[test]
    fn max_results_bounds() {
        let mut config = valid();
        config.query.max_results = 0;
        assert_eq!(paths(&config), vec!["query.maxResults"]);
        config.query.max_results = 51;
        assert_eq!(paths(&config), vec!["query.maxResults"]);
        config.query.max_results = 50;
        assert!(paths(&config).is_empty());
    }

    #[test]
    fn errors_join_into_message() {
        let err = validate_config_object(&Config::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("telegram.botToken"));
        assert!(msg.contains("http.baseUrl"));
    }
}
