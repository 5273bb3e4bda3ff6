//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotConfig, LogOutput, LoggingConfig, MachinaConfig};
use std::collections::HashSet;

/// Validates the entire configuration.
pub fn validate_config(config: &MachinaConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates the bot identity.
fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    // Validate user id
    if bot.user_id.is_empty() {
        return Err(ConfigError::missing_field("bot.user_id"));
    }

    // Validate name; the mention grammar matches it as a single word
    if bot.name.is_empty() {
        return Err(ConfigError::missing_field("bot.name"));
    }
    if bot.name.contains(char::is_whitespace) {
        return Err(ConfigError::validation("Bot name cannot contain whitespace"));
    }

    // Validate aliases
    let mut seen = HashSet::new();
    for alias in &bot.aliases {
        if alias.is_empty() {
            return Err(ConfigError::validation(
                "Bot aliases cannot contain empty strings",
            ));
        }
        if !seen.insert(alias.as_str()) {
            return Err(ConfigError::validation(format!(
                "Duplicate bot alias: {alias}"
            )));
        }
    }

    Ok(())
}

/// Validates the logging configuration.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = MachinaConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_user_id() {
        let mut config = MachinaConfig::default();
        config.bot.user_id = String::new();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::MissingField { .. })));
    }

    #[test]
    fn test_validate_name_with_spaces() {
        let mut config = MachinaConfig::default();
        config.bot.name = "mach ina".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_duplicate_alias() {
        let mut config = MachinaConfig::default();
        config.bot.aliases = vec!["?".to_string(), "!".to_string(), "?".to_string()];
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_validate_file_output_requires_path() {
        let mut config = MachinaConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("machina.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
