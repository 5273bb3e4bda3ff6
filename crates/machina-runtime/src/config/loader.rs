//! Layered configuration loading, built on figment.
//!
//! Sources merge lowest to highest priority:
//!
//! 1. schema defaults,
//! 2. a profile-specific file (`machina.{profile}.toml`),
//! 3. the first base file found on the search paths (`machina.toml`,
//!    `config.toml`; YAML variants behind the `yaml-config` feature),
//! 4. `MACHINA_*` environment variables, with `__` separating nesting:
//!    `MACHINA_BOT__NAME=marvin` sets `bot.name`,
//! 5. programmatic overrides ([`ConfigLoader::merge`]).
//!
//! When a file is named explicitly via [`ConfigLoader::file`], the search
//! is skipped and a missing file is an error; a fruitless search only
//! means defaults.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::MachinaConfig;

/// File names probed on each search path, in priority order. Entries for
/// disabled formats are compiled out.
const FILE_NAMES: &[&str] = &[
    #[cfg(feature = "toml-config")]
    "machina.toml",
    #[cfg(feature = "toml-config")]
    "config.toml",
    #[cfg(feature = "yaml-config")]
    "machina.yaml",
    #[cfg(feature = "yaml-config")]
    "machina.yml",
    #[cfg(feature = "yaml-config")]
    "config.yaml",
    #[cfg(feature = "yaml-config")]
    "config.yml",
];

/// Named configuration variant, selecting `machina.{profile}.*` overlays.
#[derive(Debug, Clone, Default)]
pub enum Profile {
    #[default]
    Development,
    Production,
    Custom(String),
}

impl Profile {
    /// The name as it appears in overlay file names.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Reads `MACHINA_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var("MACHINA_PROFILE")
            .map(|name| Self::named(&name))
            .unwrap_or_default()
    }

    fn named(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            "production" | "prod" => Self::Production,
            _ => Self::Custom(name.to_string()),
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loads the configuration from the default search locations.
pub fn load_config() -> ConfigResult<MachinaConfig> {
    ConfigLoader::new().with_current_dir().load()
}

/// Loads the configuration from one specific file.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<MachinaConfig> {
    ConfigLoader::new().file(path).load()
}

/// Multi-source configuration loader.
///
/// ```rust,ignore
/// let config = ConfigLoader::new()
///     .profile("production")
///     .search_path("/etc/machina")
///     .load()?;
/// ```
pub struct ConfigLoader {
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    explicit_file: Option<PathBuf>,
    read_env: bool,
}

impl ConfigLoader {
    /// Loader with the profile taken from `MACHINA_PROFILE` and no search
    /// paths yet.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            explicit_file: None,
            read_env: true,
        }
    }

    /// Selects the profile by name.
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::named(&profile.into());
        self
    }

    /// Appends a directory to search for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Appends the current working directory to the search paths.
    pub fn with_current_dir(self) -> Self {
        match std::env::current_dir() {
            Ok(cwd) => self.search_path(cwd),
            Err(_) => self,
        }
    }

    /// Appends the user's configuration directory (`~/.config/machina` on
    /// Linux) to the search paths.
    pub fn with_user_config_dir(self) -> Self {
        match dirs::config_dir() {
            Some(dir) => self.search_path(dir.join("machina")),
            None => self,
        }
    }

    /// Loads exactly this file instead of searching. The file must exist.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.explicit_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Reads `MACHINA_*` environment variables (the default).
    pub fn with_env(mut self) -> Self {
        self.read_env = true;
        self
    }

    /// Ignores environment variables.
    pub fn without_env(mut self) -> Self {
        self.read_env = false;
        self
    }

    /// Layers programmatic overrides above every other source, files and
    /// environment included. The override is a whole configuration; every
    /// field it carries takes effect, defaults included.
    pub fn merge(mut self, config: MachinaConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Resolves all sources into a configuration.
    pub fn load(self) -> ConfigResult<MachinaConfig> {
        let mut figment = Figment::from(Serialized::defaults(MachinaConfig::default()));

        figment = match &self.explicit_file {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "loading configuration file");
                Self::merge_file(figment, path)?
            }
            Some(path) => return Err(ConfigError::FileNotFound(path.clone())),
            None => self.merge_discovered(figment)?,
        };

        if self.read_env {
            figment = figment.merge(Env::prefixed("MACHINA_").split("__"));
        }
        figment = figment.merge(self.overrides.clone());

        let config: MachinaConfig = figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        debug!(
            profile = %self.profile,
            level = %config.logging.level,
            "configuration resolved"
        );
        Ok(config)
    }

    /// Merges every discovered file, profile overlays first. The first base
    /// file ends the search; later paths are shadowed, not merged.
    fn merge_discovered(&self, mut figment: Figment) -> ConfigResult<Figment> {
        let hits = self.discover();
        if hits.is_empty() {
            warn!("no configuration file found, running on defaults");
        }
        for path in hits {
            info!(path = %path.display(), "loading configuration file");
            figment = Self::merge_file(figment, &path)?;
        }
        Ok(figment)
    }

    fn discover(&self) -> Vec<PathBuf> {
        let mut hits = Vec::new();
        for dir in self.effective_search_paths() {
            for name in FILE_NAMES {
                let (stem, ext) = name
                    .rsplit_once('.')
                    .expect("configuration file names carry an extension");
                let overlay = dir.join(format!("{stem}.{}.{ext}", self.profile));
                if overlay.exists() {
                    hits.push(overlay);
                }
                let base = dir.join(name);
                if base.exists() {
                    hits.push(base);
                    return hits;
                }
            }
        }
        hits
    }

    fn effective_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("machina"));
        }
        paths
    }

    fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        match path.extension().and_then(OsStr::to_str) {
            #[cfg(feature = "toml-config")]
            Some("toml") => Ok(figment.merge(Toml::file(path))),
            #[cfg(feature = "yaml-config")]
            Some("yaml" | "yml") => Ok(figment.merge(Yaml::file(path))),
            other => Err(ConfigError::ParseError(format!(
                "unsupported or disabled configuration file extension: {:?}",
                other.unwrap_or("none")
            ))),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogLevel, LoggingConfig};

    #[test]
    fn defaults_resolve_without_any_sources() {
        let config = ConfigLoader::new()
            .without_env()
            .search_path("/nonexistent")
            .load()
            .unwrap();

        assert_eq!(config.bot.name, "machina");
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn programmatic_overrides_beat_defaults() {
        let config = ConfigLoader::new()
            .without_env()
            .search_path("/nonexistent")
            .merge(MachinaConfig {
                logging: LoggingConfig {
                    level: LogLevel::Debug,
                    ..Default::default()
                },
                ..Default::default()
            })
            .load()
            .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = ConfigLoader::new()
            .without_env()
            .file("/definitely/not/here/machina.toml")
            .load();

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn profile_names_normalize() {
        assert!(matches!(Profile::named("PROD"), Profile::Production));
        assert!(matches!(Profile::named("dev"), Profile::Development));
        assert!(matches!(Profile::named("staging"), Profile::Custom(_)));
        assert_eq!(Profile::Custom("staging".into()).to_string(), "staging");
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let result = ConfigLoader::merge_file(Figment::new(), Path::new("machina.ini"));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn environment_outranks_discovered_files() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "machina.toml",
                r#"
                    [logging]
                    level = "warn"
                "#,
            )?;
            jail.set_env("MACHINA_LOGGING__LEVEL", "error");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.logging.level, LogLevel::Error);
            Ok(())
        });
    }

    #[test]
    fn programmatic_merge_outranks_files_and_environment() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "machina.toml",
                r#"
                    [logging]
                    level = "warn"
                "#,
            )?;
            jail.set_env("MACHINA_LOGGING__LEVEL", "error");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .merge(MachinaConfig {
                    logging: LoggingConfig {
                        level: LogLevel::Debug,
                        ..Default::default()
                    },
                    ..Default::default()
                })
                .load()
                .map_err(|e| e.to_string())?;
            assert_eq!(config.logging.level, LogLevel::Debug);
            Ok(())
        });
    }
}
