//! The plugin contract and resilient loading.
//!
//! A plugin is a value that describes itself ([`PluginInfo`]), declares
//! its actions, and optionally runs an init hook once registration is
//! done. Loading is all-or-nothing per plugin where configuration is
//! concerned: if any declared key is absent, none of the plugin's actions
//! register. A pattern that fails to compile, by contrast, skips only
//! that one action.
//!
//! Loading never aborts the process. Every skip and failure lands in the
//! [`LoadReport`] and in the log, and the loader moves on to the next
//! plugin.

use async_trait::async_trait;

use std::fmt;
use std::sync::Arc;

use machina_core::action::ActionDecl;
use machina_core::error::HandlerError;
use machina_core::settings::Settings;

use crate::registry::ActionRegistry;

pub mod builtin;

/// How a plugin introduces itself to the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    /// Registry-wide unique name; the owner part of every action key.
    pub name: String,
    /// Display line used to group the plugin's help entries.
    pub summary: String,
    /// Configuration keys the plugin as a whole needs.
    pub required_config: Vec<String>,
}

impl PluginInfo {
    /// Info with the summary defaulting to the plugin name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            summary: name.clone(),
            name,
            required_config: Vec::new(),
        }
    }

    /// Sets the display line for help grouping.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Declares configuration keys the whole plugin needs.
    pub fn requires_config<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_config = keys.into_iter().map(Into::into).collect();
        self
    }
}

/// One unit of bot functionality.
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
    /// Identity and plugin-level configuration requirements.
    fn info(&self) -> PluginInfo;

    /// The actions this plugin contributes. Called once at load; the
    /// `Arc` receiver lets declarations bind plugin methods as handlers.
    fn actions(self: Arc<Self>) -> Vec<ActionDecl>;

    /// Hook run after the plugin's actions registered. Failures are
    /// logged and reported; registered actions stay live.
    async fn init(&self) -> Result<(), HandlerError> {
        Ok(())
    }
}

// ─── load report ──────────────────────────────────────────────────────────────

/// One successfully loaded plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPlugin {
    /// Plugin name.
    pub name: String,
    /// How many of its actions registered.
    pub actions: usize,
}

/// One plugin skipped over absent configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPlugin {
    /// Plugin name.
    pub name: String,
    /// The keys that were absent.
    pub missing: Vec<String>,
}

/// What happened across one loading pass.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Plugins whose actions registered.
    pub loaded: Vec<LoadedPlugin>,
    /// Plugins skipped in their entirety.
    pub skipped: Vec<SkippedPlugin>,
    /// Keys of single actions that failed to register.
    pub failed_actions: Vec<String>,
    /// Plugins whose init hook returned an error.
    pub failed_inits: Vec<String>,
}

impl LoadReport {
    /// Whether every plugin loaded completely.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed_actions.is_empty() && self.failed_inits.is_empty()
    }

    /// Total actions registered across all loaded plugins.
    pub fn total_actions(&self) -> usize {
        self.loaded.iter().map(|p| p.actions).sum()
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} plugins loaded ({} actions)",
            self.loaded.len(),
            self.total_actions()
        )?;
        if !self.skipped.is_empty() {
            write!(f, ", {} skipped", self.skipped.len())?;
        }
        if !self.failed_actions.is_empty() {
            write!(f, ", {} actions failed to register", self.failed_actions.len())?;
        }
        if !self.failed_inits.is_empty() {
            write!(f, ", {} init hooks failed", self.failed_inits.len())?;
        }
        Ok(())
    }
}

// ─── loader ───────────────────────────────────────────────────────────────────

/// Loads plugins into a fresh [`ActionRegistry`].
pub struct PluginLoader {
    settings: Arc<Settings>,
    registry: ActionRegistry,
    report: LoadReport,
}

impl PluginLoader {
    /// Loader validating against `settings`.
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            registry: ActionRegistry::new(Arc::clone(&settings)),
            settings,
            report: LoadReport::default(),
        }
    }

    /// Loads one plugin, recording the outcome in the report.
    pub async fn load(&mut self, plugin: Arc<dyn Plugin>) {
        let info = plugin.info();
        let decls = Arc::clone(&plugin).actions();

        // The configuration check spans the plugin and all of its actions
        // up front: a half-registered plugin is worse than an absent one.
        let mut required: Vec<String> = Vec::new();
        let declared = info
            .required_config
            .iter()
            .chain(decls.iter().flat_map(|decl| decl.required_config.iter()));
        for key in declared {
            if !required.contains(key) {
                required.push(key.clone());
            }
        }
        let missing = self.settings.missing_keys(&required);
        if !missing.is_empty() {
            tracing::warn!(
                plugin = %info.name,
                missing = ?missing,
                "skipping plugin, required configuration is absent"
            );
            self.report.skipped.push(SkippedPlugin {
                name: info.name,
                missing: missing.into_iter().map(String::from).collect(),
            });
            return;
        }

        self.registry.note_owner(&info.name, &info.summary);
        let mut registered = 0usize;
        for decl in decls {
            let label = format!("{}.{}", info.name, decl.name);
            match self.registry.register(&info.name, &info.summary, decl) {
                Ok(()) => registered += 1,
                Err(error) => {
                    tracing::error!(plugin = %info.name, error = %error, "action registration failed");
                    self.report.failed_actions.push(label);
                }
            }
        }

        if let Err(error) = plugin.init().await {
            tracing::error!(plugin = %info.name, error = %error, "plugin init hook failed");
            self.report.failed_inits.push(info.name.clone());
        }

        tracing::info!(plugin = %info.name, actions = registered, "plugin loaded");
        self.report.loaded.push(LoadedPlugin {
            name: info.name,
            actions: registered,
        });
    }

    /// Finishes loading, yielding the populated registry and the report.
    pub fn finish(self) -> (ActionRegistry, LoadReport) {
        (self.registry, self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use machina_core::handler::handler_fn;

    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Weather;

    impl Plugin for Weather {
        fn info(&self) -> PluginInfo {
            PluginInfo::new("weather")
                .with_summary("Weather lookups")
                .requires_config(["weather.api_key"])
        }

        fn actions(self: Arc<Self>) -> Vec<ActionDecl> {
            vec![
                ActionDecl::respond_to("forecast", r"^forecast$", handler_fn(|_ctx| async {})),
                ActionDecl::listen_to("rain", "rain", handler_fn(|_ctx| async {})),
            ]
        }
    }

    struct MixedPatterns;

    impl Plugin for MixedPatterns {
        fn info(&self) -> PluginInfo {
            PluginInfo::new("mixed")
        }

        fn actions(self: Arc<Self>) -> Vec<ActionDecl> {
            vec![
                ActionDecl::listen_to("good", r"^ok$", handler_fn(|_ctx| async {})),
                ActionDecl::listen_to("bad", "(unclosed", handler_fn(|_ctx| async {})),
            ]
        }
    }

    struct Quiet;

    impl Plugin for Quiet {
        fn info(&self) -> PluginInfo {
            PluginInfo::new("quiet").with_summary("Quiet plugin")
        }

        fn actions(self: Arc<Self>) -> Vec<ActionDecl> {
            Vec::new()
        }
    }

    struct FlakyInit {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Plugin for FlakyInit {
        fn info(&self) -> PluginInfo {
            PluginInfo::new("flaky")
        }

        fn actions(self: Arc<Self>) -> Vec<ActionDecl> {
            vec![ActionDecl::catch_all("observe", handler_fn(|_ctx| async {}))]
        }

        async fn init(&self) -> Result<(), HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err("no backend".into())
        }
    }

    #[tokio::test]
    async fn absent_configuration_skips_the_whole_plugin() {
        let mut loader = PluginLoader::new(Arc::new(Settings::new()));
        loader.load(Arc::new(Weather)).await;
        let (registry, report) = loader.finish();

        assert_eq!(registry.total_actions(), 0);
        assert!(registry.help_index("machina").human.is_empty());
        assert_eq!(
            report.skipped,
            vec![SkippedPlugin {
                name: "weather".into(),
                missing: vec!["weather.api_key".into()],
            }]
        );
    }

    #[tokio::test]
    async fn a_skipped_plugin_leaves_its_neighbors_alone() {
        let mut loader = PluginLoader::new(Arc::new(Settings::new()));
        loader.load(Arc::new(Weather)).await;
        loader.load(Arc::new(MixedPatterns)).await;
        let (registry, report) = loader.finish();

        // Weather contributed nothing; the mixed plugin's good action is live.
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(registry.total_actions(), 1);
        assert_eq!(registry.listen_actions()[0].owner, "mixed");
    }

    #[tokio::test]
    async fn configured_plugin_registers_every_action() {
        let mut settings = Settings::new();
        settings.set("weather.api_key", "k-123");

        let mut loader = PluginLoader::new(Arc::new(settings));
        loader.load(Arc::new(Weather)).await;
        let (registry, report) = loader.finish();

        assert_eq!(registry.total_actions(), 2);
        assert_eq!(report.loaded, vec![LoadedPlugin { name: "weather".into(), actions: 2 }]);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn a_bad_pattern_fails_only_that_action() {
        let mut loader = PluginLoader::new(Arc::new(Settings::new()));
        loader.load(Arc::new(MixedPatterns)).await;
        let (registry, report) = loader.finish();

        assert_eq!(registry.total_actions(), 1);
        assert_eq!(registry.listen_actions()[0].name, "good");
        assert_eq!(report.failed_actions, vec!["mixed.bad"]);
        assert_eq!(report.loaded, vec![LoadedPlugin { name: "mixed".into(), actions: 1 }]);
    }

    #[tokio::test]
    async fn actionless_plugins_still_appear_in_help() {
        let mut loader = PluginLoader::new(Arc::new(Settings::new()));
        loader.load(Arc::new(Quiet)).await;
        let (registry, _) = loader.finish();

        let index = registry.help_index("machina");
        assert!(index.human.contains_key("Quiet plugin"));
        assert!(index.robot.contains_key("Quiet plugin"));
    }

    #[tokio::test]
    async fn init_failures_keep_registered_actions_live() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut loader = PluginLoader::new(Arc::new(Settings::new()));
        loader.load(Arc::new(FlakyInit { calls: Arc::clone(&calls) })).await;
        let (registry, report) = loader.finish();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.catch_all_actions().len(), 1);
        assert_eq!(report.failed_inits, vec!["flaky"]);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn the_report_reads_like_a_summary_line() {
        let mut settings = Settings::new();
        settings.set("weather.api_key", "k-123");
        let mut loader = PluginLoader::new(Arc::new(settings));
        loader.load(Arc::new(Weather)).await;
        loader.load(Arc::new(MixedPatterns)).await;
        let (_, report) = loader.finish();

        assert_eq!(
            report.to_string(),
            "2 plugins loaded (3 actions), 1 actions failed to register"
        );
    }
}
