//! The action registry: per-kind catalogs built at plugin load.
//!
//! Each [`ActionKind`] gets its own catalog so the router only ever scans
//! actions that could possibly fire for a given stage. Catalogs are plain
//! vectors: they hold tens of entries, registration order is meaningful
//! for help output, and lookups are linear scans over a handful of
//! entries per event.
//!
//! The schedule catalog is the one mutable-after-startup catalog. It sits
//! behind its own lock so scheduled work can be registered while the
//! engine is live, without reopening the fixed catalogs.

use parking_lot::RwLock;

use std::sync::Arc;

use machina_core::action::{ActionDecl, ActionKind, ActionMetadata};
use machina_core::error::{RegistrationError, RegistrationResult};
use machina_core::help::HelpIndex;
use machina_core::settings::Settings;

/// Catalogs of every registered action, grouped by kind.
#[derive(Debug)]
pub struct ActionRegistry {
    settings: Arc<Settings>,
    /// `(owner, summary)` in first-registration order; drives help grouping.
    owners: Vec<(String, String)>,
    process: Vec<ActionMetadata>,
    listen_to: Vec<ActionMetadata>,
    respond_to: Vec<ActionMetadata>,
    catch_all: Vec<ActionMetadata>,
    route: Vec<ActionMetadata>,
    schedule: RwLock<Vec<ActionMetadata>>,
}

impl ActionRegistry {
    /// Empty registry validating against `settings`.
    pub fn new(settings: Arc<Settings>) -> Self {
        Self {
            settings,
            owners: Vec::new(),
            process: Vec::new(),
            listen_to: Vec::new(),
            respond_to: Vec::new(),
            catch_all: Vec::new(),
            route: Vec::new(),
            schedule: RwLock::new(Vec::new()),
        }
    }

    /// Makes `owner` visible in help output even before (or without) any
    /// of its actions registering.
    pub fn note_owner(&mut self, owner: &str, summary: &str) {
        if !self.owners.iter().any(|(o, _)| o == owner) {
            self.owners.push((owner.to_string(), summary.to_string()));
        }
    }

    /// Registers one declared action under `owner`.
    ///
    /// Rejects the registration when the action's required configuration
    /// keys are absent, or when its pattern does not compile. Registering
    /// under an already-present key replaces the earlier entry in place,
    /// keeping its catalog position.
    pub fn register(
        &mut self,
        owner: &str,
        owner_summary: &str,
        decl: ActionDecl,
    ) -> RegistrationResult<()> {
        let meta = self.compile(owner, owner_summary, decl)?;
        self.note_owner(owner, owner_summary);
        tracing::debug!(kind = %meta.kind, key = %meta.key(), "registering action");
        match meta.kind {
            ActionKind::Process => Self::upsert(&mut self.process, meta),
            ActionKind::ListenTo => Self::upsert(&mut self.listen_to, meta),
            ActionKind::RespondTo => Self::upsert(&mut self.respond_to, meta),
            ActionKind::CatchAll => Self::upsert(&mut self.catch_all, meta),
            ActionKind::Route => Self::upsert(&mut self.route, meta),
            ActionKind::Schedule => Self::upsert(&mut self.schedule.write(), meta),
        }
        Ok(())
    }

    /// Registers a schedule action while the engine is live, returning the
    /// compiled metadata so the caller can book the job it describes.
    ///
    /// Only the schedule catalog accepts registrations after startup; the
    /// caller is expected to pass a schedule declaration.
    pub fn register_schedule(
        &self,
        owner: &str,
        owner_summary: &str,
        decl: ActionDecl,
    ) -> RegistrationResult<ActionMetadata> {
        debug_assert_eq!(decl.kind, ActionKind::Schedule);
        let meta = self.compile(owner, owner_summary, decl)?;
        tracing::debug!(key = %meta.key(), "registering schedule action");
        Self::upsert(&mut self.schedule.write(), meta.clone());
        Ok(meta)
    }

    fn compile(
        &self,
        owner: &str,
        owner_summary: &str,
        decl: ActionDecl,
    ) -> RegistrationResult<ActionMetadata> {
        let missing = self.settings.missing_keys(&decl.required_config);
        if !missing.is_empty() {
            return Err(RegistrationError::MissingConfiguration {
                plugin: owner.to_string(),
                keys: missing.into_iter().map(String::from).collect(),
            });
        }
        decl.compile(owner, owner_summary)
    }

    fn upsert(catalog: &mut Vec<ActionMetadata>, meta: ActionMetadata) {
        let key = meta.key();
        match catalog.iter_mut().find(|existing| existing.key() == key) {
            Some(slot) => {
                tracing::debug!(key = %key, "action re-registered, replacing earlier entry");
                *slot = meta;
            }
            None => catalog.push(meta),
        }
    }

    // ─── catalog access ───────────────────────────────────────────────────────

    /// Actions keyed on an exact event type.
    pub fn process_actions(&self) -> &[ActionMetadata] {
        &self.process
    }

    /// Actions fired on undirected messages.
    pub fn listen_actions(&self) -> &[ActionMetadata] {
        &self.listen_to
    }

    /// Actions fired on directed messages.
    pub fn respond_actions(&self) -> &[ActionMetadata] {
        &self.respond_to
    }

    /// Actions fired on every event.
    pub fn catch_all_actions(&self) -> &[ActionMetadata] {
        &self.catch_all
    }

    /// Catalogued HTTP actions; never dispatched by the router.
    pub fn route_actions(&self) -> &[ActionMetadata] {
        &self.route
    }

    /// Snapshot of the schedule catalog.
    pub fn schedule_actions(&self) -> Vec<ActionMetadata> {
        self.schedule.read().clone()
    }

    /// Total registered actions across all catalogs.
    pub fn total_actions(&self) -> usize {
        self.process.len()
            + self.listen_to.len()
            + self.respond_to.len()
            + self.catch_all.len()
            + self.route.len()
            + self.schedule.read().len()
    }

    // ─── help ─────────────────────────────────────────────────────────────────

    /// Assembles the help index from the catalogs.
    ///
    /// Owners appear in load order, each seeded with an empty section so
    /// plugins without help entries are still listed. The robot view is
    /// fed from the two message catalogs only: those are the actions a
    /// user can actually trigger by talking. Route entries belong to an
    /// external surface and are never listed.
    pub fn help_index(&self, bot_name: &str) -> HelpIndex {
        let mut index = HelpIndex::new();
        for (_, summary) in &self.owners {
            index.seed_owner(summary);
        }

        for meta in &self.respond_to {
            Self::add_human_entry(&mut index, meta);
            index.add_robot(&meta.owner_summary, format!("@{bot_name} {}", Self::usage(meta)));
        }
        for meta in &self.listen_to {
            Self::add_human_entry(&mut index, meta);
            index.add_robot(&meta.owner_summary, Self::usage(meta));
        }
        for meta in self.process.iter().chain(&self.catch_all) {
            Self::add_human_entry(&mut index, meta);
        }
        for meta in self.schedule.read().iter() {
            Self::add_human_entry(&mut index, meta);
        }
        index
    }

    fn add_human_entry(index: &mut HelpIndex, meta: &ActionMetadata) {
        if let Some(help) = &meta.help {
            index.add_human(&meta.owner_summary, &help.command, &help.summary);
        }
    }

    /// What a user types to trigger `meta`: the declared command syntax,
    /// falling back to the raw pattern.
    fn usage(meta: &ActionMetadata) -> String {
        match (&meta.help, &meta.pattern) {
            (Some(help), _) => help.command.clone(),
            (None, Some(pattern)) => pattern.as_str().to_string(),
            (None, None) => meta.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use machina_core::handler::{HandlerFn, handler_fn};
    use machina_core::schedule::Trigger;

    fn noop() -> HandlerFn {
        handler_fn(|_ctx| async {})
    }

    fn registry() -> ActionRegistry {
        ActionRegistry::new(Arc::new(Settings::new()))
    }

    #[test]
    fn replacement_keeps_catalog_position() {
        let mut registry = registry();
        registry
            .register("general", "General", ActionDecl::listen_to("ping", r"^ping$", noop()))
            .unwrap();
        registry
            .register("general", "General", ActionDecl::listen_to("pong", r"^pong$", noop()))
            .unwrap();
        registry
            .register(
                "general",
                "General",
                ActionDecl::listen_to("ping", r"^ping$", noop()).with_help("ping", "updated"),
            )
            .unwrap();

        let names: Vec<&str> = registry.listen_actions().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["ping", "pong"]);
        assert!(registry.listen_actions()[0].help.is_some());
    }

    #[test]
    fn same_name_different_pattern_is_a_distinct_key() {
        let mut registry = registry();
        registry
            .register("general", "General", ActionDecl::listen_to("greet", r"^hi$", noop()))
            .unwrap();
        registry
            .register("general", "General", ActionDecl::listen_to("greet", r"^hello$", noop()))
            .unwrap();
        assert_eq!(registry.listen_actions().len(), 2);
    }

    #[test]
    fn missing_configuration_rejects_the_action() {
        let mut registry = registry();
        let err = registry
            .register(
                "weather",
                "Weather",
                ActionDecl::respond_to("forecast", r"^forecast$", noop())
                    .requires_config(["weather.api_key"]),
            )
            .unwrap_err();
        match err {
            RegistrationError::MissingConfiguration { plugin, keys } => {
                assert_eq!(plugin, "weather");
                assert_eq!(keys, vec!["weather.api_key"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(registry.total_actions(), 0);
    }

    #[test]
    fn bad_pattern_fails_only_that_registration() {
        let mut registry = registry();
        assert!(
            registry
                .register("general", "General", ActionDecl::listen_to("bad", "(oops", noop()))
                .is_err()
        );
        registry
            .register("general", "General", ActionDecl::listen_to("good", r"^ok$", noop()))
            .unwrap();
        assert_eq!(registry.total_actions(), 1);
    }

    #[test]
    fn schedule_catalog_accepts_live_registration() {
        let mut registry = registry();
        registry
            .register(
                "reporter",
                "Reports",
                ActionDecl::schedule("daily", Trigger::cron("0 9 * * *"), noop()),
            )
            .unwrap();

        // Ad-hoc registration goes through a shared reference and hands
        // back the compiled entry.
        let shared = &registry;
        let meta = shared
            .register_schedule(
                "reporter",
                "Reports",
                ActionDecl::schedule("reminder", Trigger::cron("*/10 * * * *"), noop()),
            )
            .unwrap();
        assert_eq!(meta.key(), "reporter.reminder");

        let ids: Vec<String> = registry.schedule_actions().iter().map(|m| m.key()).collect();
        assert_eq!(ids, vec!["reporter.daily", "reporter.reminder"]);
    }

    #[test]
    fn help_index_groups_by_owner_in_load_order() {
        let mut registry = registry();
        registry.note_owner("quiet", "Quiet plugin");
        registry
            .register(
                "general",
                "General commands",
                ActionDecl::respond_to("greet", r"^hello$", noop()).with_help("hello", "Say hello"),
            )
            .unwrap();
        registry
            .register(
                "general",
                "General commands",
                ActionDecl::listen_to("ping", r"^ping$", noop()).with_help("ping", "Serve the ball"),
            )
            .unwrap();

        let index = registry.help_index("machina");

        let owners: Vec<&str> = index.human.keys().collect();
        assert_eq!(owners, vec!["Quiet plugin", "General commands"]);
        assert!(index.human.get("Quiet plugin").is_some_and(|m| m.is_empty()));

        let general = index.human.get("General commands").unwrap();
        assert_eq!(general.get("hello").map(String::as_str), Some("Say hello"));
        assert_eq!(general.get("ping").map(String::as_str), Some("Serve the ball"));

        let robot = index.robot.get("General commands").unwrap();
        assert_eq!(robot, &vec!["@machina hello".to_string(), "ping".to_string()]);
    }

    #[test]
    fn route_actions_stay_out_of_the_help_index() {
        let mut registry = registry();
        registry
            .register(
                "webhooks",
                "Webhooks",
                ActionDecl::route("deploy", noop()).with_help("POST /deploy", "Trigger a deploy"),
            )
            .unwrap();

        let index = registry.help_index("machina");
        assert!(index.human.get("Webhooks").is_some_and(|m| m.is_empty()));
        assert!(index.robot.get("Webhooks").is_none());
    }

    #[test]
    fn robot_usage_falls_back_to_the_pattern() {
        let mut registry = registry();
        registry
            .register("general", "General", ActionDecl::respond_to("deploy", r"^deploy (?P<svc>\w+)$", noop()))
            .unwrap();
        let index = registry.help_index("machina");
        let robot = index.robot.get("General").unwrap();
        assert_eq!(robot, &vec![r"@machina ^deploy (?P<svc>\w+)$".to_string()]);
    }
}
