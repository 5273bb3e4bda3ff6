//! Runtime orchestration: plugin loading, the event pump, and shutdown.
//!
//! The runtime wires the engine's pieces together. Building it loads the
//! configuration, initializes logging, registers builtin and user plugins,
//! seeds the help index, and hands schedule actions to the cron driver.
//! Running it pumps inbound events through the router and fans the planned
//! invocations out as tasks.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use machina_runtime::MachinaRuntime;
//!
//! let runtime = MachinaRuntime::builder()
//!     .config_file("machina.toml")
//!     .plugin(Arc::new(MyPlugin::default()))
//!     .build()
//!     .await?;
//!
//! // Feed events from your chat backend through this handle.
//! let events = runtime.sender();
//!
//! // Run until Ctrl+C
//! runtime.run().await?;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, debug_span, info, warn};

use crate::config::{ConfigLoader, MachinaConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;
use crate::responder::TracingResponder;
use crate::scheduler::CronScheduler;
use machina_core::{
    ActionDecl, BoxedResponder, Event, HelpStore, MemoryHelpStore, ScheduledJob, Scheduler,
};
use machina_engine::plugin::builtin::{Hello, Help, PingPong};
use machina_engine::{
    ActionRegistry, BotIdentity, Fanout, LoadReport, MentionGrammar, Plugin, PluginLoader, Router,
    ScheduleAdapter,
};

/// Inbound side of the event queue. Clone freely; the chat backend feeds
/// deserialized events in through this handle.
pub type EventSender = mpsc::Sender<Event>;

/// The assembled bot: registry, router, fan-out, and scheduler behind one
/// event queue.
///
/// A runtime runs once. `start` consumes the inbound queue's receiving
/// half, so after `stop` a new runtime must be built.
pub struct MachinaRuntime {
    config: MachinaConfig,
    registry: Arc<ActionRegistry>,
    report: LoadReport,
    router: Arc<Router>,
    fanout: Arc<Fanout>,
    scheduler: Arc<CronScheduler>,
    events_tx: mpsc::Sender<Event>,
    events_rx: Mutex<Option<mpsc::Receiver<Event>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    running: AtomicBool,
}

impl MachinaRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &MachinaConfig {
        &self.config
    }

    /// Returns the action registry.
    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    /// Returns the plugin load report.
    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    /// Returns a handle for feeding events into the runtime.
    pub fn sender(&self) -> EventSender {
        self.events_tx.clone()
    }

    /// Returns whether the runtime is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Registers a schedule action after startup and books it with the
    /// cron driver in one step.
    ///
    /// The schedule catalog is the only one open once the runtime is
    /// built; `decl` must be a schedule declaration. Re-using an existing
    /// `owner.name` replaces both the catalog entry and the booked job.
    pub async fn schedule(
        &self,
        owner: &str,
        owner_summary: &str,
        decl: ActionDecl,
    ) -> RuntimeResult<()> {
        let meta = self.registry.register_schedule(owner, owner_summary, decl)?;
        if let Some(job) = ScheduledJob::from_action(&meta) {
            self.scheduler.add_job(job).await?;
        }
        Ok(())
    }

    /// Starts the scheduler loop and the event pump.
    pub async fn start(&self) -> RuntimeResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Runtime is already running");
            return Ok(());
        }

        info!("Starting Machina runtime");

        let Some(events) = self.events_rx.lock().take() else {
            warn!("Event queue already consumed, runtime cannot be restarted");
            return Ok(());
        };

        let scheduler_task = self.scheduler.spawn();

        let router = Arc::clone(&self.router);
        let fanout = Arc::clone(&self.fanout);
        let pump_task = tokio::spawn(async move {
            Self::pump(router, fanout, events).await;
        });

        self.tasks.lock().extend([scheduler_task, pump_task]);

        info!("Runtime started");
        Ok(())
    }

    /// Stops the scheduler and the event pump.
    ///
    /// Handler batches already in flight are detached tasks and finish on
    /// their own.
    pub async fn stop(&self) -> RuntimeResult<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Runtime is not running");
            return Ok(());
        }

        info!("Stopping Machina runtime");

        self.scheduler.shutdown();

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task.abort();
            let _ = task.await;
        }

        info!("Runtime stopped");
        Ok(())
    }

    /// Runs the runtime until a shutdown signal is received.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.start().await?;

        info!("Machina runtime is now running. Press Ctrl+C to stop.");

        self.wait_for_shutdown().await;

        self.stop().await
    }

    /// Runs the runtime with a custom shutdown future.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: std::future::Future<Output = ()>,
    {
        self.start().await?;

        shutdown.await;

        self.stop().await
    }

    /// Drains the event queue, planning and fanning out each event.
    async fn pump(router: Arc<Router>, fanout: Arc<Fanout>, mut events: mpsc::Receiver<Event>) {
        debug!("event pump started");

        while let Some(event) = events.recv().await {
            if event.event_type == "pong" {
                debug!("server pong received");
            }

            let span = debug_span!("dispatch", event_type = %event.event_type);
            let plan = match span.in_scope(|| router.plan(&event)) {
                Ok(plan) => plan,
                Err(e) => {
                    warn!(error = %e, "dropping event");
                    continue;
                }
            };
            if plan.is_empty() {
                continue;
            }

            // Each event's batch runs as its own task so a slow handler
            // never backs up the queue.
            let fanout = Arc::clone(&fanout);
            tokio::spawn(
                async move {
                    fanout.run_all(plan).await;
                }
                .instrument(span),
            );
        }

        debug!("event channel closed, pump stopped");
    }

    /// Waits for shutdown signals (Ctrl+C or SIGTERM).
    async fn wait_for_shutdown(&self) {
        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("Failed to register SIGTERM handler");

            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C, shutting down");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
            info!("Received Ctrl+C, shutting down");
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for assembling a [`MachinaRuntime`].
///
/// # Example
///
/// ```rust,ignore
/// let runtime = MachinaRuntime::builder()
///     .profile("production")
///     .responder(Arc::new(MySlackResponder::new(client)))
///     .plugin(Arc::new(Standup::default()))
///     .build()
///     .await?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    responder: Option<BoxedResponder>,
    help_store: Option<Arc<dyn HelpStore>>,
    plugins: Vec<Arc<dyn Plugin>>,
    with_builtins: bool,
    event_buffer: usize,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
            responder: None,
            help_store: None,
            plugins: Vec::new(),
            with_builtins: true,
            event_buffer: 256,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: MachinaConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Sets the responder plugins send outgoing messages through.
    ///
    /// Defaults to [`TracingResponder`], which logs instead of delivering.
    pub fn responder(mut self, responder: BoxedResponder) -> Self {
        self.responder = Some(responder);
        self
    }

    /// Sets the store the help index is persisted to.
    ///
    /// Defaults to an in-memory store.
    pub fn help_store(mut self, store: Arc<dyn HelpStore>) -> Self {
        self.help_store = Some(store);
        self
    }

    /// Registers a plugin. Plugins load in registration order, after the
    /// builtins.
    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Registers multiple plugins at once.
    pub fn plugins<I>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Plugin>>,
    {
        self.plugins.extend(plugins);
        self
    }

    /// Skips loading the builtin plugins (ping-pong, hello, help).
    pub fn without_builtins(mut self) -> Self {
        self.with_builtins = false;
        self
    }

    /// Sets the inbound event queue capacity (default 256).
    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity.max(1);
        self
    }

    /// Loads configuration and assembles the runtime.
    pub async fn build(self) -> RuntimeResult<MachinaRuntime> {
        let config = self.config_loader.load()?;
        validate_config(&config)?;

        // try_init inside won't panic if a subscriber is already installed
        logging::init_from_config(&config.logging);

        let responder: BoxedResponder = self
            .responder
            .unwrap_or_else(|| Arc::new(TracingResponder::new()));
        let help_store: Arc<dyn HelpStore> = self
            .help_store
            .unwrap_or_else(|| Arc::new(MemoryHelpStore::new()));

        let settings = Arc::new(config.plugin_settings());
        let mut loader = PluginLoader::new(settings);

        if self.with_builtins {
            loader
                .load(Arc::new(PingPong::new(Arc::clone(&responder))))
                .await;
            loader
                .load(Arc::new(Hello::new(Arc::clone(&responder))))
                .await;
            loader
                .load(Arc::new(Help::new(
                    Arc::clone(&responder),
                    Arc::clone(&help_store),
                )))
                .await;
        }
        for plugin in self.plugins {
            loader.load(plugin).await;
        }

        let (registry, report) = loader.finish();
        let registry = Arc::new(registry);
        info!(report = %report, "plugins loaded");

        let identity = BotIdentity::new(&config.bot.user_id, &config.bot.name)
            .with_aliases(config.bot.aliases.iter().cloned());
        let grammar = MentionGrammar::new(identity)?;
        let router = Arc::new(Router::new(Arc::clone(&registry), grammar));

        let fanout = Arc::new(Fanout::new());
        let adapter = Arc::new(ScheduleAdapter::new(Arc::clone(&fanout)));
        let scheduler = Arc::new(CronScheduler::new(adapter));

        // Seed the help index before anything can ask for it.
        let index = registry.help_index(&config.bot.name);
        help_store.store(&index).await?;

        // Hand schedule actions to the cron driver.
        for job in ScheduleAdapter::collect_jobs(&registry) {
            scheduler.add_job(job).await?;
        }

        let (events_tx, events_rx) = mpsc::channel(self.event_buffer);

        info!(
            bot = %config.bot.name,
            actions = registry.total_actions(),
            "Runtime initialized from configuration"
        );

        Ok(MachinaRuntime {
            config,
            registry,
            report,
            router,
            fanout,
            scheduler,
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            tasks: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
        })
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
