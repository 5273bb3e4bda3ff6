//! Logging setup, built on `tracing` and `tracing-subscriber`.
//!
//! The runtime installs its subscriber through [`init_from_config`] during
//! `RuntimeBuilder::build`. Binaries that want logging before a config
//! exists, or want settings the schema does not expose, use
//! [`LoggingBuilder`] directly:
//!
//! ```rust,ignore
//! LoggingBuilder::new()
//!     .level(tracing::Level::DEBUG)
//!     .directive("machina_engine=trace")
//!     .span_events(SpanEvents::LIFECYCLE)
//!     .init();
//! ```
//!
//! A `RUST_LOG` environment variable overrides the configured base level,
//! and whichever subscriber is installed first wins; later installs are
//! no-ops.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig, SpanEventConfig};

type BoxedFmtLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Which span lifecycle moments get their own log line.
///
/// Dispatch wraps each event in a span, so these knobs decide how visible
/// the routing and fan-out of an event are in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanEvents {
    /// Span created.
    pub new: bool,
    /// Span entered.
    pub enter: bool,
    /// Span exited.
    pub exit: bool,
    /// Span closed.
    pub close: bool,
}

impl SpanEvents {
    /// No lifecycle lines.
    pub const NONE: Self = Self {
        new: false,
        enter: false,
        exit: false,
        close: false,
    };

    /// Creation and close only: one line when a dispatch begins, one when
    /// its last handler finishes.
    pub const LIFECYCLE: Self = Self {
        new: true,
        enter: false,
        exit: false,
        close: true,
    };

    /// Enter and exit only.
    pub const ACTIVE: Self = Self {
        new: false,
        enter: true,
        exit: true,
        close: false,
    };

    /// Every lifecycle moment.
    pub const FULL: Self = Self {
        new: true,
        enter: true,
        exit: true,
        close: true,
    };

    fn as_fmt_span(self) -> FmtSpan {
        let flags = [
            (self.new, FmtSpan::NEW),
            (self.enter, FmtSpan::ENTER),
            (self.exit, FmtSpan::EXIT),
            (self.close, FmtSpan::CLOSE),
        ];
        flags
            .into_iter()
            .filter(|(enabled, _)| *enabled)
            .fold(FmtSpan::NONE, |acc, (_, flag)| acc | flag)
    }
}

impl From<&SpanEventConfig> for SpanEvents {
    fn from(config: &SpanEventConfig) -> Self {
        Self {
            new: config.new,
            enter: config.enter,
            exit: config.exit,
            close: config.close,
        }
    }
}

/// Installs the subscriber described by `config`.
///
/// Safe to call when a subscriber is already installed; the earlier one
/// stays in place.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// Programmatic subscriber construction.
///
/// Mirrors what the `logging` section of the configuration can express,
/// plus raw filter directives for anything finer-grained.
#[derive(Debug, Default)]
pub struct LoggingBuilder {
    level: Option<tracing::Level>,
    directives: Vec<String>,
    span_events: SpanEvents,
    format: LogFormat,
    output: LogOutput,
    file_path: Option<PathBuf>,
    thread_ids: bool,
    locations: bool,
}

impl LoggingBuilder {
    /// Builder with compact stdout output at the info level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder mirroring a loaded `logging` configuration section.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::new();
        builder.level = Some(config.level.to_tracing_level());
        builder.format = config.format;
        builder.output = config.output;
        builder.span_events = SpanEvents::from(&config.span_events);
        builder.thread_ids = config.thread_ids;
        builder.locations = config.file_location;
        builder.file_path.clone_from(&config.file_path);
        builder
            .directives
            .extend(config.filters.iter().map(|(module, level)| format!("{module}={level}")));
        builder
    }

    /// Sets the base log level. `RUST_LOG` still takes precedence.
    pub fn level(mut self, level: tracing::Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Adds a raw filter directive, e.g. `"machina_engine=trace"`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Selects which span lifecycle moments are logged.
    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    /// Sets the line format.
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the output destination.
    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Sets the log file path, used when output is `File`.
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Includes thread ids in every line.
    pub fn thread_ids(mut self, enabled: bool) -> Self {
        self.thread_ids = enabled;
        self
    }

    /// Includes source file and line number in every line.
    pub fn locations(mut self, enabled: bool) -> Self {
        self.locations = enabled;
        self
    }

    /// Installs the subscriber, ignoring an already-installed one.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber, reporting if one is already installed.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.filter();
        let (layer, fallback) = self.layer();
        let result = tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init();
        // Fallback notes are emitted after install so they reach the log.
        if let Some(message) = fallback {
            warn!("{message}");
        }
        result
    }

    fn filter(&self) -> EnvFilter {
        let base = self
            .level
            .unwrap_or(tracing::Level::INFO)
            .to_string()
            .to_lowercase();
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base));
        for directive in &self.directives {
            match directive.parse() {
                Ok(parsed) => filter = filter.add_directive(parsed),
                Err(error) => warn!(directive = %directive, error = %error, "ignoring bad log filter directive"),
            }
        }
        filter
    }

    fn layer(&self) -> (BoxedFmtLayer, Option<&'static str>) {
        match &self.output {
            LogOutput::Stdout => self.format_layer(std::io::stdout),
            LogOutput::Stderr => self.format_layer(std::io::stderr),
            LogOutput::File => match &self.file_path {
                Some(path) => {
                    let appender = tracing_appender::rolling::never(
                        path.parent().unwrap_or_else(|| Path::new(".")),
                        path.file_name().unwrap_or_else(|| OsStr::new("machina.log")),
                    );
                    self.format_layer(appender)
                }
                // Config validation rejects this combination up front; a
                // hand-built builder falls back to stdout instead.
                None => {
                    let (layer, _) = self.format_layer(std::io::stdout);
                    (layer, Some("file log output configured without a path, writing to stdout"))
                }
            },
        }
    }

    fn format_layer<W>(&self, writer: W) -> (BoxedFmtLayer, Option<&'static str>)
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let base = fmt::layer()
            .with_writer(writer)
            .with_span_events(self.span_events.as_fmt_span())
            .with_thread_ids(self.thread_ids)
            .with_file(self.locations)
            .with_line_number(self.locations);
        match self.format {
            LogFormat::Compact => (base.compact().boxed(), None),
            LogFormat::Full => (base.boxed(), None),
            LogFormat::Pretty => (base.pretty().boxed(), None),
            #[cfg(feature = "json-log")]
            LogFormat::Json => (base.json().boxed(), None),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => (
                base.compact().boxed(),
                Some("json log format requested without the json-log feature, using compact"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn from_config_carries_filters_as_directives() {
        let mut config = LoggingConfig::default();
        config.level = LogLevel::Warn;
        config.filters.insert("machina_engine".to_string(), LogLevel::Trace);

        let builder = LoggingBuilder::from_config(&config);
        assert_eq!(builder.level, Some(tracing::Level::WARN));
        assert_eq!(builder.directives, vec!["machina_engine=trace"]);
    }

    #[test]
    fn file_output_without_a_path_falls_back_to_stdout() {
        let builder = LoggingBuilder::new().output(LogOutput::File);
        let (_, fallback) = builder.layer();
        assert!(fallback.is_some());
    }

    #[test]
    fn span_event_presets_cover_their_moments() {
        assert!(SpanEvents::LIFECYCLE.new && SpanEvents::LIFECYCLE.close);
        assert!(!SpanEvents::LIFECYCLE.enter && !SpanEvents::LIFECYCLE.exit);
        assert!(SpanEvents::ACTIVE.enter && SpanEvents::ACTIVE.exit);
    }
}
