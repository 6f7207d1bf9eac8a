use tracing::level_filters::LevelFilter;
use tracing_log::{AsLog, LogTracer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

use crate::{journald_or_stderr_layer, level_from_env, stderr_layer};

type BoxedLayer =
    Box<dyn tracing_subscriber::Layer<tracing_subscriber::Registry> + Send + Sync + 'static>;

/// Builder to compose the logging layers of a process.
///
/// Holds a global log level which is applied to every layer. `init` can only succeed once per
/// process.
///
/// # Examples
///
/// ```
/// # use dashboard_log::{Logger, LevelFilter};
/// # fn func() -> Result<(), anyhow::Error> {
/// // a service running under systemd
/// Logger::from_env("DASHBOARD_LOG", LevelFilter::INFO)
///     .journald()
///     .init()?;
/// # Ok(())
/// # }
/// # func().expect("failed to init logger");
/// ```
pub struct Logger {
    global_log_level: LevelFilter,
    layer: Vec<BoxedLayer>,
}

impl Logger {
    /// Create a logger without layers, taking the level from `env_var`.
    ///
    /// A missing variable selects `default_log_level`, so does an unparsable one (after a
    /// warning on stderr).
    pub fn from_env(env_var: &str, default_log_level: LevelFilter) -> Logger {
        Self::with_level(level_from_env(env_var, default_log_level))
    }

    pub fn with_level(log_level: LevelFilter) -> Logger {
        Logger {
            global_log_level: log_level,
            layer: Vec::new(),
        }
    }

    pub fn level(&self) -> LevelFilter {
        self.global_log_level
    }

    /// Print to journald, or to stderr if the journal cannot be opened.
    pub fn journald(mut self) -> Logger {
        self.layer.push(
            journald_or_stderr_layer()
                .with_filter(self.global_log_level)
                .boxed(),
        );
        self
    }

    /// Print to stderr in the compact format (level and message, no timestamp).
    pub fn stderr(mut self) -> Logger {
        self.layer
            .push(stderr_layer().with_filter(self.global_log_level).boxed());
        self
    }

    /// Install the configured layers as global subscriber.
    ///
    /// Also sets up the `LogTracer` so `log` records are turned into tracing events.
    pub fn init(self) -> Result<(), anyhow::Error> {
        let registry = tracing_subscriber::registry().with(self.layer);
        tracing::subscriber::set_global_default(registry)?;

        LogTracer::init_with_filter(self.global_log_level.as_log())?;
        Ok(())
    }
}
