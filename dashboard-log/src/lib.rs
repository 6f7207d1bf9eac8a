#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

//! Logging setup shared by dashboard binaries and tools.
//!
//! All crates of the workspace log through `tracing`. [`Logger`] decides where those events
//! (and `log` records of dependencies) end up.

use std::env;

use tracing_subscriber::prelude::*;

pub mod builder;
pub use builder::Logger;

pub use tracing::debug;
pub use tracing::error;
pub use tracing::info;
pub use tracing::trace;
pub use tracing::warn;
pub use tracing::Level;
pub use tracing_subscriber::filter::LevelFilter;

/// Environment variable holding the log level of dashboard tools.
pub const DASHBOARD_LOG_ENV: &str = "DASHBOARD_LOG";

fn journald_or_stderr_layer<S>() -> Box<dyn tracing_subscriber::Layer<S> + Send + Sync>
where
    S: tracing::Subscriber,
    S: for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    match tracing_journald::layer() {
        Ok(layer) => layer.boxed(),
        Err(err) => {
            eprintln!("unable to open the journal, logging to stderr: {err}");
            stderr_layer().boxed()
        }
    }
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber,
    S: for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    let format = tracing_subscriber::fmt::format()
        .with_level(true)
        .without_time()
        .with_target(false)
        .compact();
    tracing_subscriber::fmt::layer()
        .event_format(format)
        .with_writer(std::io::stderr)
}

fn level_from_env(env_var: &str, default_log_level: LevelFilter) -> LevelFilter {
    parse_level(env::var(env_var).ok().as_deref(), default_log_level).unwrap_or_else(|err| {
        eprintln!("env variable {env_var} found, but parsing failed: {err}");
        default_log_level
    })
}

/// Parse a level name (`off`, `error`, `warn`, `info`, `debug`, `trace`), `None` selects the
/// default.
pub fn parse_level(
    value: Option<&str>,
    default_log_level: LevelFilter,
) -> Result<LevelFilter, anyhow::Error> {
    match value.map(str::trim) {
        None | Some("") => Ok(default_log_level),
        Some(value) => value
            .parse::<LevelFilter>()
            .map_err(|err| anyhow::format_err!("invalid log level '{value}' - {err}")),
    }
}

/// Log to stderr with the level taken from `DASHBOARD_LOG`, `INFO` by default.
pub fn init_cli_logger() -> Result<(), anyhow::Error> {
    Logger::from_env(DASHBOARD_LOG_ENV, LevelFilter::INFO)
        .stderr()
        .init()
}
