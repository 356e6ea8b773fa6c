//! Structured logs on stderr.
//!
//! stdout belongs to the editor channel, so nothing else may write there.
//! `RUST_LOG` wins over everything; otherwise the level is `warn`, or `debug`
//! once `--debug` or the editor's debug setting asks for it.

use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload;

const DEFAULT_LEVEL: &str = "warn";
const DEBUG_LEVEL: &str = "debug";

pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

pub fn init(debug: bool) -> anyhow::Result<LogHandle> {
    let (filter, from_env) = build_filter(debug);
    let (filter, handle) = reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(true)
                .without_time()
                .compact(),
        )
        .try_init()
        .context("failed to install the log subscriber")?;
    Ok(LogHandle {
        filter: handle,
        from_env,
    })
}

fn build_filter(debug: bool) -> (EnvFilter, bool) {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return (filter, true);
    }
    (EnvFilter::new(level(debug)), false)
}

fn level(debug: bool) -> &'static str {
    if debug { DEBUG_LEVEL } else { DEFAULT_LEVEL }
}

impl LogHandle {
    /// Raises the level to debug. An explicit `RUST_LOG` is left alone.
    pub fn enable_debug(&self) {
        if self.from_env {
            return;
        }
        if let Err(err) = self.filter.reload(EnvFilter::new(DEBUG_LEVEL)) {
            tracing::warn!("failed to raise the log level: {err}");
        }
    }
}
