use anyhow::Context;
use clap::Parser;
use tracing::info;
use walker_vim_channel::load_config;
use walker_vim_channel::serve;

use crate::logging::LogHandle;

/// Speaks Vim's JSON channel protocol on stdin/stdout; started by the plugin
/// with `job_start()`.
#[derive(Debug, Parser)]
pub struct ServeCommand {}

pub async fn run(_cmd: ServeCommand, log: &LogHandle) -> anyhow::Result<()> {
    let (channel, requests) = walker_vim_channel::spawn(tokio::io::stdin(), tokio::io::stdout());
    let config = load_config(&channel).await;
    if config.debug {
        log.enable_debug();
    }
    info!(?config, "serving editor");
    serve(channel, requests, config)
        .await
        .context("editor session failed")
}
