use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::ArgAction;
use clap::Parser;
use tracing::debug;
use walker_core::EntryCollector;
use walker_core::PathMatcher;
use walker_core::WalkEvent;
use walker_core::WalkerConfig;
use walker_core::collector::resolve_root;
use walker_core::matcher::compile_case_insensitive;
use walker_core::view::status_line;

#[derive(Debug, Parser)]
pub struct ListCommand {
    /// Case-insensitive regular expressions; a file is listed when any of
    /// them matches its absolute path.
    #[arg(value_name = "PATTERN", required = true)]
    pub patterns: Vec<String>,

    /// Directory to walk (defaults to the current directory).
    #[arg(long = "path", value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Only print entries that also match this query.
    #[arg(long = "filter", value_name = "QUERY")]
    pub filter: Option<String>,

    /// Skip paths matching this pattern (repeatable).
    #[arg(long = "exclude", value_name = "PATTERN", action = ArgAction::Append)]
    pub exclude: Vec<String>,

    /// Do not skip version-control directories and build artifacts.
    #[arg(long = "no-default-excludes")]
    pub no_default_excludes: bool,

    /// Entries collected between progress reports.
    #[arg(long = "batch-size", value_name = "N")]
    pub batch_size: Option<usize>,
}

impl ListCommand {
    pub fn config(&self) -> anyhow::Result<WalkerConfig> {
        let mut config = WalkerConfig::default();
        if self.no_default_excludes {
            config.exclude_patterns.clear();
        }
        config.exclude_patterns.extend(self.exclude.iter().cloned());
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        config.validate()?;
        Ok(config)
    }
}

pub async fn run(cmd: ListCommand) -> anyhow::Result<()> {
    let config = cmd.config()?;
    let query = cmd
        .filter
        .as_deref()
        .map(compile_case_insensitive)
        .transpose()?;
    let cwd = std::env::current_dir().context("failed to read the current directory")?;
    let dir = cmd
        .path
        .as_ref()
        .map_or_else(|| ".".to_string(), |path| path.to_string_lossy().into_owned());
    let root = resolve_root(&cwd, &dir)?;
    let matcher = PathMatcher::new(&cmd.patterns, &config.exclude_patterns)?;
    let mut walk = EntryCollector::new(root, matcher, config.batch_size)?.spawn();

    let mut stdout = std::io::stdout().lock();
    let mut total = 0usize;
    let mut shown = 0usize;
    let mut complete = false;
    while let Some(event) = walk.next_event().await {
        let batch = match event {
            WalkEvent::Batch(batch) => batch,
            WalkEvent::Complete(batch) => {
                complete = true;
                batch
            }
            WalkEvent::Stopped(batch) => batch,
        };
        total += batch.len();
        debug!(total, "walk progress");
        for entry in batch {
            if query.as_ref().is_none_or(|query| query.is_match(&entry)) {
                writeln!(stdout, "{entry}")?;
                shown += 1;
            }
        }
    }
    stdout.flush()?;
    eprintln!("{}", status_line(shown, total, complete));
    Ok(())
}
