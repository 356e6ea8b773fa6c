//! Directory traversal that feeds the session.
//!
//! The walk runs on the blocking pool and reports to the controller through
//! an unbounded channel. It is only ever observed at batch boundaries: every
//! `batch_size` accepted entries it posts a [`WalkEvent::Batch`], and it ends
//! with exactly one [`WalkEvent::Complete`] or [`WalkEvent::Stopped`] that
//! carries whatever was accepted since the last batch.

use std::collections::HashSet;
use std::fs;
use std::mem;
use std::path::Path;
use std::path::PathBuf;

use path_absolutize::Absolutize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;
use walkdir::WalkDir;

use crate::error::Result;
use crate::error::WalkerError;
use crate::matcher::PathMatcher;

/// Absolute path of a collected file.
pub type Entry = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    Batch(Vec<Entry>),
    Complete(Vec<Entry>),
    Stopped(Vec<Entry>),
}

/// What to walk. Kept by the session so an unfinished walk can be resumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkRequest {
    pub root: PathBuf,
    pub patterns: Vec<String>,
}

/// Resolves the walk root: `dir` relative to `cwd` unless already absolute.
pub fn resolve_root(cwd: &Path, dir: &str) -> Result<PathBuf> {
    let path = Path::new(dir);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    path.absolutize_from(cwd)
        .map(|resolved| resolved.into_owned())
        .map_err(|err| WalkerError::root_unreadable(cwd.join(dir), err))
}

pub struct EntryCollector {
    root: PathBuf,
    matcher: PathMatcher,
    batch_size: usize,
    known: HashSet<Entry>,
}

impl EntryCollector {
    /// Fails fast when `root` cannot be listed.
    pub fn new(root: PathBuf, matcher: PathMatcher, batch_size: usize) -> Result<Self> {
        fs::read_dir(&root).map_err(|err| WalkerError::root_unreadable(root.clone(), err))?;
        Ok(Self {
            root,
            matcher,
            batch_size: batch_size.max(1),
            known: HashSet::new(),
        })
    }

    /// Entries already collected by an earlier walk of the same request; they
    /// are neither reported nor counted again.
    pub fn skip_known(mut self, known: impl IntoIterator<Item = Entry>) -> Self {
        self.known.extend(known);
        self
    }

    /// Walks synchronously, handing every event to `sink`.
    pub fn collect(self, cancel: &CancellationToken, mut sink: impl FnMut(WalkEvent)) {
        let matcher = &self.matcher;
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !matcher.is_excluded(&entry.path().to_string_lossy())
            });

        let mut pending = Vec::with_capacity(self.batch_size);
        let mut accepted = 0usize;
        for item in walker {
            if cancel.is_cancelled() {
                debug!(accepted, "walk stopped");
                sink(WalkEvent::Stopped(pending));
                return;
            }
            let entry = match item {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping entry: {err}");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path().to_string_lossy().into_owned();
            if !self.matcher.matches(&path) || self.known.contains(&path) {
                continue;
            }
            pending.push(path);
            accepted += 1;
            if accepted % self.batch_size == 0 {
                sink(WalkEvent::Batch(mem::take(&mut pending)));
            }
        }
        info!(accepted, root = %self.root.display(), "walk complete");
        sink(WalkEvent::Complete(pending));
    }

    /// Starts the walk on the blocking pool.
    pub fn spawn(self) -> WalkHandle {
        let cancel = CancellationToken::new();
        let (tx, events) = mpsc::unbounded_channel();
        let token = cancel.clone();
        tokio::task::spawn_blocking(move || {
            let on_closed = token.clone();
            self.collect(&token, move |event| {
                if tx.send(event).is_err() {
                    // Nobody is listening anymore.
                    on_closed.cancel();
                }
            });
        });
        WalkHandle { cancel, events }
    }
}

/// The controller's end of a running walk. Dropping it stops the walk.
#[derive(Debug)]
pub struct WalkHandle {
    cancel: CancellationToken,
    events: mpsc::UnboundedReceiver<WalkEvent>,
}

impl WalkHandle {
    /// Requests a stop. Observed by the walk before it accepts another entry.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub async fn next_event(&mut self) -> Option<WalkEvent> {
        self.events.recv().await
    }
}

impl Drop for WalkHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
