//! The session controller.
//!
//! One [`SessionController`] owns the only [`SessionState`]. Commands from the
//! editor and events from the running walk are consumed by a single loop, so
//! nothing here is ever touched concurrently.

use std::path::Path;
use std::path::PathBuf;

use tokio::sync::mpsc;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::collector::Entry;
use crate::collector::EntryCollector;
use crate::collector::WalkEvent;
use crate::collector::WalkHandle;
use crate::collector::WalkRequest;
use crate::collector::resolve_root;
use crate::command::Command;
use crate::command::WalkArgs;
use crate::config::WalkerConfig;
use crate::error::Result;
use crate::error::WalkerError;
use crate::filter;
use crate::filter::RefreshOutcome;
use crate::host::Direction;
use crate::host::EditorHost;
use crate::host::SurfaceId;
use crate::host::SurfaceRole;
use crate::host::WindowId;
use crate::matcher::PathMatcher;
use crate::view;
use crate::view::status_line;

pub const PATTERN_PROMPT: &str = "Search for pattern: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surfaces {
    pub results: SurfaceId,
    pub query: SurfaceId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Walking,
}

/// State of the current (or last) session.
///
/// Closing a session only tears down the surfaces; entries, the filtered list
/// and the last query stay around for `resume` until the next `run`.
#[derive(Debug, Default)]
pub struct SessionState {
    pub entries: Vec<Entry>,
    pub filtered: Vec<Entry>,
    pub prev_query: String,
    pub surfaces: Option<Surfaces>,
    pub return_window: Option<WindowId>,
    pub walk_complete: bool,
    pub request: Option<WalkRequest>,
}

impl SessionState {
    /// Drops everything collected so far. Open surfaces are left alone.
    fn reset(&mut self, request: WalkRequest) {
        self.entries.clear();
        self.filtered.clear();
        self.prev_query.clear();
        self.walk_complete = false;
        self.request = Some(request);
    }
}

/// 1-based line one step away from `current` in `direction`, wrapping at both
/// ends. `None` for an empty surface.
pub fn wrap_line(current: usize, count: usize, direction: Direction) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let index = current.clamp(1, count) - 1;
    let next = match direction {
        Direction::Down => (index + 1) % count,
        Direction::Up => (index + count - 1) % count,
    };
    Some(next + 1)
}

pub struct SessionController<H> {
    host: H,
    config: WalkerConfig,
    state: SessionState,
    walk: Option<WalkHandle>,
}

impl<H: EditorHost> SessionController<H> {
    pub fn new(host: H, config: WalkerConfig) -> Self {
        Self {
            host,
            config,
            state: SessionState::default(),
            walk: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        if self.state.surfaces.is_some() {
            Phase::Walking
        } else {
            Phase::Idle
        }
    }

    /// Serves commands until the sender side is dropped.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(command) => self.dispatch(command).await,
                    None => break,
                },
                event = next_walk_event(&mut self.walk) => match event {
                    Some(event) => self.handle_walk_event(event).await,
                    None => self.walk = None,
                },
            }
        }
        info!("command channel closed; shutting down");
    }

    /// Handles walk events until the current walk has reported its end.
    pub async fn finish_walk(&mut self) {
        while let Some(walk) = self.walk.as_mut() {
            match walk.next_event().await {
                Some(event) => self.handle_walk_event(event).await,
                None => self.walk = None,
            }
        }
    }

    pub async fn dispatch(&mut self, command: Command) {
        debug!(?command, "dispatch");
        let result = match command {
            Command::Run { args } => self.start_with(&args).await,
            Command::Resume => self.resume().await,
            Command::RunInBufferDir { args } => self.start_in_buffer_dir(&args).await,
            Command::Refresh { force } => self.refresh(force).await,
            Command::Accept => self.accept().await,
            Command::Cancel => self.cancel().await,
            Command::ToggleInsert => self.toggle_insert().await,
            Command::ToggleNormal => self.toggle_normal().await,
            Command::MoveSelection { down } => {
                self.move_selection(Direction::from_down(down)).await
            }
        };
        if let Err(err) = result {
            self.report(err).await;
        }
    }

    async fn report(&self, err: WalkerError) {
        match err {
            WalkerError::InvalidPattern { .. } => debug!("ignoring command: {err}"),
            WalkerError::SelectionMissing(_) => {
                info!("{err}");
                if let Err(echo_err) = self.host.echo_error(&err.to_string()).await {
                    warn!("failed to report missing selection: {echo_err}");
                }
            }
            _ => warn!("command failed: {err}"),
        }
    }

    async fn start_with(&mut self, args: &[String]) -> Result<()> {
        let args = WalkArgs::parse_args(args)?;
        self.start(args).await
    }

    /// An explicit `--path` still wins over the buffer's directory.
    async fn start_in_buffer_dir(&mut self, args: &[String]) -> Result<()> {
        let mut args = WalkArgs::parse_args(args)?;
        if args.path.is_none() {
            let dir = self.host.buffer_dir().await?;
            args.path = Some(dir.to_string_lossy().into_owned());
        }
        self.start(args).await
    }

    async fn start(&mut self, args: WalkArgs) -> Result<()> {
        let mut patterns = args.patterns;
        if patterns.is_empty() {
            match self.host.input(PATTERN_PROMPT).await? {
                Some(pattern) => patterns.push(pattern),
                None => {
                    debug!("pattern prompt cancelled");
                    return Ok(());
                }
            }
        }
        let cwd = self.host.cwd().await?;
        let dir = match args.path {
            Some(path) => self.host.expand(&path).await?,
            None => cwd.to_string_lossy().into_owned(),
        };
        let request = WalkRequest {
            root: resolve_root(&cwd, &dir)?,
            patterns,
        };
        let collector = self.collector_for(&request)?;
        info!(root = %request.root.display(), patterns = ?request.patterns, "starting walk");

        self.walk = None;
        self.state.reset(request);
        self.open(Some(collector), false).await
    }

    async fn resume(&mut self) -> Result<()> {
        let Some(request) = self.state.request.clone() else {
            return self.start(WalkArgs::default()).await;
        };
        // A walk that was still going is superseded; whatever it had not
        // reported yet is found again by the re-run.
        self.walk = None;
        let collector = if self.state.walk_complete {
            None
        } else {
            let known = self.state.entries.iter().cloned();
            Some(self.collector_for(&request)?.skip_known(known))
        };
        info!(root = %request.root.display(), rewalk = collector.is_some(), "resuming session");
        self.open(collector, true).await?;
        // Entries that arrived while the surfaces were closed.
        self.refresh(true).await
    }

    fn collector_for(&self, request: &WalkRequest) -> Result<EntryCollector> {
        let matcher = PathMatcher::new(&request.patterns, &self.config.exclude_patterns)?;
        EntryCollector::new(request.root.clone(), matcher, self.config.batch_size)
    }

    async fn open(&mut self, collector: Option<EntryCollector>, resume: bool) -> Result<()> {
        // Re-entering from an open session keeps the window it returns to.
        let return_window = match (self.state.surfaces, self.state.return_window) {
            (Some(_), Some(window)) => window,
            _ => self.host.current_window().await?,
        };
        self.close_surfaces().await;
        let surfaces = self.open_surfaces().await?;
        self.state.surfaces = Some(surfaces);
        self.state.return_window = Some(return_window);

        if resume {
            let query = [self.state.prev_query.clone()];
            self.host.replace_lines(surfaces.query, &query).await?;
            self.host
                .replace_lines(surfaces.results, &self.state.filtered)
                .await?;
        }

        self.host.focus_surface(surfaces.results).await?;
        self.host.redraw().await?;
        self.walk = collector.map(EntryCollector::spawn);
        Ok(())
    }

    async fn open_surfaces(&mut self) -> Result<Surfaces> {
        let results = self
            .host
            .create_surface(SurfaceRole::Results, self.config.results_height)
            .await?;
        match self.open_query_surface(results).await {
            Ok(query) => Ok(Surfaces { results, query }),
            Err(err) => {
                if let Err(close_err) = self.host.close_surface(results).await {
                    warn!("failed to close results surface {results}: {close_err}");
                }
                Err(err)
            }
        }
    }

    async fn open_query_surface(&self, results: SurfaceId) -> Result<SurfaceId> {
        self.prepare_surface(results, SurfaceRole::Results).await?;
        let query = self.host.create_surface(SurfaceRole::Query, 1).await?;
        self.prepare_surface(query, SurfaceRole::Query).await?;
        Ok(query)
    }

    async fn prepare_surface(&self, surface: SurfaceId, role: SurfaceRole) -> Result<()> {
        self.host.watch_surface(surface, role).await?;
        if !self.config.disable_default_key_bindings {
            self.host.install_key_bindings(surface, role).await?;
        }
        Ok(())
    }

    async fn handle_walk_event(&mut self, event: WalkEvent) {
        let batch = match event {
            WalkEvent::Batch(batch) => batch,
            WalkEvent::Complete(batch) => {
                self.walk = None;
                self.state.walk_complete = true;
                batch
            }
            WalkEvent::Stopped(batch) => {
                self.walk = None;
                batch
            }
        };
        self.state.entries.extend(batch);
        debug!(total = self.state.entries.len(), "walk progress");
        if let Err(err) = self.refresh(true).await {
            self.report(err).await;
        }
    }

    async fn refresh(&mut self, force: bool) -> Result<()> {
        let Some(surfaces) = self.state.surfaces else {
            return Ok(());
        };
        let query = self.host.first_line(surfaces.query).await?;
        let outcome = filter::refresh(
            &self.state.entries,
            &query,
            &self.state.prev_query,
            &self.state.filtered,
            force,
        )?;
        let RefreshOutcome::Updated(refreshed) = outcome else {
            return Ok(());
        };
        let status = status_line(
            refreshed.filtered.len(),
            self.state.entries.len(),
            self.state.walk_complete,
        );
        if let Err(err) = view::apply(&self.host, surfaces.results, &refreshed.update, &status).await
        {
            // The surface is in an unknown state; rewrite it next time.
            self.state.filtered.clear();
            return Err(err.into());
        }
        self.state.filtered = refreshed.filtered;
        self.state.prev_query = query;
        Ok(())
    }

    async fn accept(&mut self) -> Result<()> {
        self.stop_walk();
        let Some(surfaces) = self.state.surfaces else {
            return Ok(());
        };
        let result = match self.host.selected_line(surfaces.results).await {
            Ok(line) => self.open_selection(line).await,
            Err(err) => Err(err.into()),
        };
        self.close_surfaces().await;
        result
    }

    async fn open_selection(&self, line: String) -> Result<()> {
        let path = PathBuf::from(&line);
        if line.is_empty() || !exists(&path) {
            return Err(WalkerError::SelectionMissing(line));
        }
        if let Some(window) = self.state.return_window {
            self.host.focus_window(window).await?;
        }
        info!(path = %path.display(), "opening selection");
        self.host.open_file(&path).await?;
        Ok(())
    }

    async fn cancel(&mut self) -> Result<()> {
        self.stop_walk();
        self.close_surfaces().await;
        Ok(())
    }

    async fn toggle_insert(&mut self) -> Result<()> {
        if let Some(surfaces) = self.state.surfaces {
            self.host.focus_surface(surfaces.query).await?;
            self.host.set_insert_mode(true).await?;
        }
        Ok(())
    }

    async fn toggle_normal(&mut self) -> Result<()> {
        if let Some(surfaces) = self.state.surfaces {
            self.host.focus_surface(surfaces.results).await?;
            self.host.set_insert_mode(false).await?;
        }
        Ok(())
    }

    async fn move_selection(&mut self, direction: Direction) -> Result<()> {
        let Some(surfaces) = self.state.surfaces else {
            return Ok(());
        };
        let (line, count) = self.host.cursor(surfaces.results).await?;
        if let Some(next) = wrap_line(line, count, direction) {
            self.host.set_cursor(surfaces.results, next).await?;
        }
        Ok(())
    }

    /// Asks the walk to stop. The handle is kept so that entries accepted
    /// before the stop was observed still reach the state.
    fn stop_walk(&self) {
        if let Some(walk) = &self.walk {
            walk.stop();
        }
    }

    async fn close_surfaces(&mut self) {
        let Some(surfaces) = self.state.surfaces.take() else {
            return;
        };
        self.state.return_window = None;
        for surface in [surfaces.results, surfaces.query] {
            if let Err(err) = self.host.close_surface(surface).await {
                warn!("failed to close surface {surface}: {err}");
            }
        }
    }
}

async fn next_walk_event(walk: &mut Option<WalkHandle>) -> Option<WalkEvent> {
    match walk {
        Some(walk) => walk.next_event().await,
        None => std::future::pending().await,
    }
}

fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
