//! The editor side of a session.
//!
//! Everything the controller does to the editor (scratch surfaces, cursor
//! movement, opening the chosen file, messages) goes through [`EditorHost`].
//! The Vim channel bridge implements it for a live editor; tests use an
//! in-memory fake.

use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Host-assigned identifier of a display surface (a Vim buffer number).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceId(pub i64);

/// Host-assigned identifier of an editor window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceRole {
    /// Collected and filtered paths, one per line.
    Results,
    /// The one-line free-text query.
    Query,
}

impl SurfaceRole {
    /// Buffer name and filetype used for the surface.
    pub fn name(self) -> &'static str {
        match self {
            SurfaceRole::Results => "walker",
            SurfaceRole::Query => "walker-filter",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Down,
    Up,
}

impl Direction {
    /// `true` moves down, matching the boolean the key mappings send.
    pub fn from_down(down: bool) -> Self {
        if down { Direction::Down } else { Direction::Up }
    }
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("editor channel closed")]
    Disconnected,

    #[error("{call} failed: {message}")]
    Call { call: String, message: String },

    #[error("unexpected reply to {call}: {source}")]
    Decode {
        call: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HostError {
    pub fn call(call: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Call {
            call: call.into(),
            message: message.into(),
        }
    }

    pub fn decode(call: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            call: call.into(),
            source,
        }
    }
}

pub type HostResult<T> = std::result::Result<T, HostError>;

#[async_trait]
pub trait EditorHost: Send + Sync {
    /// The editor's current working directory.
    async fn cwd(&self) -> HostResult<PathBuf>;

    /// Expands editor path shorthands (`~`, `%:h`, environment variables).
    async fn expand(&self, path: &str) -> HostResult<String>;

    /// Absolute directory of the buffer in the current window.
    async fn buffer_dir(&self) -> HostResult<PathBuf>;

    /// Prompts the user. `None` when the prompt was cancelled or left empty.
    async fn input(&self, prompt: &str) -> HostResult<Option<String>>;

    async fn current_window(&self) -> HostResult<WindowId>;

    /// Opens a scratch surface of `height` lines at the bottom of the screen
    /// and makes it current.
    async fn create_surface(&self, role: SurfaceRole, height: usize) -> HostResult<SurfaceId>;

    /// Registers the refresh triggers for `surface`: a periodic forced refresh
    /// for results, a refresh on every keystroke for the query.
    async fn watch_surface(&self, surface: SurfaceId, role: SurfaceRole) -> HostResult<()>;

    async fn install_key_bindings(&self, surface: SurfaceId, role: SurfaceRole) -> HostResult<()>;

    /// First line of `surface`, empty when the surface has no lines.
    async fn first_line(&self, surface: SurfaceId) -> HostResult<String>;

    /// Clears `surface` and writes `lines` from the top.
    async fn replace_lines(&self, surface: SurfaceId, lines: &[String]) -> HostResult<()>;

    async fn append_lines(&self, surface: SurfaceId, lines: &[String]) -> HostResult<()>;

    /// 1-based cursor line and line count of the window showing `surface`.
    async fn cursor(&self, surface: SurfaceId) -> HostResult<(usize, usize)>;

    async fn set_cursor(&self, surface: SurfaceId, line: usize) -> HostResult<()>;

    /// Text of the line under the cursor in `surface`.
    async fn selected_line(&self, surface: SurfaceId) -> HostResult<String>;

    async fn focus_surface(&self, surface: SurfaceId) -> HostResult<()>;

    async fn focus_window(&self, window: WindowId) -> HostResult<()>;

    async fn set_insert_mode(&self, insert: bool) -> HostResult<()>;

    async fn open_file(&self, path: &Path) -> HostResult<()>;

    async fn echo(&self, message: &str) -> HostResult<()>;

    async fn echo_error(&self, message: &str) -> HostResult<()>;

    async fn redraw(&self) -> HostResult<()>;

    /// Wipes `surface`. Closing a surface that is already gone is not an error.
    async fn close_surface(&self, surface: SurfaceId) -> HostResult<()>;
}
