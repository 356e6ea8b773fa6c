//! Incremental file finder behind the `walker` editor plugin.
//!
//! A session walks a directory tree collecting paths that match the user's
//! patterns, re-filters the growing list on every keystroke and opens the
//! selected file in the editor. The editor itself is reached through
//! [`EditorHost`].

pub mod collector;
pub mod command;
pub mod config;
mod error;
pub mod filter;
pub mod host;
pub mod matcher;
pub mod session;
pub mod view;

pub use collector::Entry;
pub use collector::EntryCollector;
pub use collector::WalkEvent;
pub use collector::WalkHandle;
pub use collector::WalkRequest;
pub use command::Command;
pub use command::WalkArgs;
pub use config::WalkerConfig;
pub use error::Result;
pub use error::WalkerError;
pub use filter::RefreshOutcome;
pub use filter::ViewUpdate;
pub use host::Direction;
pub use host::EditorHost;
pub use host::HostError;
pub use host::HostResult;
pub use host::SurfaceId;
pub use host::SurfaceRole;
pub use host::WindowId;
pub use matcher::PathMatcher;
pub use session::Phase;
pub use session::SessionController;
pub use session::SessionState;
