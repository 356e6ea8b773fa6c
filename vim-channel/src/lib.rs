//! Bridge between a Vim job channel and a walker session.
//!
//! Vim starts the `walker serve` binary as a job in JSON channel mode. The
//! channel carries the editor's commands to the session and the session's
//! calls back into the editor.

pub mod channel;
mod error;
mod host;
pub mod proto;
pub mod script;
mod serve;

pub use channel::Request;
pub use channel::VimChannel;
pub use channel::spawn;
pub use error::ChannelError;
pub use error::Result;
pub use host::VimHost;
pub use serve::SETTINGS_EXPR;
pub use serve::SETTINGS_PREFIX;
pub use serve::load_config;
pub use serve::serve;
