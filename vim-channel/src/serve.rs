use serde_json::json;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::info;
use tracing::warn;
use walker_core::Command;
use walker_core::SessionController;
use walker_core::WalkerConfig;

use crate::channel::Request;
use crate::channel::VimChannel;
use crate::error::Result;
use crate::host::VimHost;

/// Every `g:walker_*` variable, as one dictionary.
pub const SETTINGS_EXPR: &str = r#"filter(copy(g:), 'v:key =~# "^walker_"')"#;
pub const SETTINGS_PREFIX: &str = "walker_";

/// Reads the plugin settings. Unreadable or invalid settings fall back to
/// the defaults.
pub async fn load_config(channel: &VimChannel) -> WalkerConfig {
    let settings = match channel.expr(SETTINGS_EXPR).await {
        Ok(settings) => settings,
        Err(err) => {
            warn!("failed to read settings, using defaults: {err}");
            return WalkerConfig::default();
        }
    };
    match WalkerConfig::from_settings(settings, SETTINGS_PREFIX) {
        Ok(config) => config,
        Err(err) => {
            warn!("{err}; using defaults");
            WalkerConfig::default()
        }
    }
}

/// Feeds editor requests to a session until the editor goes away.
pub async fn serve(
    channel: VimChannel,
    mut requests: mpsc::UnboundedReceiver<Request>,
    config: WalkerConfig,
) -> Result<()> {
    let (commands, commands_rx) = mpsc::unbounded_channel();
    let controller = SessionController::new(VimHost::new(channel.clone()), config);
    let session = tokio::spawn(controller.run(commands_rx));

    while let Some(Request { id, payload }) = requests.recv().await {
        let ack = match serde_json::from_value::<Command>(payload) {
            Ok(command) => {
                debug!(id, ?command, "request");
                if commands.send(command).is_err() {
                    warn!("session ended; dropping request {id}");
                    break;
                }
                json!("ok")
            }
            Err(err) => {
                warn!("undecodable request {id}: {err}");
                json!({ "error": err.to_string() })
            }
        };
        if id > 0 {
            channel.reply(id, ack)?;
        }
    }

    info!("editor disconnected");
    drop(commands);
    session.await?;
    Ok(())
}
