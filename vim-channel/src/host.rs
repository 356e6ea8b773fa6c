use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::json;
use tracing::trace;
use walker_core::EditorHost;
use walker_core::HostError;
use walker_core::HostResult;
use walker_core::SurfaceId;
use walker_core::SurfaceRole;
use walker_core::WindowId;

use crate::channel::VimChannel;
use crate::script;
use crate::script::string_literal;

/// [`EditorHost`] backed by a live Vim.
#[derive(Clone)]
pub struct VimHost {
    channel: VimChannel,
}

impl VimHost {
    pub fn new(channel: VimChannel) -> Self {
        Self { channel }
    }

    /// Runs `commands` through `execute()` and waits until Vim is done.
    async fn execute(&self, commands: Vec<String>) -> HostResult<()> {
        trace!(?commands, "execute");
        self.channel.call("execute", vec![json!(commands)]).await?;
        Ok(())
    }

    /// Runs `commands` in the window showing `surface`.
    async fn execute_in(&self, surface: SurfaceId, commands: Vec<String>) -> HostResult<()> {
        let window = self.window_of(surface).await?;
        self.channel
            .call("win_execute", vec![json!(window), json!(commands)])
            .await?;
        Ok(())
    }

    async fn window_of(&self, surface: SurfaceId) -> HostResult<i64> {
        let window: i64 = self.channel.eval(&format!("bufwinid({surface})")).await?;
        if window <= 0 {
            return Err(HostError::call(
                "bufwinid",
                format!("buffer {surface} is not shown in any window"),
            ));
        }
        Ok(window)
    }

    async fn lines(&self, expr: &str) -> HostResult<Vec<String>> {
        self.channel.eval(expr).await
    }
}

#[async_trait]
impl EditorHost for VimHost {
    async fn cwd(&self) -> HostResult<PathBuf> {
        let cwd: String = self.channel.eval("getcwd()").await?;
        Ok(PathBuf::from(cwd))
    }

    async fn expand(&self, path: &str) -> HostResult<String> {
        let expanded = self.channel.call("expand", vec![json!(path)]).await?;
        serde_json::from_value(expanded).map_err(|err| HostError::decode("expand", err))
    }

    async fn buffer_dir(&self) -> HostResult<PathBuf> {
        let dir: String = self.channel.eval("expand('%:p:h')").await?;
        Ok(PathBuf::from(dir))
    }

    async fn input(&self, prompt: &str) -> HostResult<Option<String>> {
        // Wrapped in a list so that typing "ERROR" is not mistaken for a
        // failed evaluation.
        let answer: Vec<String> = self
            .lines(&format!("[input({})]", string_literal(prompt)))
            .await?;
        Ok(answer.into_iter().next().filter(|answer| !answer.is_empty()))
    }

    async fn current_window(&self) -> HostResult<WindowId> {
        self.channel.eval("win_getid()").await.map(WindowId)
    }

    async fn create_surface(&self, role: SurfaceRole, height: usize) -> HostResult<SurfaceId> {
        self.execute(script::open_surface(role, height)).await?;
        self.channel.eval("bufnr('%')").await.map(SurfaceId)
    }

    async fn watch_surface(&self, surface: SurfaceId, role: SurfaceRole) -> HostResult<()> {
        self.execute(script::watch_surface(role, surface)).await
    }

    async fn install_key_bindings(&self, surface: SurfaceId, role: SurfaceRole) -> HostResult<()> {
        self.execute_in(surface, script::key_bindings(role)).await
    }

    async fn first_line(&self, surface: SurfaceId) -> HostResult<String> {
        let lines = self.lines(&format!("getbufline({surface}, 1)")).await?;
        Ok(lines.into_iter().next().unwrap_or_default())
    }

    async fn replace_lines(&self, surface: SurfaceId, lines: &[String]) -> HostResult<()> {
        self.channel
            .call("deletebufline", vec![json!(surface), json!(1), json!("$")])
            .await?;
        if !lines.is_empty() {
            self.channel
                .call("setbufline", vec![json!(surface), json!(1), json!(lines)])
                .await?;
        }
        Ok(())
    }

    async fn append_lines(&self, surface: SurfaceId, lines: &[String]) -> HostResult<()> {
        self.channel
            .call("appendbufline", vec![json!(surface), json!("$"), json!(lines)])
            .await?;
        Ok(())
    }

    async fn cursor(&self, surface: SurfaceId) -> HostResult<(usize, usize)> {
        let window = self.window_of(surface).await?;
        self.channel
            .eval(&format!("[line('.', {window}), line('$', {window})]"))
            .await
    }

    async fn set_cursor(&self, surface: SurfaceId, line: usize) -> HostResult<()> {
        self.execute_in(surface, vec![format!("call cursor({line}, 1)")])
            .await
    }

    async fn selected_line(&self, surface: SurfaceId) -> HostResult<String> {
        let window = self.window_of(surface).await?;
        let lines = self
            .lines(&format!("getbufline({surface}, line('.', {window}))"))
            .await?;
        Ok(lines.into_iter().next().unwrap_or_default())
    }

    async fn focus_surface(&self, surface: SurfaceId) -> HostResult<()> {
        let window = self.window_of(surface).await?;
        self.focus_window(WindowId(window)).await
    }

    async fn focus_window(&self, window: WindowId) -> HostResult<()> {
        let moved: i64 = self.channel.eval(&format!("win_gotoid({window})")).await?;
        if moved == 0 {
            return Err(HostError::call(
                "win_gotoid",
                format!("window {window} no longer exists"),
            ));
        }
        Ok(())
    }

    async fn set_insert_mode(&self, insert: bool) -> HostResult<()> {
        self.channel
            .ex(if insert { "startinsert!" } else { "stopinsert" })
    }

    async fn open_file(&self, path: &Path) -> HostResult<()> {
        self.execute(vec![script::edit_file(&path.to_string_lossy())])
            .await
    }

    async fn echo(&self, message: &str) -> HostResult<()> {
        self.channel.ex(&script::echo(message))
    }

    async fn echo_error(&self, message: &str) -> HostResult<()> {
        self.channel.ex(&script::echo_error(message))
    }

    async fn redraw(&self) -> HostResult<()> {
        self.channel.redraw(false)
    }

    async fn close_surface(&self, surface: SurfaceId) -> HostResult<()> {
        self.channel.ex(&script::wipe(surface))
    }
}

