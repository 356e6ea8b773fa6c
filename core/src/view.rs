use tracing::debug;

use crate::filter::ViewUpdate;
use crate::host::EditorHost;
use crate::host::HostResult;
use crate::host::SurfaceId;

/// `[filtered / total]`, marked once the walk has finished.
pub fn status_line(filtered: usize, total: usize, walk_complete: bool) -> String {
    if walk_complete {
        format!("[{filtered} / {total}] walk end !")
    } else {
        format!("[{filtered} / {total}]")
    }
}

/// Writes a filter result to the results surface and the status line.
pub async fn apply(
    host: &dyn EditorHost,
    results: SurfaceId,
    update: &ViewUpdate,
    status: &str,
) -> HostResult<()> {
    host.echo(status).await?;
    match update {
        ViewUpdate::Append(tail) => {
            debug!(appended = tail.len(), "append to results");
            if !tail.is_empty() {
                host.append_lines(results, tail).await?;
            }
        }
        ViewUpdate::Replace(all) => {
            debug!(lines = all.len(), "rewrite results");
            host.replace_lines(results, all).await?;
        }
    }
    host.redraw().await
}
