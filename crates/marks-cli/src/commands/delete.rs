use marks_core::remote::RemoteClient;
use marks_core::{BookmarkController, BookmarkId};

use crate::commands::common::{mount_dashboard, resolve_bookmark_id};
use crate::error::CliError;

pub async fn run_delete(id: &str, global_profile: Option<&str>) -> Result<(), CliError> {
    let dashboard = mount_dashboard(global_profile).await?;
    let id = delete_bookmark(dashboard.controller(), id).await?;
    println!("{id}");
    Ok(())
}

/// Resolve `query` and request deletion. Remote failures are only logged.
pub async fn delete_bookmark<C: RemoteClient>(
    controller: &BookmarkController<C>,
    query: &str,
) -> Result<BookmarkId, CliError> {
    let bookmarks = controller.snapshot().bookmarks;
    let id = resolve_bookmark_id(query, &bookmarks)?;
    controller.delete_bookmark(&id).await;
    Ok(id)
}
