use marks_core::remote::RemoteClient;
use marks_core::{AddOutcome, BookmarkController, BookmarkId};

use crate::commands::common::mount_dashboard;
use crate::error::CliError;

pub async fn run_add(title: &str, url: &str, global_profile: Option<&str>) -> Result<(), CliError> {
    let dashboard = mount_dashboard(global_profile).await?;
    let id = add_bookmark(dashboard.controller(), title, url).await?;
    println!("{id}");
    Ok(())
}

pub async fn add_bookmark<C: RemoteClient>(
    controller: &BookmarkController<C>,
    title: &str,
    url: &str,
) -> Result<BookmarkId, CliError> {
    match controller.add_bookmark(title, url).await? {
        AddOutcome::Added(id) => Ok(id),
        AddOutcome::Skipped => Err(CliError::MissingBookmarkFields),
    }
}
