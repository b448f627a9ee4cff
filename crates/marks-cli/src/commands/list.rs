use crate::commands::common::{mount_dashboard, print_bookmarks};
use crate::error::CliError;

pub async fn run_list(
    limit: usize,
    as_json: bool,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let dashboard = mount_dashboard(global_profile).await?;
    let bookmarks = dashboard.controller().snapshot().bookmarks;
    print_bookmarks(&bookmarks, limit, as_json)
}
