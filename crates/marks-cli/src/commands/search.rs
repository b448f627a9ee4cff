use marks_core::remote::RemoteClient;
use marks_core::{Bookmark, BookmarkController};

use crate::commands::common::{mount_dashboard, print_bookmarks};
use crate::error::CliError;

pub async fn run_search(
    term: &str,
    limit: usize,
    as_json: bool,
    global_profile: Option<&str>,
) -> Result<(), CliError> {
    let dashboard = mount_dashboard(global_profile).await?;
    let bookmarks = search_bookmarks(dashboard.controller(), term);
    print_bookmarks(&bookmarks, limit, as_json)
}

/// Apply the term to the loaded list; matching happens client side.
pub fn search_bookmarks<C: RemoteClient>(
    controller: &BookmarkController<C>,
    term: &str,
) -> Vec<Bookmark> {
    controller.set_search_term(term);
    controller.filtered()
}
