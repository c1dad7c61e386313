//! Cache key builders for all Astral cache entries.
//!
//! Centralising key construction keeps the per-file and per-listing
//! namespaces consistent between the writers and the invalidators.

use uuid::Uuid;

use astral_core::result::AppResult;
use astral_core::types::FileFilter;

/// Cache key for a single file with its content.
pub fn file_by_id(file_id: Uuid) -> String {
    format!("file:{file_id}")
}

/// Cache key for one filtered listing of an owner's files as seen by `viewer_login`.
///
/// Other viewers only see readable files, so their listings differ from
/// the owner's and are cached apart.
pub fn file_list(
    owner_login: &str,
    viewer_login: &str,
    filter: &FileFilter,
) -> AppResult<String> {
    let filter = serde_json::to_string(filter)?;
    Ok(format!("{}{viewer_login}:{filter}", file_list_prefix(owner_login)))
}

/// Prefix covering every cached listing of an owner.
pub fn file_list_prefix(owner_login: &str) -> String {
    format!("list:{owner_login}:")
}
