//! Encoding of [`File`] attributes into backend object metadata and back.
//!
//! There is no metadata table: name, grant list, visibility, and upload time
//! are stored as reserved keys next to the user's own metadata on the object.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use astral_core::error::AppError;
use astral_core::result::AppResult;
use astral_core::traits::storage::ObjectInfo;

use super::model::File;

/// Original file name.
pub const META_FILE_NAME: &str = "file_name";
/// Grant list joined by [`GRANT_SEPARATOR`].
pub const META_GRANT: &str = "grant";
/// `"true"` or `"false"`.
pub const META_PUBLIC: &str = "public";
/// `"true"` when the object carries byte content.
pub const META_INLINE: &str = "inline";
/// RFC 3339 upload time.
pub const META_CREATED_AT: &str = "created_at";

/// Separator between grant entries.
pub const GRANT_SEPARATOR: char = ';';

/// Fallback content type.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const RESERVED_KEYS: [&str; 5] = [
    META_FILE_NAME,
    META_GRANT,
    META_PUBLIC,
    META_INLINE,
    META_CREATED_AT,
];

/// Object key for a file: `{owner}/{id}`.
pub fn object_key(owner_login: &str, id: Uuid) -> String {
    format!("{owner_login}/{id}")
}

/// Prefix covering every object of one owner.
pub fn owner_prefix(owner_login: &str) -> String {
    format!("{owner_login}/")
}

/// Trim user metadata, drop empty keys or values, and drop reserved keys.
///
/// Keys are lowercased because S3-compatible backends do so on write.
pub fn sanitize_metadata(raw: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    raw.iter()
        .filter_map(|(key, value)| {
            let key = key.trim().to_lowercase();
            let value = value.trim();
            if key.is_empty() || value.is_empty() || RESERVED_KEYS.contains(&key.as_str()) {
                None
            } else {
                Some((key, value.to_string()))
            }
        })
        .collect()
}

/// Normalize a grant list: trimmed, no empty entries.
pub fn sanitize_grant<I, S>(entries: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|entry| entry.as_ref().trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Build the backend metadata map for a file.
pub fn encode_object_metadata(file: &File) -> HashMap<String, String> {
    let mut meta: HashMap<String, String> = file
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let grant = file
        .grant
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(&GRANT_SEPARATOR.to_string());

    meta.insert(META_FILE_NAME.to_string(), file.name.clone());
    meta.insert(META_GRANT.to_string(), grant);
    meta.insert(META_PUBLIC.to_string(), file.public.to_string());
    meta.insert(META_INLINE.to_string(), file.is_inline_file.to_string());
    meta.insert(
        META_CREATED_AT.to_string(),
        file.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
    );
    meta
}

/// Rebuild a [`File`] from backend object metadata.
///
/// Owner and id come from the key; reserved keys are stripped from the
/// returned user metadata.
pub fn decode_object(info: &ObjectInfo) -> AppResult<File> {
    let (owner, id) = info
        .key
        .split_once('/')
        .ok_or_else(|| AppError::internal(format!("Malformed object key: {}", info.key)))?;
    let id = Uuid::parse_str(id)
        .map_err(|_| AppError::internal(format!("Malformed object id in key: {}", info.key)))?;

    let lookup = |key: &str| info.metadata.get(key).map(String::as_str);

    let grant = lookup(META_GRANT)
        .map(|joined| sanitize_grant(joined.split(GRANT_SEPARATOR)))
        .unwrap_or_default();

    let created_at = lookup(META_CREATED_AT)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(info.last_modified);

    let is_inline_file = match lookup(META_INLINE) {
        Some(flag) => flag == "true",
        None => info.size_bytes > 0,
    };

    let metadata = info
        .metadata
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(File {
        id,
        name: lookup(META_FILE_NAME).unwrap_or_default().to_string(),
        is_inline_file,
        public: lookup(META_PUBLIC) == Some("true"),
        mime_type: if info.content_type.is_empty() {
            DEFAULT_CONTENT_TYPE.to_string()
        } else {
            info.content_type.clone()
        },
        grant,
        size_bytes: info.size_bytes,
        metadata,
        created_at,
        owner_login: owner.to_string(),
    })
}

/// Guess a content type from a file name extension.
pub fn detect_content_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .to_string()
}
