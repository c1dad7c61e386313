//! Deterministic ETags for single files and filtered listings.

use sha2::{Digest, Sha256};

use astral_core::types::FileFilter;
use astral_entity::file::File;

/// Bytes of the digest kept for a collection tag.
const COLLECTION_DIGEST_BYTES: usize = 12;

/// Full hex SHA-256 over `(id, name, size, public, created)`.
pub fn file_fingerprint(file: &File) -> String {
    let data = format!(
        "{}-{}-{}-{}-{}",
        file.id,
        file.name,
        file.size_bytes,
        file.public,
        file.created_at.timestamp()
    );
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// Quoted collection tag. Per-file fingerprints are sorted, so the tag does
/// not depend on listing order.
pub fn collection_etag(files: &[File], filter: &FileFilter) -> String {
    let mut hashes: Vec<String> = files.iter().map(file_fingerprint).collect();
    hashes.sort();

    // `total` repeats `count`; older clients compare against this layout.
    let components = [
        format!("count:{}", files.len()),
        format!("total:{}", files.len()),
        format!("filter:{}:{}", filter.key, filter.value),
        format!("limit:{}", filter.limit),
        format!("files:{}", hashes.join(",")),
    ];

    let digest = Sha256::digest(components.join("|").as_bytes());
    format!("\"{}\"", hex::encode(&digest[..COLLECTION_DIGEST_BYTES]))
}

/// Wrap a bare fingerprint in quotes for the `ETag` header.
pub fn quote(fingerprint: &str) -> String {
    format!("\"{fingerprint}\"")
}

/// Whether an `If-None-Match` header value matches `etag`.
///
/// Accepts `*`, comma lists, weak `W/` tags and quoted or bare values.
pub fn if_none_match_matches(header: &str, etag: &str) -> bool {
    let wanted = etag.trim().trim_matches('"');
    header.split(',').map(str::trim).any(|candidate| {
        if candidate == "*" {
            return true;
        }
        let candidate = candidate.strip_prefix("W/").unwrap_or(candidate);
        candidate.trim_matches('"') == wanted
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    use chrono::Utc;
    use uuid::Uuid;

    fn file(name: &str) -> File {
        File {
            id: Uuid::new_v4(),
            name: name.to_string(),
            is_inline_file: true,
            public: false,
            mime_type: "text/plain".to_string(),
            grant: BTreeSet::new(),
            size_bytes: 10,
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
            owner_login: "astralusr1".to_string(),
        }
    }

    #[test]
    fn test_file_fingerprint_is_full_hex_and_stable() {
        let f = file("a.txt");
        let tag = file_fingerprint(&f);
        assert_eq!(tag.len(), 64);
        assert_eq!(tag, file_fingerprint(&f.clone()));
    }

    #[test]
    fn test_file_fingerprint_tracks_name() {
        let f = file("a.txt");
        let mut renamed = f.clone();
        renamed.name = "b.txt".to_string();
        assert_ne!(file_fingerprint(&f), file_fingerprint(&renamed));
    }

    #[test]
    fn test_collection_etag_ignores_order() {
        let files = vec![file("a"), file("b"), file("c")];
        let mut reversed = files.clone();
        reversed.reverse();

        let filter = FileFilter::new("name", "a").with_limit(3);
        let tag = collection_etag(&files, &filter);
        assert_eq!(tag, collection_etag(&reversed, &filter));
        assert_eq!(tag.len(), COLLECTION_DIGEST_BYTES * 2 + 2);
        assert!(tag.starts_with('"') && tag.ends_with('"'));
    }

    #[test]
    fn test_collection_etag_depends_on_filter() {
        let files = vec![file("a")];
        assert_ne!(
            collection_etag(&files, &FileFilter::default()),
            collection_etag(&files, &FileFilter::default().with_limit(1))
        );
    }

    #[test]
    fn test_if_none_match_forms() {
        let tag = "\"abc123\"";
        assert!(if_none_match_matches("\"abc123\"", tag));
        assert!(if_none_match_matches("abc123", tag));
        assert!(if_none_match_matches("W/\"abc123\"", tag));
        assert!(if_none_match_matches("\"zzz\", \"abc123\"", tag));
        assert!(if_none_match_matches("*", tag));
        assert!(!if_none_match_matches("\"abc124\"", tag));
        assert!(!if_none_match_matches("", tag));
    }
}
