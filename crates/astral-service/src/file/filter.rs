//! Predicate evaluation over file attributes.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};

use astral_core::types::FileFilter;
use astral_entity::file::File;

/// Keep the files matching `filter`, then truncate to a positive limit.
///
/// An inactive filter or an unknown key keeps every file.
pub fn apply_filter(files: Vec<File>, filter: &FileFilter, now: DateTime<Utc>) -> Vec<File> {
    let mut selected: Vec<File> = if filter.is_active() {
        files
            .into_iter()
            .filter(|file| matches(file, &filter.key, &filter.value, now))
            .collect()
    } else {
        files
    };

    if filter.limit > 0 {
        selected.truncate(filter.limit);
    }
    selected
}

/// Whether a single file satisfies `key`/`value`.
pub fn matches(file: &File, key: &str, value: &str, now: DateTime<Utc>) -> bool {
    match key {
        "name" => contains_ignore_case(&file.name, value),
        "mime" => contains_ignore_case(&file.mime_type, value),
        "metadata" => file
            .metadata
            .values()
            .any(|v| contains_ignore_case(v, value)),
        "public" => bool_matches(file.public, value),
        "file" => bool_matches(file.is_inline_file, value),
        "grant" => file.grant.iter().any(|g| g.eq_ignore_ascii_case(value)),
        "size" => size_matches(file.size_bytes, value),
        "created" => created_matches(file.created_at, value, now),
        _ => true,
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn bool_matches(flag: bool, value: &str) -> bool {
    match value {
        "true" => flag,
        "false" => !flag,
        _ => false,
    }
}

/// `>N`, `<N`, `N-M` (inclusive) or exact `N`. Anything unparsable is a miss.
fn size_matches(size: u64, value: &str) -> bool {
    if value.contains('>') {
        let bound = value.strip_prefix('>').unwrap_or(value);
        return bound.parse::<u64>().is_ok_and(|min| size > min);
    }
    if value.contains('<') {
        let bound = value.strip_prefix('<').unwrap_or(value);
        return bound.parse::<u64>().is_ok_and(|max| size < max);
    }
    if value.contains('-') {
        let parts: Vec<&str> = value.split('-').collect();
        return match parts.as_slice() {
            [low, high] => match (low.parse::<u64>(), high.parse::<u64>()) {
                (Ok(low), Ok(high)) => (low..=high).contains(&size),
                _ => false,
            },
            _ => false,
        };
    }
    value.parse::<u64>().is_ok_and(|exact| size == exact)
}

/// `today`, `week`, `month` relative to `now`, or an exact `YYYY-MM-DD`.
fn created_matches(created: DateTime<Utc>, value: &str, now: DateTime<Utc>) -> bool {
    match value {
        "today" => created.date_naive() == now.date_naive(),
        "week" => now
            .checked_sub_days(Days::new(7))
            .is_some_and(|since| created > since),
        "month" => now
            .checked_sub_months(Months::new(1))
            .is_some_and(|since| created > since),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .is_ok_and(|day| created.date_naive() == day),
    }
}
