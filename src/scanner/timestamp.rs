//! Creation time for an imported image.
//!
//! Generation time from the embedded metadata is preferred; the file's
//! modification time is the fallback. A malformed value never fails the file.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use serde_json::Value;
use std::path::Path;

/// Metadata keys checked in order.
const TIMESTAMP_KEYS: &[&str] = &["created", "created_at", "timestamp", "time"];

/// UTC form with fractional seconds; see `has_microsecond_fraction`.
const FRACTION_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Accepted formats, tried in order for each key.
const TIMESTAMP_FORMATS: &[&str] = &[
    FRACTION_FORMAT,
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S",
];

/// Format of `created_at`/`updated_at` in the catalog.
pub const CATALOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Resolve the catalog timestamp for `path`.
pub fn resolve_created_at(metadata: Option<&Value>, path: &Path) -> Result<String> {
    let resolved = match metadata.and_then(timestamp_from_metadata) {
        Some(dt) => dt,
        None => file_mtime(path)?,
    };
    Ok(resolved.format(CATALOG_TIMESTAMP_FORMAT).to_string())
}

/// First key holding a string that parses under any accepted format.
pub fn timestamp_from_metadata(metadata: &Value) -> Option<NaiveDateTime> {
    TIMESTAMP_KEYS.iter().find_map(|key| {
        let value = metadata.get(*key)?.as_str()?;
        parse_timestamp(value)
    })
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS.iter().find_map(|fmt| {
        if *fmt == FRACTION_FORMAT && !has_microsecond_fraction(value) {
            None
        } else if fmt.ends_with("%z") {
            // Keep the wall-clock time as written, without converting offsets
            DateTime::parse_from_str(value, fmt).ok().map(|dt| dt.naive_local())
        } else {
            NaiveDateTime::parse_from_str(value, fmt).ok()
        }
    })
}

/// chrono's `%.f` also takes a missing dot or up to nine digits; only a dot
/// followed by one to six digits is accepted.
fn has_microsecond_fraction(value: &str) -> bool {
    let Some((_, digits)) = value.strip_suffix('Z').and_then(|body| body.rsplit_once('.')) else {
        return false;
    };
    (1..=6).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Modification time of `path` in local time.
pub fn file_mtime(path: &Path) -> Result<NaiveDateTime> {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .with_context(|| format!("Failed to read modification time of {}", path.display()))?;
    Ok(DateTime::<Local>::from(modified).naive_local())
}
