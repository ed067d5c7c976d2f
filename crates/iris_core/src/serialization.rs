//! Stable JSON documents on disk
//!
//! Every persisted document (artifact, metrics, mapping) goes through
//! `serde_json::Value` before formatting. This workspace does not enable
//! serde_json's `preserve_order`, so `Value` objects are `BTreeMap`-backed and
//! struct fields, `HashMap`s and integer-keyed maps all come out key-sorted.
//! That sorted, two-space-indented text is what the artifact checksum covers.

use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Key-sorted, pretty-printed JSON for `value`.
pub fn canonical_json_string<T>(value: &T) -> Result<String, serde_json::Error>
where
    T: Serialize,
{
    serde_json::to_string_pretty(&serde_json::to_value(value)?)
}

/// BLAKE3 digest (hex) of a value's canonical JSON form.
pub fn canonical_hash_hex<T>(value: &T) -> Result<String, serde_json::Error>
where
    T: Serialize,
{
    let json = canonical_json_string(value)?;
    Ok(hex::encode(blake3::hash(json.as_bytes()).as_bytes()))
}

/// Write `contents` to `path` via a synced temp file in the same directory
/// renamed over the target. Creates missing parent directories.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut temp = NamedTempFile::new_in(&parent)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// Serialize to canonical JSON and write it atomically.
pub fn write_canonical_json_file<T>(path: &Path, value: &T) -> io::Result<()>
where
    T: Serialize,
{
    let mut json = canonical_json_string(value).map_err(io::Error::other)?;
    json.push('\n');
    write_atomic(path, json.as_bytes())
}
