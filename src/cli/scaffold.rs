//! `new`, `add` and `ls`: create entries, import assets, list what exists.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;

use crate::core::{ASSETS_DIR, ENTRY_FILE, Pointer};
use crate::logger::status_success;

/// Hex digits of the content hash kept in asset names.
const HASH_LEN: usize = 6;

/// Create `<docs>/<pointer>/entry.md` and its `assets/` directory.
pub fn new_entry(docs_root: &Path, pointer: &Pointer) -> Result<PathBuf> {
    let entry = pointer.entry_path(docs_root);
    if entry.exists() {
        bail!("entry already exists: {}", entry.display());
    }

    let assets = pointer.entry_dir(docs_root).join(ASSETS_DIR);
    fs::create_dir_all(&assets)
        .with_context(|| format!("Failed to create {}", assets.display()))?;

    fs::write(&entry, skeleton(pointer))
        .with_context(|| format!("Failed to write {}", entry.display()))?;

    status_success(&format!("created {}", entry.display()));
    Ok(entry)
}

fn skeleton(pointer: &Pointer) -> String {
    format!("---\ntitle: \"\"\ndate: \"{pointer}\"\n---\n\n")
}

/// Copy `file` into the entry's assets and return its markdown snippet.
pub fn add_asset(docs_root: &Path, pointer: &Pointer, file: &Path, today: NaiveDate) -> Result<String> {
    let bytes = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let entry_dir = pointer.entry_dir(docs_root);
    if !entry_dir.is_dir() {
        bail!("entry `{}` does not exist (run `new {}` first)", pointer, pointer);
    }

    let name = asset_name(&bytes, file, today);
    let assets = entry_dir.join(ASSETS_DIR);
    fs::create_dir_all(&assets)
        .with_context(|| format!("Failed to create {}", assets.display()))?;

    let target = assets.join(&name);
    fs::write(&target, &bytes)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    let label = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.clone());

    Ok(format!("![{label}](/docs/{pointer}/{ASSETS_DIR}/{name})"))
}

/// Names of the entries under `docs_root`, sorted.
///
/// A directory counts as an entry when it holds an `entry.md`. A missing
/// docs directory has no entries.
pub fn list_entries(docs_root: &Path) -> Result<Vec<String>> {
    if !docs_root.is_dir() {
        return Ok(Vec::new());
    }

    let dir = fs::read_dir(docs_root)
        .with_context(|| format!("Failed to read {}", docs_root.display()))?;

    let mut names = Vec::new();
    for item in dir {
        let item = item.with_context(|| format!("Failed to read {}", docs_root.display()))?;
        if item.path().join(ENTRY_FILE).is_file() {
            names.push(item.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// `<yymmdd><hash>.<ext>`, extension lowercased and kept only when present.
fn asset_name(bytes: &[u8], file: &Path, today: NaiveDate) -> String {
    let digest = hex::encode(blake3::hash(bytes).as_bytes());
    let stem = format!("{}{}", today.format("%y%m%d"), &digest[..HASH_LEN]);

    match file.extension() {
        Some(ext) => format!("{stem}.{}", ext.to_string_lossy().to_ascii_lowercase()),
        None => stem,
    }
}
