//! Directory import.
//!
//! Walks a folder, stores every supported text file as a note, and skips
//! anything it cannot decode with a per-file warning. Re-importing the same
//! folder is idempotent: files whose name and content are already stored are
//! skipped via a content hash.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::Config;
use crate::db;
use crate::store;

/// File extensions imported as notes.
pub const SUPPORTED_EXTS: &[&str] = &["txt", "md", "markdown", "rst", "log", "text"];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: u64,
    /// Files skipped because an identical note is already stored.
    pub skipped: u64,
    /// Files that matched but could not be read or decoded.
    pub failed: u64,
}

/// CLI entry point for `chestnut import <folder>`.
pub async fn run_import(config: &Config, folder: &Path) -> Result<()> {
    let pool = db::connect(config).await?;
    let report = import_folder(config, &pool, folder).await?;
    pool.close().await;

    if report.imported == 0 && report.skipped == 0 && report.failed == 0 {
        println!("No supported text files found.");
        return Ok(());
    }

    println!("import {}", folder.display());
    println!("  imported: {}", report.imported);
    println!("  skipped: {}", report.skipped);
    println!("  failed: {}", report.failed);
    Ok(())
}

/// Import every supported file under `folder`. Unreadable or empty files are
/// warned about and skipped; the walk always runs to completion.
pub async fn import_folder(
    config: &Config,
    pool: &SqlitePool,
    folder: &Path,
) -> Result<ImportReport> {
    if !folder.is_dir() {
        bail!("not a directory: {}", folder.display());
    }

    let include_set = supported_globset()?;

    let mut exclude_globs = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    exclude_globs.extend(config.import.exclude_globs.clone());
    let exclude_set = build_globset(&exclude_globs)?;

    // Collect first, then sort for deterministic import order.
    let mut paths = Vec::new();
    let walker = WalkDir::new(folder).follow_links(config.import.follow_symlinks);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                eprintln!("Warning: cannot access entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path().to_path_buf();
        let relative = path.strip_prefix(folder).unwrap_or(&path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        paths.push((path, rel_str));
    }
    paths.sort_by(|a, b| a.1.cmp(&b.1));

    let mut report = ImportReport::default();

    for (path, rel_str) in &paths {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Failed to import {}: {}", path.display(), e);
                report.failed += 1;
                continue;
            }
        };

        if content.trim().is_empty() {
            eprintln!("Failed to import {}: file is empty", path.display());
            report.failed += 1;
            continue;
        }

        let hash = dedup_hash(rel_str, &content);
        if store::find_by_hash(pool, &hash).await?.is_some() {
            report.skipped += 1;
            continue;
        }

        store::add_note(pool, rel_str, &content, &hash).await?;
        println!("Imported: {}", rel_str);
        report.imported += 1;
    }

    Ok(report)
}

pub fn dedup_hash(filename: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(filename.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn supported_globset() -> Result<GlobSet> {
    let patterns: Vec<String> = SUPPORTED_EXTS
        .iter()
        .map(|ext| format!("**/*.{}", ext))
        .collect();
    build_globset(&patterns)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
