//! Artifact publication under `.karen/`
//!
//! Layout:
//! - `score.json` - the normalized score, overwritten every run
//! - `review.md` - the full review, overwritten every run
//! - `history/<YYYY-MM-DDTHH-MM>.md` - append-only copies of review.md
//! - `badges/score-badge.svg` - regenerated every run
//!
//! Steps run in a fixed order and are isolated from each other: a
//! failing step is reported and the run moves on, so a bad README merge
//! never costs the score file. Nothing here rolls back.

mod badge;
mod markdown;
mod readme;

pub use badge::{render_badge, score_color};
pub use markdown::{render_pr_comment, render_review};
pub use readme::{
    merge_badge_block, update_readme, MergeError, ReadmeUpdateError, BADGE_MARKER_END,
    BADGE_MARKER_START,
};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::models::KarenScore;

/// Badge reference inserted into the README, relative to the repo root
pub const BADGE_MARKDOWN: &str = "![Karen Score](.karen/badges/score-badge.svg)";

/// The artifact root for a workspace
pub fn karen_dir(workspace: &Path) -> PathBuf {
    workspace.join(".karen")
}

/// Previous run's total from `score.json`, if one is readable.
///
/// A malformed or unreadable score file is worth a warning, not an
/// abort: the only casualty is the delta in the PR comment.
pub fn load_previous_total(karen_dir: &Path) -> Option<u32> {
    #[derive(Deserialize)]
    struct PreviousScore {
        total: u32,
    }

    let path = karen_dir.join("score.json");
    if !path.is_file() {
        return None;
    }

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<PreviousScore>(&contents) {
        Ok(score) => Some(score.total),
        Err(e) => {
            warn!("Ignoring malformed {}: {}", path.display(), e);
            None
        }
    }
}

/// Write `score.json` (pretty-printed, overwrite)
pub fn write_score(karen_dir: &Path, score: &KarenScore) -> Result<PathBuf> {
    let path = karen_dir.join("score.json");
    let json = serde_json::to_string_pretty(score)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Write `review.md` (overwrite)
pub fn write_report(karen_dir: &Path, markdown: &str) -> Result<PathBuf> {
    let path = karen_dir.join("review.md");
    fs::write(&path, markdown).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Append a history entry named after the current UTC minute.
///
/// Create-only: a rerun within the same minute finds the file already
/// present and leaves it untouched, returning `Ok(None)`. History
/// entries are never rewritten once created.
pub fn append_history(
    karen_dir: &Path,
    markdown: &str,
    now: DateTime<Utc>,
) -> Result<Option<PathBuf>> {
    let history_dir = karen_dir.join("history");
    fs::create_dir_all(&history_dir)
        .with_context(|| format!("Failed to create {}", history_dir.display()))?;

    // Colon-free so the name is valid on every filesystem CI runs on
    let path = history_dir.join(format!("{}.md", now.format("%Y-%m-%dT%H-%M")));
    match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
    {
        Ok(mut file) => {
            file.write_all(markdown.as_bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(Some(path))
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            debug!(
                "History entry {} already exists, leaving it as-is",
                path.display()
            );
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to create {}", path.display())),
    }
}

/// Render and write `badges/score-badge.svg` (overwrite)
pub fn write_badge(karen_dir: &Path, total: u32, grade: &str) -> Result<PathBuf> {
    let badges_dir = karen_dir.join("badges");
    fs::create_dir_all(&badges_dir)
        .with_context(|| format!("Failed to create {}", badges_dir.display()))?;

    let path = badges_dir.join("score-badge.svg");
    fs::write(&path, render_badge(total, grade))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
