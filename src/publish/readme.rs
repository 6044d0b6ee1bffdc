//! Idempotent README badge merging
//!
//! The badge lives between two HTML comment markers so reruns update it
//! in place. The merge itself is a pure function over the README text;
//! the filesystem wrapper refuses to create a README that does not
//! exist and skips the write when nothing changed.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub const BADGE_MARKER_START: &str = "<!-- karen-badge-start -->";
pub const BADGE_MARKER_END: &str = "<!-- karen-badge-end -->";

/// A marker state the merge refuses to touch
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MergeError {
    #[error("found {found} without a matching {missing}; fix the markers by hand")]
    UnbalancedMarkers {
        found: &'static str,
        missing: &'static str,
    },
}

/// Errors from the on-disk README update
#[derive(Error, Debug)]
pub enum ReadmeUpdateError {
    #[error("README not found at {0}")]
    Missing(PathBuf),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Merge the badge block into README text.
///
/// - Both markers present: the first well-formed start..end span is
///   replaced, everything outside it untouched.
/// - One marker, or an end marker only before the start marker: refuse.
/// - No markers: insert a fresh block after a leading heading, else
///   before the first non-blank line, else at the top.
///
/// Merging the same badge twice is byte-stable: the replace branch
/// regenerates exactly the block the insert branch wrote.
pub fn merge_badge_block(original: &str, badge_markdown: &str) -> Result<String, MergeError> {
    let start_idx = original.find(BADGE_MARKER_START);
    // The end marker only counts when it closes the span the start opens
    let end_idx = match start_idx {
        Some(s) => {
            let search_from = s + BADGE_MARKER_START.len();
            original[search_from..]
                .find(BADGE_MARKER_END)
                .map(|rel| search_from + rel)
        }
        None => original.find(BADGE_MARKER_END),
    };

    match (start_idx, end_idx) {
        (Some(start), Some(end)) => {
            let mut merged = String::with_capacity(original.len() + badge_markdown.len());
            merged.push_str(&original[..start]);
            merged.push_str(BADGE_MARKER_START);
            merged.push('\n');
            merged.push_str(badge_markdown);
            merged.push('\n');
            merged.push_str(BADGE_MARKER_END);
            merged.push_str(&original[end + BADGE_MARKER_END.len()..]);
            Ok(merged)
        }
        (None, None) => Ok(insert_badge_block(original, badge_markdown)),
        (Some(_), None) => Err(MergeError::UnbalancedMarkers {
            found: BADGE_MARKER_START,
            missing: BADGE_MARKER_END,
        }),
        (None, Some(_)) => Err(MergeError::UnbalancedMarkers {
            found: BADGE_MARKER_END,
            missing: BADGE_MARKER_START,
        }),
    }
}

/// Insert a new marker block as a single line element, preserving the
/// rest of the file verbatim.
fn insert_badge_block(original: &str, badge_markdown: &str) -> String {
    let lines: Vec<&str> = original.split('\n').collect();

    let mut insert_index = 0;
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            insert_index = i + 1;
            break;
        }
        if !trimmed.is_empty() {
            insert_index = i;
            break;
        }
    }

    let block = format!("\n{BADGE_MARKER_START}\n{badge_markdown}\n{BADGE_MARKER_END}\n");
    let mut out: Vec<String> = lines.iter().map(|s| s.to_string()).collect();
    out.insert(insert_index, block);
    out.join("\n")
}

/// Merge the badge block into the README on disk.
///
/// Returns `Ok(true)` when the file was rewritten and `Ok(false)` when
/// the merge was a no-op. A missing README is an error, never created.
pub fn update_readme(readme_path: &Path, badge_markdown: &str) -> Result<bool, ReadmeUpdateError> {
    if !readme_path.is_file() {
        return Err(ReadmeUpdateError::Missing(readme_path.to_path_buf()));
    }

    let original = std::fs::read_to_string(readme_path)?;
    let merged = merge_badge_block(&original, badge_markdown)?;
    if merged == original {
        return Ok(false);
    }

    std::fs::write(readme_path, &merged)?;
    Ok(true)
}
