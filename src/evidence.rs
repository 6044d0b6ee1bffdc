//! Evidence collection for the review pipeline.
//!
//! Walks the repository once, respecting `.gitignore` and the configured
//! ignore globs, and samples a bounded amount of source text. Two
//! identical filesystem states always produce identical evidence: the
//! walk is sorted by file name and budgets are applied deterministically.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Result;
use ignore::WalkBuilder;
use serde::Serialize;
use tracing::debug;

use crate::config::KarenConfig;

/// Supported file extensions for sampling
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "py", "pyi", // Python
    "ts", "tsx", // TypeScript
    "js", "jsx", "mjs",  // JavaScript
    "rs",   // Rust
    "go",   // Go
    "java", // Java
    "c", "h", // C
    "cpp", "hpp", "cc", // C++
    "cs", // C#
    "kt", "kts",   // Kotlin
    "rb",    // Ruby
    "php",   // PHP
    "swift", // Swift
];

/// README file names probed in order; first hit wins
const README_CANDIDATES: &[&str] = &["README.md", "README", "readme.md"];

/// Manifest file names probed in order; first hit wins
const MANIFEST_CANDIDATES: &[&str] = &[
    "package.json",
    "Cargo.toml",
    "pyproject.toml",
    "go.mod",
    "pom.xml",
    "build.gradle",
    "Gemfile",
    "composer.json",
];

/// Get the language name for a file extension
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "py" | "pyi" => Some("Python"),
        "ts" | "tsx" => Some("TypeScript"),
        "js" | "jsx" | "mjs" => Some("JavaScript"),
        "rs" => Some("Rust"),
        "go" => Some("Go"),
        "java" => Some("Java"),
        "c" | "h" => Some("C"),
        "cpp" | "hpp" | "cc" => Some("C++"),
        "cs" => Some("C#"),
        "kt" | "kts" => Some("Kotlin"),
        "rb" => Some("Ruby"),
        "php" => Some("PHP"),
        "swift" => Some("Swift"),
        _ => None,
    }
}

/// A bounded excerpt of one source file
#[derive(Debug, Clone, Serialize)]
pub struct FileSample {
    /// Repo-relative path
    pub path: PathBuf,
    pub language: &'static str,
    pub excerpt: String,
    /// Full size on disk, which may exceed the excerpt
    pub size_bytes: u64,
}

/// Per-language aggregate counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct LanguageStats {
    pub files: usize,
    pub sampled_lines: usize,
}

/// Whole-repository aggregates, computed from metadata for every source
/// file seen, sampled or not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepoStats {
    pub languages: BTreeMap<String, LanguageStats>,
    pub total_files: usize,
    pub total_bytes: u64,
    pub sampled_files: usize,
    pub unreadable_files: usize,
    /// True when any sampling budget cut evidence short
    pub truncated: bool,
}

/// The project manifest, if one was found
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub path: PathBuf,
    pub contents: String,
}

/// Everything the prompt builder gets to see about the repository
#[derive(Debug, Clone, Serialize)]
pub struct RepoEvidence {
    pub files: Vec<FileSample>,
    pub stats: RepoStats,
    pub readme: Option<String>,
    pub manifest: Option<Manifest>,
}

/// Collect bounded evidence from the repository at `root`.
///
/// Individual files that cannot be read are counted and skipped; binary
/// files are skipped silently. Only a missing or non-directory root is
/// an error.
pub fn collect(root: &Path, config: &KarenConfig) -> Result<RepoEvidence> {
    anyhow::ensure!(
        root.is_dir(),
        "Repository path {} is not a directory",
        root.display()
    );

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut files = Vec::new();
    let mut stats = RepoStats::default();
    let mut budget = config.max_total_bytes;

    for entry in builder.build().flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let rel = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        // Ignore globs apply before any content is read
        if config.should_ignore(&rel) {
            continue;
        }

        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let Some(language) = language_for_extension(ext) else {
            continue;
        };

        let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
        stats.total_files += 1;
        stats.total_bytes += size_bytes;
        let lang = stats.languages.entry(language.to_string()).or_default();
        lang.files += 1;

        // Budgets exhausted: keep walking for stats, stop sampling
        if files.len() >= config.max_files || budget == 0 {
            stats.truncated = true;
            continue;
        }

        let cap = config.max_file_bytes.min(budget);
        match read_excerpt(path, cap) {
            Ok(Some(excerpt)) => {
                budget = budget.saturating_sub(excerpt.text.len() as u64);
                // Partial view: part of the file was never read, or the
                // decode cut dropped some of what was read
                if excerpt.bytes_read < size_bytes || excerpt.clipped {
                    stats.truncated = true;
                }
                lang.sampled_lines += excerpt.text.lines().count();
                stats.sampled_files += 1;
                files.push(FileSample {
                    path: rel,
                    language,
                    excerpt: excerpt.text,
                    size_bytes,
                });
            }
            Ok(None) => {
                debug!("Skipping binary file {}", rel.display());
            }
            Err(e) => {
                debug!("Skipping unreadable file {}: {}", rel.display(), e);
                stats.unreadable_files += 1;
            }
        }
    }

    let readme = probe_special(root, README_CANDIDATES, config.max_readme_bytes);
    let manifest = MANIFEST_CANDIDATES.iter().find_map(|name| {
        probe_special(root, &[name], config.max_readme_bytes).map(|contents| Manifest {
            path: PathBuf::from(name),
            contents,
        })
    });

    debug!(
        "Collected {} samples from {} source files ({} bytes on disk)",
        stats.sampled_files, stats.total_files, stats.total_bytes
    );

    Ok(RepoEvidence {
        files,
        stats,
        readme,
        manifest,
    })
}

/// A bounded read: the text to store plus how much of the file it covers
struct CappedRead {
    text: String,
    /// Raw bytes consumed from the file, before decoding
    bytes_read: u64,
    /// True when cutting the decoded text back to `cap` dropped content
    clipped: bool,
}

/// Read at most `cap` raw bytes. Returns `Ok(None)` for binary content.
///
/// Lossy decoding inflates each invalid byte into a three-byte
/// replacement character, so the decoded text is cut back to a char
/// boundary at or below `cap`; an excerpt never exceeds the budget
/// that was charged for it.
fn read_excerpt(path: &Path, cap: u64) -> std::io::Result<Option<CappedRead>> {
    let file = File::open(path)?;
    let mut buf = Vec::new();
    file.take(cap).read_to_end(&mut buf)?;
    if buf.contains(&0) {
        return Ok(None);
    }

    let bytes_read = buf.len() as u64;
    let mut text = String::from_utf8_lossy(&buf).into_owned();
    let mut clipped = false;
    if text.len() as u64 > cap {
        let mut end = cap as usize;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
        clipped = true;
    }
    Ok(Some(CappedRead {
        text,
        bytes_read,
        clipped,
    }))
}

/// Probe candidate file names at the repo root, returning the first
/// readable text hit capped to `cap` bytes.
fn probe_special(root: &Path, candidates: &[&str], cap: u64) -> Option<String> {
    for name in candidates {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        match read_excerpt(&path, cap) {
            Ok(Some(excerpt)) => return Some(excerpt.text),
            Ok(None) => continue,
            Err(e) => {
                debug!("Skipping unreadable {}: {}", path.display(), e);
                continue;
            }
        }
    }
    None
}
