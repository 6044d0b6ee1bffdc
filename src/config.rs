//! Per-repository configuration support
//!
//! Loads configuration from `.karen/config.yml` in the repository under
//! review. Keys merge shallowly over the defaults: a key the user sets
//! replaces the default value wholesale (including the whole `weights`
//! table), a key the user omits keeps its default.
//!
//! # Configuration Format
//!
//! ```yaml
//! # .karen/config.yml
//!
//! weights:
//!   code_quality: 30
//!   completeness: 25
//!   testing: 20
//!   documentation: 15
//!   honesty: 10
//!
//! ignore:
//!   - "**/node_modules/**"
//!   - "**/generated/**"
//!
//! max_file_bytes: 8192
//! max_total_bytes: 262144
//! max_files: 50
//! max_readme_bytes: 16384
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

/// Built-in ignore patterns for vendored, generated, and dependency code.
/// Setting `ignore` in config replaces this list entirely.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "**/node_modules/**",
    "**/target/**",
    "**/dist/**",
    "**/build/**",
    "**/vendor/**",
    "**/third_party/**",
    "**/*.min.js",
    "**/*.min.css",
    "**/*.bundle.js",
    "**/*.lock",
];

/// Review configuration loaded from `.karen/config.yml`
#[derive(Debug, Clone, Deserialize)]
pub struct KarenConfig {
    /// Category name -> maximum points. Forwarded to the model as the
    /// scoring rubric; the total is expected to be out of 100.
    #[serde(default = "default_weights")]
    pub weights: BTreeMap<String, u32>,

    /// Glob patterns for paths to skip during evidence collection
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Maximum bytes sampled from a single file
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Maximum bytes sampled across all files
    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: u64,

    /// Maximum number of files sampled
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Maximum bytes kept from the README and the manifest
    #[serde(default = "default_max_readme_bytes")]
    pub max_readme_bytes: u64,
}

impl Default for KarenConfig {
    fn default() -> Self {
        Self {
            weights: default_weights(),
            ignore: default_ignore(),
            max_file_bytes: default_max_file_bytes(),
            max_total_bytes: default_max_total_bytes(),
            max_files: default_max_files(),
            max_readme_bytes: default_max_readme_bytes(),
        }
    }
}

fn default_weights() -> BTreeMap<String, u32> {
    let mut weights = BTreeMap::new();
    weights.insert("code_quality".to_string(), 30);
    weights.insert("completeness".to_string(), 25);
    weights.insert("testing".to_string(), 20);
    weights.insert("documentation".to_string(), 15);
    weights.insert("honesty".to_string(), 10);
    weights
}

fn default_ignore() -> Vec<String> {
    DEFAULT_IGNORE_PATTERNS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_file_bytes() -> u64 {
    8 * 1024
}

fn default_max_total_bytes() -> u64 {
    256 * 1024
}

fn default_max_files() -> usize {
    50
}

fn default_max_readme_bytes() -> u64 {
    16 * 1024
}

impl KarenConfig {
    /// Check if a repo-relative path matches any ignore pattern.
    /// Applied before any file content is read.
    pub fn should_ignore(&self, rel_path: &Path) -> bool {
        let path_str = rel_path.to_string_lossy();
        self.ignore.iter().any(|p| glob_match(p, &path_str))
    }
}

/// Load configuration from `<repo>/.karen/config.yml`.
///
/// Returns defaults when the file is absent. A file that exists but fails
/// to parse logs a warning and also falls back to defaults; a broken
/// config never aborts a review.
pub fn load_config(repo_path: &Path) -> KarenConfig {
    for name in &["config.yml", "config.yaml"] {
        let config_path = repo_path.join(".karen").join(name);
        if !config_path.exists() {
            continue;
        }
        match load_yaml_config(&config_path) {
            Ok(config) => {
                debug!("Loaded review config from {}", config_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", config_path.display(), e);
                return KarenConfig::default();
            }
        }
    }

    debug!("No .karen/config.yml found, using defaults");
    KarenConfig::default()
}

fn load_yaml_config(path: &Path) -> anyhow::Result<KarenConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: KarenConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Simple glob pattern matching for ignore rules
pub fn glob_match(pattern: &str, path: &str) -> bool {
    // **/X/** matches when X appears as a directory anywhere in the path
    if pattern.starts_with("**/") && pattern.ends_with("/**") {
        let middle = pattern.trim_start_matches("**/").trim_end_matches("/**");
        return path.contains(&format!("/{}/", middle))
            || path.starts_with(&format!("{}/", middle));
    }

    // **<suffix> / <prefix>**<suffix>
    if pattern.contains("**") {
        let parts: Vec<&str> = pattern.split("**").collect();
        if parts.len() == 2 {
            let prefix = parts[0].trim_end_matches('/');
            let suffix = parts[1].trim_start_matches('/');

            if !prefix.is_empty() && !path.starts_with(prefix) {
                return false;
            }

            // Suffix may carry its own * (e.g. **/*.min.js)
            if !suffix.is_empty() && !suffix.contains('*') && !path.ends_with(suffix) {
                return false;
            }
            if !suffix.is_empty() && suffix.contains('*') {
                let star_parts: Vec<&str> = suffix.split('*').collect();
                if star_parts.len() == 2 {
                    let before = star_parts[0];
                    let after = star_parts[1];
                    let matches = if before.is_empty() {
                        path.ends_with(after)
                    } else {
                        path.contains(before) && path.ends_with(after)
                    };
                    if !matches {
                        return false;
                    }
                }
            }

            return true;
        }
    }

    // Single * within a segment
    if pattern.contains('*') {
        let parts: Vec<&str> = pattern.split('*').collect();
        if parts.len() == 2 {
            return path.starts_with(parts[0]) && path.ends_with(parts[1]);
        }
    }

    // Exact or directory-prefix match: "vendor/" matches "vendor/lib.py",
    // not "src/vendor/lib.py". Use "**/vendor/**" for recursive matching.
    path.starts_with(pattern) || path == pattern
}
