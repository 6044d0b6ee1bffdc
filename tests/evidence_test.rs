//! Integration tests for evidence collection
//!
//! These tests build synthetic repositories in temp directories and verify:
//! - Sampling stays inside the configured budgets, even when lossy
//!   decoding inflates non-UTF-8 content
//! - Ignore globs and .gitignore rules are honored
//! - README and manifest are captured outside the sample set
//! - Identical filesystem states produce identical evidence
//!
//! Each test uses its own isolated temp directory.

use std::path::Path;

use karen::config::KarenConfig;
use karen::evidence;

/// Write a file under `root`, creating parent directories as needed
fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    std::fs::write(&path, contents).expect("Failed to write fixture file");
}

/// A small mixed-language repository with a README and a manifest
fn small_repo() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write_file(
        dir.path(),
        "src/main.rs",
        "fn main() {\n    println!(\"hello\");\n}\n",
    );
    write_file(
        dir.path(),
        "scripts/report.py",
        "def report():\n    return 42\n",
    );
    write_file(dir.path(), "README.md", "# Fixture\n\nA tiny repo.\n");
    write_file(
        dir.path(),
        "Cargo.toml",
        "[package]\nname = \"fixture\"\nversion = \"0.1.0\"\n",
    );
    dir
}

// ============================================================================
// Test: Basic Collection
// ============================================================================

#[test]
fn test_collect_samples_source_files() {
    let repo = small_repo();
    let config = KarenConfig::default();

    let evidence = evidence::collect(repo.path(), &config).expect("collection should succeed");

    assert_eq!(
        evidence.stats.total_files, 2,
        "Should count exactly the two source files"
    );
    assert_eq!(evidence.stats.sampled_files, 2);
    assert!(
        !evidence.stats.truncated,
        "A tiny repo never hits a budget"
    );

    let languages: Vec<&str> = evidence
        .stats
        .languages
        .keys()
        .map(|s| s.as_str())
        .collect();
    assert_eq!(languages, vec!["Python", "Rust"]);

    let readme = evidence.readme.expect("README should be captured");
    assert!(readme.contains("A tiny repo"));

    let manifest = evidence.manifest.expect("Manifest should be captured");
    assert_eq!(manifest.path, Path::new("Cargo.toml"));
    assert!(manifest.contents.contains("name = \"fixture\""));
}

#[test]
fn test_readme_and_manifest_are_not_samples() {
    let repo = small_repo();
    let config = KarenConfig::default();

    let evidence = evidence::collect(repo.path(), &config).unwrap();

    for sample in &evidence.files {
        let name = sample.path.file_name().unwrap().to_string_lossy();
        assert_ne!(name, "README.md", "README belongs in its own section");
        assert_ne!(name, "Cargo.toml", "Manifest belongs in its own section");
    }
}

// ============================================================================
// Test: Budgets
// ============================================================================

#[test]
fn test_sample_budgets_are_never_exceeded() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    // 80 files of 16 KiB each: over the file cap, the per-file cap, and
    // the total budget all at once.
    let line = "let filler = \"xxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx\";\n";
    let body = line.repeat(16 * 1024 / line.len() + 1);
    for i in 0..80 {
        write_file(dir.path(), &format!("src/module_{i:02}.rs"), &body);
    }
    // One Latin-1 style file. Lossy decoding turns each of its bytes into
    // a three-byte replacement character, and the stored excerpt must
    // still fit the caps.
    std::fs::write(dir.path().join("src/latin1.rs"), vec![0xFF_u8; 16 * 1024])
        .expect("Failed to write fixture file");

    let config = KarenConfig::default();
    let evidence = evidence::collect(dir.path(), &config).unwrap();

    assert_eq!(evidence.stats.total_files, 81);
    assert!(
        !evidence.files.is_empty(),
        "An oversized repo still yields evidence"
    );
    assert!(
        evidence.files.len() <= config.max_files,
        "Sampled {} files, cap is {}",
        evidence.files.len(),
        config.max_files
    );

    let total_sampled: u64 = evidence.files.iter().map(|f| f.excerpt.len() as u64).sum();
    assert!(
        total_sampled <= config.max_total_bytes,
        "Sampled {} bytes, budget is {}",
        total_sampled,
        config.max_total_bytes
    );
    for sample in &evidence.files {
        assert!(
            sample.excerpt.len() as u64 <= config.max_file_bytes,
            "{} excerpt is {} bytes, per-file cap is {}",
            sample.path.display(),
            sample.excerpt.len(),
            config.max_file_bytes
        );
    }

    assert!(
        evidence.stats.truncated,
        "Budget-capped collection must report truncation"
    );
}

#[test]
fn test_truncated_stays_false_under_budget() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for i in 0..5 {
        write_file(dir.path(), &format!("f{i}.py"), "print('ok')\n");
    }

    let evidence = evidence::collect(dir.path(), &KarenConfig::default()).unwrap();
    assert!(!evidence.stats.truncated);
    assert_eq!(evidence.stats.sampled_files, 5);
}

#[test]
fn test_half_read_non_utf8_file_reports_truncation() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("legacy.rs"), vec![0xFF_u8; 1024]).unwrap();

    let config = KarenConfig {
        max_file_bytes: 512,
        ..KarenConfig::default()
    };
    let evidence = evidence::collect(dir.path(), &config).unwrap();

    assert_eq!(evidence.stats.sampled_files, 1);
    assert!(
        evidence.files[0].excerpt.len() as u64 <= config.max_file_bytes,
        "Excerpt is {} bytes, per-file cap is {}",
        evidence.files[0].excerpt.len(),
        config.max_file_bytes
    );
    assert!(
        evidence.stats.truncated,
        "Half of the file was never read; the evidence is partial"
    );
}

#[test]
fn test_fully_read_file_clipped_by_decode_reports_truncation() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    // The whole 300-byte file is read in one pass, but its decoded form
    // outgrows the cap and has to be cut.
    std::fs::write(dir.path().join("legacy.rs"), vec![0xFF_u8; 300]).unwrap();

    let config = KarenConfig {
        max_file_bytes: 512,
        ..KarenConfig::default()
    };
    let evidence = evidence::collect(dir.path(), &config).unwrap();

    assert_eq!(evidence.files.len(), 1);
    assert!(evidence.files[0].excerpt.len() as u64 <= config.max_file_bytes);
    assert!(
        evidence.stats.truncated,
        "The excerpt does not cover the whole file"
    );
}

#[test]
fn test_readme_cap_holds_for_non_utf8_content() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("README.md"), vec![0xFF_u8; 1024]).unwrap();
    write_file(dir.path(), "src/lib.rs", "pub fn answer() -> u32 { 42 }\n");

    let config = KarenConfig {
        max_readme_bytes: 256,
        ..KarenConfig::default()
    };
    let evidence = evidence::collect(dir.path(), &config).unwrap();

    let readme = evidence.readme.expect("README should be captured");
    assert!(
        readme.len() as u64 <= config.max_readme_bytes,
        "README excerpt is {} bytes, cap is {}",
        readme.len(),
        config.max_readme_bytes
    );
}

// ============================================================================
// Test: Ignore Rules
// ============================================================================

#[test]
fn test_default_ignore_globs_apply() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write_file(dir.path(), "src/app.js", "console.log('app');\n");
    write_file(
        dir.path(),
        "node_modules/dep/index.js",
        "module.exports = {};\n",
    );
    write_file(dir.path(), "assets/site.min.js", "var a=1;\n");

    let evidence = evidence::collect(dir.path(), &KarenConfig::default()).unwrap();

    let paths: Vec<String> = evidence
        .files
        .iter()
        .map(|f| f.path.to_string_lossy().into_owned())
        .collect();
    assert!(
        paths.iter().any(|p| p.ends_with("app.js")),
        "Real source should be sampled. Got: {:?}",
        paths
    );
    assert!(
        !paths.iter().any(|p| p.contains("node_modules")),
        "node_modules must be ignored. Got: {:?}",
        paths
    );
    assert!(
        !paths.iter().any(|p| p.ends_with(".min.js")),
        "Minified bundles must be ignored. Got: {:?}",
        paths
    );

    // Ignored paths do not even count toward stats
    assert_eq!(evidence.stats.total_files, 1);
}

#[test]
fn test_gitignore_is_respected_without_git_dir() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write_file(dir.path(), ".gitignore", "generated.py\n");
    write_file(dir.path(), "generated.py", "# machine output\n");
    write_file(dir.path(), "kept.py", "print('kept')\n");

    let evidence = evidence::collect(dir.path(), &KarenConfig::default()).unwrap();

    let paths: Vec<String> = evidence
        .files
        .iter()
        .map(|f| f.path.to_string_lossy().into_owned())
        .collect();
    assert_eq!(paths, vec!["kept.py".to_string()], "Got: {:?}", paths);
}

// ============================================================================
// Test: Determinism
// ============================================================================

#[test]
fn test_collection_is_deterministic() {
    let repo = small_repo();
    let config = KarenConfig::default();

    let first = evidence::collect(repo.path(), &config).unwrap();
    let second = evidence::collect(repo.path(), &config).unwrap();

    let first_json = serde_json::to_string(&first).unwrap();
    let second_json = serde_json::to_string(&second).unwrap();
    assert_eq!(
        first_json, second_json,
        "Same filesystem state must yield identical evidence"
    );
}

// ============================================================================
// Test: Binary Content
// ============================================================================

#[test]
fn test_binary_files_are_counted_but_not_sampled() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("blob.rs"), b"fn main\0\0binary\0").unwrap();
    write_file(dir.path(), "real.rs", "fn main() {}\n");

    let evidence = evidence::collect(dir.path(), &KarenConfig::default()).unwrap();

    assert_eq!(
        evidence.stats.total_files, 2,
        "Binary files still count toward repository stats"
    );
    assert_eq!(evidence.stats.sampled_files, 1);
    assert_eq!(evidence.files.len(), 1);
    assert_eq!(evidence.files[0].path, Path::new("real.rs"));
}
