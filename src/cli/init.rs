//! Init command - scaffold a .karen directory with an example config

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

/// Run the init command
pub fn run(path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or_else(|| Path::new("."));
    let repo_path = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;

    if !repo_path.is_dir() {
        anyhow::bail!("Path is not a directory: {}", repo_path.display());
    }

    println!("\n{} Summoning Karen\n", style("🔥").bold());

    let karen_dir = repo_path.join(".karen");
    if karen_dir.exists() {
        println!(
            "{} Already initialized at {}",
            style("✓").green(),
            style(karen_dir.display()).cyan()
        );
    } else {
        std::fs::create_dir_all(&karen_dir)
            .with_context(|| "Failed to create .karen directory")?;
        println!(
            "{} Created {}",
            style("✓").green(),
            style(karen_dir.display()).cyan()
        );
    }

    let config_path = karen_dir.join("config.yml");
    if config_path.exists() {
        println!(
            "{} Keeping existing {}",
            style("✓").green(),
            style("config.yml").cyan()
        );
    } else {
        let default_config = r#"# Karen configuration
# Everything here is optional; omitted keys use these defaults.

# Rubric categories and their weights. Karen scores each category out
# of its weight, and the names appear verbatim in the review.
weights:
  code_quality: 30
  completeness: 25
  testing: 20
  documentation: 15
  honesty: 10

# Glob patterns excluded from evidence, on top of .gitignore.
ignore:
  - "**/node_modules/**"
  - "**/target/**"
  - "**/dist/**"
  - "**/*.min.js"
  - "**/*.lock"

# Evidence budgets. Karen reads at most this much of your repository.
max_file_bytes: 8192      # per-file excerpt cap
max_total_bytes: 262144   # total excerpt budget
max_files: 50             # sampled file cap
max_readme_bytes: 16384   # README / manifest cap
"#;
        std::fs::write(&config_path, default_config)
            .with_context(|| "Failed to create config file")?;
        println!(
            "{} Created {}",
            style("✓").green(),
            style("config.yml").cyan()
        );
    }

    // .karen/ stays out of .gitignore: the badge and history are meant
    // to be committed so README links keep working.
    println!("\n{} Karen is ready to judge.", style("✨").bold());
    println!("\nNext steps:");
    println!(
        "  {} Export a key",
        style("export ANTHROPIC_API_KEY=sk-ant-...").cyan()
    );
    println!("  {} Get reviewed", style("karen review .").cyan());
    println!(
        "  {} Badge your README",
        style("karen review . --update-readme").cyan()
    );

    Ok(())
}
