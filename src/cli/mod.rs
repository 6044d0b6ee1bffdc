//! CLI command definitions and handlers

mod init;
mod review;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::models::ReviewMode;
use crate::review::LlmBackend;

/// Parse and validate a score threshold (0-100)
fn parse_min_score(s: &str) -> Result<u32, String> {
    let n: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n > 100 {
        Err("min-score cannot exceed 100".to_string())
    } else {
        Ok(n)
    }
}

/// Karen - Brutally honest AI code review
///
/// Bring your own API key. Your code goes to the model you picked and nowhere else.
#[derive(Parser, Debug)]
#[command(name = "karen")]
#[command(
    version,
    about = "Brutally honest AI code review: collects repository evidence, asks an LLM what it really thinks, and publishes the verdict",
    long_about = "Karen samples your repository (bounded, gitignore-aware), sends the evidence \
to Anthropic or OpenAI with a rubric, and publishes the verdict: a score file, \
a markdown report, an append-only history, an SVG badge, and optionally a README \
badge block and a PR comment.\n\n\
Bring your own API key: set ANTHROPIC_API_KEY or OPENAI_API_KEY.\n\n\
Run without a subcommand to review the current directory:\n  \
karen .",
    after_help = "\
Examples:
  karen .                              Review current directory
  karen review . --provider anthropic  Pin the provider instead of auto-detecting
  karen review . --mode brutal         No mercy
  karen review . --min-score 70        Warn when the score lands below 70
  karen init                           Scaffold .karen/config.yml

Documentation: https://github.com/karen-ci/karen"
)]
pub struct Cli {
    /// Path to repository (default: $GITHUB_WORKSPACE, then current directory)
    #[arg(global = true)]
    pub path: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a .karen/config.yml with example settings
    Init,

    /// Review the repository and publish the verdict
    #[command(after_help = "\
Examples:
  karen review .                                   Review current directory
  karen review /path/to/repo                       Review a specific repo
  karen review . --provider openai                 Use OpenAI even if both keys are set
  karen review . --mode gentle                     Kinder phrasing, same scores
  karen review . --model claude-opus-4-20250514    Override the provider default model
  karen review . --update-readme --post-comment    Full CI treatment
  karen review . --no-badge                        Skip the SVG badge

Every flag also reads its INPUT_* environment variable, so a GitHub Actions
step can pass inputs without building an argument list.")]
    Review {
        /// LLM provider: auto, anthropic, openai (auto requires exactly one key to be set)
        #[arg(long, env = "INPUT_PROVIDER", default_value = "auto", value_parser = ["auto", "anthropic", "claude", "openai", "gpt"])]
        provider: String,

        /// Review mode: full, brutal, gentle
        #[arg(long, env = "INPUT_MODE", default_value = "full", value_parser = ["full", "brutal", "gentle"])]
        mode: String,

        /// Model override (KAREN_MODEL works too; defaults per provider)
        #[arg(long, env = "INPUT_MODEL")]
        model: Option<String>,

        /// Post the review as a PR comment (needs GITHUB_TOKEN and a pull_request event)
        #[arg(long, env = "INPUT_POST_COMMENT")]
        post_comment: bool,

        /// Skip the SVG badge
        #[arg(long, env = "INPUT_NO_BADGE")]
        no_badge: bool,

        /// Merge the badge into README.md between karen markers
        #[arg(long, env = "INPUT_UPDATE_README")]
        update_readme: bool,

        /// Warn when the score lands below this threshold (0 disables; never fails the run)
        #[arg(long, env = "INPUT_MIN_SCORE", default_value = "0", value_parser = parse_min_score)]
        min_score: u32,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Init) => init::run(cli.path.as_deref()),

        Some(Commands::Review {
            provider,
            mode,
            model,
            post_comment,
            no_badge,
            update_readme,
            min_score,
        }) => {
            let provider = match provider.as_str() {
                "auto" => None,
                other => Some(LlmBackend::from_str(other)?),
            };
            let mode = ReviewMode::from_str(&mode)?;

            review::run(review::ReviewArgs {
                path: cli.path,
                provider,
                mode,
                model,
                post_comment,
                no_badge,
                update_readme,
                min_score,
            })
        }

        // Bare `karen` runs a default review, mirroring the CI entrypoint
        None => review::run(review::ReviewArgs {
            path: cli.path,
            provider: None,
            mode: ReviewMode::Full,
            model: None,
            post_comment: false,
            no_badge: false,
            update_readme: false,
            min_score: 0,
        }),
    }
}
