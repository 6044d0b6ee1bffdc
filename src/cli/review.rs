//! Review command - collect evidence, get the verdict, publish everything
//!
//! The pipeline is strictly sequential: credentials, evidence, one model
//! round trip, then publication. Credential problems surface before
//! anything is written. Once a verdict exists, publication steps are
//! best-effort: a failed artifact write becomes a warning, not a lost
//! review.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::config;
use crate::evidence;
use crate::github::GithubContext;
use crate::models::{KarenReview, ReviewMode};
use crate::prompt::{self, RepoFacts};
use crate::publish;
use crate::review::{parse_review, select_backend, ClientConfig, LlmBackend, ReviewClient};

/// Settings assembled from CLI flags and action inputs
pub struct ReviewArgs {
    pub path: Option<PathBuf>,
    pub provider: Option<LlmBackend>,
    pub mode: ReviewMode,
    pub model: Option<String>,
    pub post_comment: bool,
    pub no_badge: bool,
    pub update_readme: bool,
    pub min_score: u32,
}

/// Artifacts that actually landed on disk, for action outputs
#[derive(Default)]
struct PublishedPaths {
    review: Option<PathBuf>,
    badge: Option<PathBuf>,
}

fn create_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap()
}

fn start_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(create_spinner_style());
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Resolve the workspace root: explicit path, then $GITHUB_WORKSPACE, then
/// the current directory.
fn resolve_workspace(path: Option<PathBuf>) -> Result<PathBuf> {
    let raw = path
        .or_else(|| {
            env::var("GITHUB_WORKSPACE")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from("."));

    let workspace = raw
        .canonicalize()
        .with_context(|| format!("Repository path does not exist: {}", raw.display()))?;
    if !workspace.is_dir() {
        anyhow::bail!("Path is not a directory: {}", workspace.display());
    }
    Ok(workspace)
}

/// Repo name for prompts and reports: owner/name from the Actions
/// environment wins, then the workspace directory name.
fn resolve_repo_name(ctx: &GithubContext, workspace: &Path) -> String {
    ctx.repo_name()
        .or_else(|| {
            workspace
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Run the review command
pub fn run(mut args: ReviewArgs) -> Result<()> {
    let start_time = Instant::now();

    // Credentials are validated before anything touches the filesystem,
    // so a key typo never leaves a half-published .karen/ behind.
    let (backend, api_key) = select_backend(args.provider)?;

    let mut client_config = ClientConfig::new(backend);
    if let Some(model) = args.model.take().filter(|m| !m.is_empty()) {
        client_config.model = Some(model);
    }

    let workspace = resolve_workspace(args.path.take())?;
    let ctx = GithubContext::from_env();
    let repo_name = resolve_repo_name(&ctx, &workspace);

    println!("\n{}", style("Karen Review").bold());
    println!("{}", style("──────────────────────────────────────").dim());
    println!(
        "Repository: {}  Reviewer: {} ({})",
        style(&repo_name).cyan(),
        style(backend).cyan(),
        client_config.model(),
    );
    if args.mode != ReviewMode::Full {
        println!("Mode:       {}", style(args.mode).yellow());
    }
    println!();

    let config = config::load_config(&workspace);

    let karen_dir = publish::karen_dir(&workspace);
    fs::create_dir_all(&karen_dir)
        .with_context(|| format!("Failed to create {}", karen_dir.display()))?;

    let previous_total = publish::load_previous_total(&karen_dir);

    // Phase 1: Collect evidence
    let spinner = start_spinner("Collecting evidence...".to_string());
    let evidence = evidence::collect(&workspace, &config)?;
    let mut sampled = format!(
        "{}Sampled {} of {} source files",
        style("✓ ").green(),
        style(evidence.stats.sampled_files).cyan(),
        evidence.stats.total_files,
    );
    if evidence.stats.truncated {
        sampled.push_str(" (sample budget hit)");
    }
    spinner.finish_with_message(sampled);

    if evidence.stats.sampled_files == 0 && evidence.readme.is_none() && evidence.manifest.is_none()
    {
        println!(
            "\n{}Nothing reviewable found. Karen will judge the emptiness itself.",
            style("⚠️  ").yellow()
        );
    }

    // Phase 2: One model round trip
    let facts = RepoFacts {
        name: repo_name.clone(),
        description: ctx.repo_description.clone(),
        mode: args.mode,
    };
    let user_prompt = prompt::build_review_prompt(&facts, &evidence, &config);
    debug!(prompt_bytes = user_prompt.len(), "review prompt built");

    let client = ReviewClient::new(client_config, api_key);
    let spinner = start_spinner(format!("Asking {} for the verdict...", client.model()));
    let raw = client.generate(prompt::KAREN_SYSTEM_PROMPT, &user_prompt)?;
    let review = parse_review(&raw)?;
    spinner.finish_with_message(format!(
        "{}Verdict received from {}",
        style("✓ ").green(),
        style(client.model()).cyan(),
    ));

    print_verdict(&review, previous_total);

    // Phase 3: Publish artifacts (best-effort past this point)
    let published = publish_artifacts(
        &args,
        &ctx,
        &karen_dir,
        &workspace,
        &review,
        &repo_name,
        previous_total,
    );

    ctx.set_output("karen_score", &review.score.total.to_string());
    ctx.set_output("karen_grade", &review.score.grade);
    if let Some(path) = &published.review {
        ctx.set_output("review_path", &path.display().to_string());
    }
    if let Some(path) = &published.badge {
        ctx.set_output("badge_path", &path.display().to_string());
    }

    if args.min_score > 0 && review.score.total < args.min_score {
        ctx.warn(&format!(
            "Score {}/100 is below the minimum of {}. {}",
            review.score.total, args.min_score, review.bottom_line
        ));
    }

    let elapsed = start_time.elapsed();
    println!(
        "\n{}Review complete in {:.2}s",
        style("✨ ").bold(),
        elapsed.as_secs_f64()
    );

    Ok(())
}

fn print_verdict(review: &KarenReview, previous_total: Option<u32>) {
    let grade_colored = match review.score.total {
        90..=u32::MAX => style(review.score.grade.as_str()).green().bold(),
        75..=89 => style(review.score.grade.as_str()).cyan().bold(),
        60..=74 => style(review.score.grade.as_str()).yellow().bold(),
        _ => style(review.score.grade.as_str()).red().bold(),
    };

    let delta = match previous_total {
        Some(prev) if review.score.total != prev => {
            let diff = review.score.total as i64 - prev as i64;
            format!("  ({diff:+} since last review)")
        }
        _ => String::new(),
    };

    println!(
        "\nScore: {}  Grade: {}{}",
        style(format!("{}/100", review.score.total)).bold(),
        grade_colored,
        delta,
    );

    if !review.score.breakdown.is_empty() {
        for (category, points) in &review.score.breakdown {
            println!("  {}  {}", style(format!("{points:>3}")).bold(), category);
        }
    }

    println!("\n{}", review.summary);
    if !review.bottom_line.is_empty() {
        println!("\n{} {}", style("Bottom line:").bold(), review.bottom_line);
    }
}

/// Run one publication step, downgrading failure to a workflow warning.
fn publish_step<T>(ctx: &GithubContext, what: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            ctx.warn(&format!("{what}: {e:#}"));
            None
        }
    }
}

fn publish_artifacts(
    args: &ReviewArgs,
    ctx: &GithubContext,
    karen_dir: &Path,
    workspace: &Path,
    review: &KarenReview,
    repo_name: &str,
    previous_total: Option<u32>,
) -> PublishedPaths {
    let mut published = PublishedPaths::default();

    publish_step(
        ctx,
        "Failed to write score.json",
        publish::write_score(karen_dir, &review.score),
    );

    let report_md = publish::render_review(review, repo_name);
    published.review = publish_step(
        ctx,
        "Failed to write review.md",
        publish::write_report(karen_dir, &report_md),
    );

    publish_step(
        ctx,
        "Failed to append history",
        publish::append_history(karen_dir, &report_md, Utc::now()),
    );

    if args.no_badge {
        if args.update_readme {
            ctx.warn("--update-readme has no effect with --no-badge");
        }
    } else {
        published.badge = publish_step(
            ctx,
            "Failed to write badge",
            publish::write_badge(karen_dir, review.score.total, &review.score.grade),
        );

        if args.update_readme {
            let readme_path = workspace.join("README.md");
            let updated = publish_step(
                ctx,
                "Failed to update README",
                publish::update_readme(&readme_path, publish::BADGE_MARKDOWN)
                    .map_err(anyhow::Error::from),
            );
            match updated {
                Some(true) => println!(
                    "{}Refreshed the badge block in README.md",
                    style("✓ ").green()
                ),
                Some(false) => debug!("README badge block already current"),
                None => {}
            }
        }
    }

    if args.post_comment {
        post_comment(ctx, review, repo_name, previous_total);
    }

    published
}

fn post_comment(
    ctx: &GithubContext,
    review: &KarenReview,
    repo_name: &str,
    previous_total: Option<u32>,
) {
    let Some(pr) = ctx.pull_request else {
        ctx.warn("--post-comment requested but this is not a pull request event; skipping");
        return;
    };
    if ctx.token.is_none() {
        ctx.warn("--post-comment requested but no GitHub token is available; set GITHUB_TOKEN");
        return;
    }

    let body = publish::render_pr_comment(review, repo_name, previous_total);
    if publish_step(
        ctx,
        "Failed to post PR comment",
        ctx.post_pr_comment(&body),
    )
    .is_some()
    {
        println!("{}Posted review comment on PR #{}", style("✓ ").green(), pr);
    }
}
