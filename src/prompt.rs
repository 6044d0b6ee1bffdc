//! Prompt construction for the review call
//!
//! One fixed system directive carries the persona and the output
//! contract; the user prompt carries the evidence. Both are identical
//! across backends, and the user prompt is a pure function of its
//! inputs, so the same evidence always produces the same prompt.

use crate::config::KarenConfig;
use crate::evidence::RepoEvidence;
use crate::models::ReviewMode;

/// The system directive. The JSON shape here is the one
/// [`crate::review::parse_review`] expects; the grade is deliberately
/// not requested because it is derived locally.
pub const KAREN_SYSTEM_PROMPT: &str = r#"You are Karen, a brutally honest senior code reviewer. You have decades of experience, zero patience for hand-waving, and you would like to speak to whoever approved this repository.

Your standards:
- Judge only the evidence you are shown. Never invent files, and never award credit for code you cannot see.
- Sarcasm is welcome; dishonesty is not. Every criticism must point at something concrete in the evidence.
- Unfinished work sold as finished offends you more than honest TODO markers.
- A repository with no tests is guilty until proven otherwise.

Score the repository against the rubric you are given. Category points must not exceed their rubric weights, and the total must be a number from 0 to 100.

Respond with a single JSON object in exactly this shape and nothing else:

{
  "score": {
    "total": <number 0-100>,
    "breakdown": { "<rubric category>": <points awarded>, ... }
  },
  "summary": "<two or three sentences of overall assessment, in voice>",
  "whatActuallyWorks": ["<something that genuinely works>", ...],
  "issues": ["<specific problem and the file that shows it>", ...],
  "bottomLine": "<one-sentence verdict>",
  "prescription": "<the single most important fix>"
}

No markdown fences. No commentary outside the JSON object."#;

/// Repository-level facts that are not part of the evidence walk
#[derive(Debug, Clone)]
pub struct RepoFacts {
    pub name: String,
    pub description: Option<String>,
    pub mode: ReviewMode,
}

/// Build the user prompt from evidence. Deterministic: sorted maps,
/// traversal-ordered samples, no clocks.
pub fn build_review_prompt(
    facts: &RepoFacts,
    evidence: &RepoEvidence,
    config: &KarenConfig,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&render_intro(facts));
    prompt.push('\n');
    prompt.push_str(&render_rubric(config));
    prompt.push('\n');
    prompt.push_str(&render_stats(evidence));
    prompt.push('\n');
    prompt.push_str(&render_readme(evidence));
    prompt.push('\n');
    prompt.push_str(&render_manifest(evidence));
    prompt.push('\n');
    prompt.push_str(&render_samples(evidence));
    prompt.push_str(&render_mode(facts.mode));

    prompt
}

fn render_intro(facts: &RepoFacts) -> String {
    let description = facts
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(|d| format!("Claimed description: {d}\n"))
        .unwrap_or_default();

    format!(
        "Review the repository `{name}`.\n{description}",
        name = facts.name,
        description = description
    )
}

fn render_rubric(config: &KarenConfig) -> String {
    let mut section = String::from("## Rubric\n\nAward points per category, out of:\n");
    for (category, weight) in &config.weights {
        section.push_str(&format!("- {category}: {weight}\n"));
    }
    section
}

fn render_stats(evidence: &RepoEvidence) -> String {
    let stats = &evidence.stats;
    let mut section = format!(
        "## Repository shape\n\n{total} source files, {bytes} bytes on disk. \
         {sampled} files sampled below.\n",
        total = stats.total_files,
        bytes = stats.total_bytes,
        sampled = stats.sampled_files
    );

    if !stats.languages.is_empty() {
        section.push_str("\nLanguages:\n");
        for (language, counts) in &stats.languages {
            section.push_str(&format!("- {language}: {} files\n", counts.files));
        }
    }
    if stats.unreadable_files > 0 {
        section.push_str(&format!(
            "\n{} files could not be read.\n",
            stats.unreadable_files
        ));
    }
    if stats.truncated {
        section.push_str(
            "\nNote: sampling budgets were hit, so this is a partial view. \
             Judge what is here; do not speculate about the rest.\n",
        );
    }
    section
}

fn render_readme(evidence: &RepoEvidence) -> String {
    match &evidence.readme {
        Some(readme) => format!("## README\n\n```\n{readme}\n```\n"),
        // Absence is stated, not omitted, so the model scores it
        None => "## README\n\nNo README was found. Draw your own conclusions.\n".to_string(),
    }
}

fn render_manifest(evidence: &RepoEvidence) -> String {
    match &evidence.manifest {
        Some(manifest) => format!(
            "## Manifest (`{}`)\n\n```\n{}\n```\n",
            manifest.path.display(),
            manifest.contents
        ),
        None => "## Manifest\n\nNo project manifest was found.\n".to_string(),
    }
}

fn render_samples(evidence: &RepoEvidence) -> String {
    if evidence.files.is_empty() {
        return "## Code samples\n\nNo source files were sampled. Score accordingly.\n"
            .to_string();
    }

    let mut section = String::from("## Code samples\n");
    for sample in &evidence.files {
        section.push_str(&format!(
            "\n### `{}` ({}, {} bytes)\n\n```\n{}\n```\n",
            sample.path.display(),
            sample.language,
            sample.size_bytes,
            sample.excerpt
        ));
    }
    section
}

fn render_mode(mode: ReviewMode) -> String {
    match mode {
        ReviewMode::Full => String::new(),
        ReviewMode::Brutal => {
            "\nMode: brutal. Hold nothing back. If it deserves single digits, give it single digits.\n"
                .to_string()
        }
        ReviewMode::Gentle => {
            "\nMode: gentle. Keep the same standards but deliver them like you still have hope for this team.\n"
                .to_string()
        }
    }
}
