//! Markdown rendering for review artifacts
//!
//! Two renderers: the durable `.karen/review.md` report and the PR
//! comment, which adds a score delta against the previous run.

use crate::models::KarenReview;

/// Render the review as GitHub-flavored Markdown for `.karen/review.md`
pub fn render_review(review: &KarenReview, repo_name: &str) -> String {
    let mut md = String::new();

    md.push_str(&render_header(review, repo_name));
    md.push('\n');
    md.push_str(&render_breakdown(review));
    md.push('\n');
    md.push_str(&render_works(review));
    md.push('\n');
    md.push_str(&render_issues(review));
    md.push('\n');
    md.push_str(&render_verdict(review));
    md.push_str(&render_footer());

    md
}

fn render_header(review: &KarenReview, repo_name: &str) -> String {
    format!(
        r#"# 🔥 Karen Review: {repo_name}

**Score: {total}/100** | **Grade: {grade}**

Reviewed: {timestamp}

## Summary

{summary}
"#,
        total = review.score.total,
        grade = review.score.grade,
        timestamp = review.score.timestamp,
        summary = review.summary
    )
}

fn render_breakdown(review: &KarenReview) -> String {
    if review.score.breakdown.is_empty() {
        return String::new();
    }

    let mut md = String::from("## Score Breakdown\n\n| Category | Points |\n|----------|--------|\n");
    for (category, points) in &review.score.breakdown {
        md.push_str(&format!("| {category} | {points} |\n"));
    }
    md
}

fn render_works(review: &KarenReview) -> String {
    let mut md = String::from("## What Actually Works\n\n");
    if review.what_actually_works.is_empty() {
        md.push_str("Nothing made the list.\n");
        return md;
    }
    for item in &review.what_actually_works {
        md.push_str(&format!("- {item}\n"));
    }
    md
}

fn render_issues(review: &KarenReview) -> String {
    let mut md = String::from("## Issues\n\n");
    if review.issues.is_empty() {
        md.push_str("No complaints on record. Savor it.\n");
        return md;
    }
    for (i, issue) in review.issues.iter().enumerate() {
        md.push_str(&format!("{}. {issue}\n", i + 1));
    }
    md
}

fn render_verdict(review: &KarenReview) -> String {
    let mut md = String::new();
    if !review.bottom_line.is_empty() {
        md.push_str(&format!("## Bottom Line\n\n> {}\n\n", review.bottom_line));
    }
    if !review.prescription.is_empty() {
        md.push_str(&format!("## Prescription\n\n{}\n\n", review.prescription));
    }
    md
}

fn render_footer() -> String {
    "---\n\n*Reviewed by [Karen](https://github.com/karen-ci/karen). She will be back.*\n"
        .to_string()
}

/// Render the PR comment, with a score delta when a previous total exists
pub fn render_pr_comment(
    review: &KarenReview,
    repo_name: &str,
    previous_total: Option<u32>,
) -> String {
    let mut md = format!(
        "## 🔥 Karen has reviewed `{repo_name}`\n\n**Score: {}/100 \u{b7} {}**{}\n\n{}\n",
        review.score.total,
        review.score.grade,
        render_delta(review.score.total, previous_total),
        review.summary
    );

    if !review.issues.is_empty() {
        md.push_str("\n**Top complaints:**\n");
        for issue in review.issues.iter().take(5) {
            md.push_str(&format!("- {issue}\n"));
        }
    }

    if !review.bottom_line.is_empty() {
        md.push_str(&format!("\n> {}\n", review.bottom_line));
    }

    md.push_str("\n<sub>Full review in `.karen/review.md`.</sub>\n");
    md
}

fn render_delta(total: u32, previous_total: Option<u32>) -> String {
    let Some(previous) = previous_total else {
        return String::new();
    };
    let delta = total as i64 - previous as i64;
    if delta > 0 {
        format!(" (📈 +{delta} since last review)")
    } else if delta < 0 {
        format!(" (📉 {delta} since last review)")
    } else {
        " (unchanged since last review)".to_string()
    }
}
