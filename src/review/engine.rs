//! Verdict extraction and normalization
//!
//! Models wrap JSON in markdown fences more often than not, whatever the
//! instructions say. The engine strips the first fence (any language
//! tag), parses the verdict, and normalizes it into a [`KarenReview`]
//! whose grade is derived locally. A grade claimed by the model is
//! ignored.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::models::{KarenReview, KarenScore};
use crate::review::{ReviewError, ReviewResult};

/// Extract the JSON payload from model output.
///
/// Returns the body of the first fenced code block, tagged or not; text
/// without fences is returned whole. Always trimmed.
pub fn extract_json(text: &str) -> String {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)```").expect("valid regex")
    });

    match fence.captures(text) {
        Some(caps) => caps[1].trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// The verdict as the model writes it, before normalization
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReview {
    score: RawScore,
    summary: String,
    #[serde(default)]
    what_actually_works: Vec<String>,
    #[serde(default)]
    issues: Vec<String>,
    #[serde(default)]
    bottom_line: String,
    #[serde(default)]
    prescription: String,
}

#[derive(Deserialize)]
struct RawScore {
    total: f64,
    #[serde(default)]
    breakdown: BTreeMap<String, f64>,
}

/// Parse raw model output into a normalized review.
///
/// `score.total` and `summary` are required; narrative lists default to
/// empty. Totals are rounded and clamped to 0-100, breakdown points are
/// rounded, and the grade and timestamp are stamped here.
pub fn parse_review(response: &str) -> ReviewResult<KarenReview> {
    let payload = extract_json(response);
    let raw: RawReview = serde_json::from_str(&payload)
        .map_err(|e| ReviewError::Parse(format!("verdict is not valid JSON: {e}")))?;

    let total = raw.score.total.round().clamp(0.0, 100.0) as u32;
    let breakdown = raw
        .score
        .breakdown
        .into_iter()
        .map(|(category, points)| (category, points.round().clamp(0.0, 100.0) as u32))
        .collect();

    Ok(KarenReview {
        score: KarenScore::new(total, breakdown),
        summary: raw.summary,
        what_actually_works: raw.what_actually_works,
        issues: raw.issues,
        bottom_line: raw.bottom_line,
        prescription: raw.prescription,
    })
}
