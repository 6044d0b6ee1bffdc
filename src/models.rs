//! Core data models for Karen
//!
//! These models represent the review verdict as it travels through the
//! pipeline and as it is persisted under `.karen/`.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// How hard Karen leans into the critique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    /// The standard experience: thorough and unimpressed.
    #[default]
    Full,
    /// No mercy. Every shortcut gets named.
    Brutal,
    /// Same standards, softer delivery.
    Gentle,
}

impl std::str::FromStr for ReviewMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(ReviewMode::Full),
            "brutal" => Ok(ReviewMode::Brutal),
            "gentle" => Ok(ReviewMode::Gentle),
            _ => Err(anyhow::anyhow!(
                "Unknown mode '{}'. Valid modes: full, brutal, gentle",
                s
            )),
        }
    }
}

impl std::fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewMode::Full => write!(f, "full"),
            ReviewMode::Brutal => write!(f, "brutal"),
            ReviewMode::Gentle => write!(f, "gentle"),
        }
    }
}

/// The numeric verdict, persisted as `.karen/score.json`.
///
/// `grade` is always derived from `total` via [`karen_grade`] after
/// normalization; it is stored denormalized so the consumers of
/// `score.json` (badges, dashboards) never need the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KarenScore {
    pub total: u32,
    /// Category name -> points awarded. Categories come back from the
    /// model; they are recorded as-is, not validated against the
    /// configured weights.
    #[serde(default)]
    pub breakdown: BTreeMap<String, u32>,
    pub grade: String,
    pub timestamp: String,
}

impl KarenScore {
    /// Build a score at the current instant, deriving the grade locally.
    pub fn new(total: u32, breakdown: BTreeMap<String, u32>) -> Self {
        Self {
            total,
            breakdown,
            grade: karen_grade(total).to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// A complete review as parsed from the model's JSON verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KarenReview {
    pub score: KarenScore,
    pub summary: String,
    #[serde(default)]
    pub what_actually_works: Vec<String>,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub bottom_line: String,
    #[serde(default)]
    pub prescription: String,
}

/// Map a 0-100 total to Karen's verdict tiers.
///
/// The mapping is total and monotonic: every representable total lands in
/// exactly one tier, and a higher total never grades worse.
pub fn karen_grade(total: u32) -> &'static str {
    match total {
        90..=u32::MAX => "Actually Impressive",
        80..=89 => "Surprisingly Competent",
        70..=79 => "Acceptable, I Guess",
        60..=69 => "Mediocre",
        40..=59 => "Needs Adult Supervision",
        20..=39 => "Hot Mess",
        _ => "Speak To The Manager",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_tiers_cover_boundaries() {
        assert_eq!(karen_grade(100), "Actually Impressive");
        assert_eq!(karen_grade(90), "Actually Impressive");
        assert_eq!(karen_grade(89), "Surprisingly Competent");
        assert_eq!(karen_grade(80), "Surprisingly Competent");
        assert_eq!(karen_grade(79), "Acceptable, I Guess");
        assert_eq!(karen_grade(70), "Acceptable, I Guess");
        assert_eq!(karen_grade(69), "Mediocre");
        assert_eq!(karen_grade(62), "Mediocre");
        assert_eq!(karen_grade(60), "Mediocre");
        assert_eq!(karen_grade(59), "Needs Adult Supervision");
        assert_eq!(karen_grade(40), "Needs Adult Supervision");
        assert_eq!(karen_grade(39), "Hot Mess");
        assert_eq!(karen_grade(20), "Hot Mess");
        assert_eq!(karen_grade(19), "Speak To The Manager");
        assert_eq!(karen_grade(0), "Speak To The Manager");
    }

    #[test]
    fn grade_is_monotonic() {
        let rank = |g: &str| match g {
            "Speak To The Manager" => 0,
            "Hot Mess" => 1,
            "Needs Adult Supervision" => 2,
            "Mediocre" => 3,
            "Acceptable, I Guess" => 4,
            "Surprisingly Competent" => 5,
            "Actually Impressive" => 6,
            other => panic!("unexpected grade {other}"),
        };
        for total in 1..=100u32 {
            assert!(
                rank(karen_grade(total)) >= rank(karen_grade(total - 1)),
                "grade regressed between {} and {}",
                total - 1,
                total
            );
        }
    }

    #[test]
    fn mode_parsing() {
        use std::str::FromStr;
        assert_eq!(ReviewMode::from_str("full").unwrap(), ReviewMode::Full);
        assert_eq!(ReviewMode::from_str("BRUTAL").unwrap(), ReviewMode::Brutal);
        assert_eq!(ReviewMode::from_str("gentle").unwrap(), ReviewMode::Gentle);
        assert!(ReviewMode::from_str("polite").is_err());
    }

    #[test]
    fn score_new_derives_grade_and_timestamp() {
        let score = KarenScore::new(73, BTreeMap::new());
        assert_eq!(score.grade, "Acceptable, I Guess");
        assert!(score.timestamp.ends_with('Z'));
    }

    #[test]
    fn review_serializes_camel_case() {
        let review = KarenReview {
            score: KarenScore::new(50, BTreeMap::new()),
            summary: "It compiles, which is more than I expected.".to_string(),
            what_actually_works: vec!["The README renders.".to_string()],
            issues: vec!["No tests.".to_string()],
            bottom_line: "Needs work.".to_string(),
            prescription: "Write tests.".to_string(),
        };
        let json = serde_json::to_string(&review).unwrap();
        assert!(json.contains("\"whatActuallyWorks\""));
        assert!(json.contains("\"bottomLine\""));
        assert!(!json.contains("\"what_actually_works\""));
    }

    #[test]
    fn score_round_trips_through_json() {
        let mut breakdown = BTreeMap::new();
        breakdown.insert("code_quality".to_string(), 22);
        breakdown.insert("testing".to_string(), 11);
        let score = KarenScore::new(62, breakdown);
        let json = serde_json::to_string_pretty(&score).unwrap();
        let back: KarenScore = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total, 62);
        assert_eq!(back.grade, "Mediocre");
        assert_eq!(back.breakdown.get("testing"), Some(&11));
    }
}
