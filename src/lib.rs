//! Karen - Brutally honest AI code review
//!
//! The pipeline: [`evidence`] samples a bounded, gitignore-aware slice of
//! the repository, [`prompt`] turns it into one deterministic review
//! prompt, [`review`] makes a single LLM round trip and normalizes the
//! verdict, and [`publish`] writes the artifacts (`.karen/score.json`,
//! `review.md`, history, SVG badge) and talks to GitHub.
//!
//! Bring your own API key: `ANTHROPIC_API_KEY` or `OPENAI_API_KEY`.

pub mod cli;
pub mod config;
pub mod evidence;
pub mod github;
pub mod models;
pub mod prompt;
pub mod publish;
pub mod review;

pub use models::{karen_grade, KarenReview, KarenScore, ReviewMode};
