//! AI review backends and verdict parsing
//!
//! Supports Anthropic and OpenAI with a BYOK (bring your own key) model -
//! API keys are read from environment variables, including the `INPUT_*`
//! variants GitHub Actions sets for action inputs.
//!
//! # Environment Variables
//!
//! - `ANTHROPIC_API_KEY` (or `INPUT_ANTHROPIC_API_KEY`)
//! - `OPENAI_API_KEY` (or `INPUT_OPENAI_API_KEY`)
//! - `KAREN_MODEL`: optional model override for either backend

mod client;
mod engine;

pub use client::{select_backend, ClientConfig, LlmBackend, ReviewClient};
pub use engine::{extract_json, parse_review};

use thiserror::Error;

/// Errors that can occur while obtaining a review
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error("No API credentials found. Set ANTHROPIC_API_KEY or OPENAI_API_KEY")]
    NoCredentials,

    #[error(
        "Both ANTHROPIC_API_KEY and OPENAI_API_KEY are set. \
         Pass --provider anthropic or --provider openai to disambiguate"
    )]
    AmbiguousCredentials,

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse review response: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ReviewResult<T> = Result<T, ReviewError>;
