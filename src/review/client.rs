//! LLM API client supporting Anthropic and OpenAI backends
//!
//! Uses ureq (sync HTTP); the pipeline makes exactly one request per run,
//! so no async runtime is needed. No client-side timeout is set: the run
//! waits as long as the backend does, and the CI step timeout is the only
//! watchdog.

use std::env;

use serde::{Deserialize, Serialize};

use crate::review::{ReviewError, ReviewResult};

/// Supported review backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

impl LlmBackend {
    pub fn env_key(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
            LlmBackend::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// The env var GitHub Actions sets for the corresponding action input
    pub fn input_key(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "INPUT_ANTHROPIC_API_KEY",
            LlmBackend::OpenAi => "INPUT_OPENAI_API_KEY",
        }
    }

    pub fn signup_url(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "https://console.anthropic.com/settings/keys",
            LlmBackend::OpenAi => "https://platform.openai.com/api-keys",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "claude-sonnet-4-20250514",
            LlmBackend::OpenAi => "gpt-4o",
        }
    }

    pub fn api_url(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "https://api.anthropic.com/v1/messages",
            LlmBackend::OpenAi => "https://api.openai.com/v1/chat/completions",
        }
    }

    /// API key from the environment, trying the plain variable first and
    /// the GitHub Actions input variable second. Blank values count as
    /// unset.
    pub fn api_key_from_env(&self) -> Option<String> {
        for var in [self.env_key(), self.input_key()] {
            if let Ok(value) = env::var(var) {
                if !value.trim().is_empty() {
                    return Some(value);
                }
            }
        }
        None
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LlmBackend::Anthropic),
            "openai" | "gpt" => Ok(LlmBackend::OpenAi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{}'. Valid providers: auto, anthropic, openai",
                s
            )),
        }
    }
}

impl std::fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmBackend::Anthropic => write!(f, "anthropic"),
            LlmBackend::OpenAi => write!(f, "openai"),
        }
    }
}

/// Resolve which backend to use from an optional explicit choice.
///
/// With an explicit backend the matching key must be present. With `None`
/// (auto) exactly one backend's key must be present: zero keys and two
/// keys are both fatal, so a misconfigured workflow never silently picks
/// a provider. Runs before any filesystem write or network call.
pub fn select_backend(explicit: Option<LlmBackend>) -> ReviewResult<(LlmBackend, String)> {
    if let Some(backend) = explicit {
        let key = backend
            .api_key_from_env()
            .ok_or_else(|| ReviewError::MissingApiKey {
                env_var: backend.env_key().to_string(),
                signup_url: backend.signup_url().to_string(),
            })?;
        return Ok((backend, key));
    }

    let anthropic = LlmBackend::Anthropic.api_key_from_env();
    let openai = LlmBackend::OpenAi.api_key_from_env();
    match (anthropic, openai) {
        (Some(key), None) => Ok((LlmBackend::Anthropic, key)),
        (None, Some(key)) => Ok((LlmBackend::OpenAi, key)),
        (Some(_), Some(_)) => Err(ReviewError::AmbiguousCredentials),
        (None, None) => Err(ReviewError::NoCredentials),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub backend: LlmBackend,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ClientConfig {
    pub fn new(backend: LlmBackend) -> Self {
        Self {
            backend,
            model: env::var("KAREN_MODEL").ok().filter(|m| !m.is_empty()),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }
}

/// Review client, sync HTTP via ureq
pub struct ReviewClient {
    config: ClientConfig,
    api_key: String,
    agent: ureq::Agent,
}

fn make_agent() -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false) // We handle status codes ourselves
        .build()
        .new_agent()
}

impl ReviewClient {
    pub fn new(config: ClientConfig, api_key: impl Into<String>) -> Self {
        Self {
            config,
            api_key: api_key.into(),
            agent: make_agent(),
        }
    }

    pub fn backend(&self) -> LlmBackend {
        self.config.backend
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    /// One review round trip: system directive + user prompt in, raw
    /// model text out.
    pub fn generate(&self, system: &str, prompt: &str) -> ReviewResult<String> {
        match self.config.backend {
            LlmBackend::Anthropic => self.generate_anthropic(system, prompt),
            LlmBackend::OpenAi => self.generate_openai(system, prompt),
        }
    }

    fn generate_openai(&self, system: &str, prompt: &str) -> ReviewResult<String> {
        let body = OpenAiRequest {
            model: self.config.model().to_string(),
            messages: vec![Message::system(system), Message::user(prompt)],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .agent
            .post(self.config.backend.api_url())
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", self.api_key))
            .send_json(&body)
            .map_err(|e| ReviewError::Api {
                status: 0,
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            return Err(ReviewError::Api {
                status,
                message: error_text,
            });
        }

        let resp: OpenAiResponse = response
            .into_body()
            .read_json()
            .map_err(|e| ReviewError::Parse(e.to_string()))?;

        resp.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ReviewError::Parse("No response choices".to_string()))
    }

    fn generate_anthropic(&self, system: &str, prompt: &str) -> ReviewResult<String> {
        let body = AnthropicRequest {
            model: self.config.model().to_string(),
            max_tokens: self.config.max_tokens,
            messages: vec![Message::user(prompt)],
            system: system.to_string(),
        };

        let response = self
            .agent
            .post(self.config.backend.api_url())
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .send_json(&body)
            .map_err(|e| ReviewError::Api {
                status: 0,
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            return Err(ReviewError::Api {
                status,
                message: error_text,
            });
        }

        let resp: AnthropicResponse = response
            .into_body()
            .read_json()
            .map_err(|e| ReviewError::Parse(e.to_string()))?;

        resp.content
            .into_iter()
            .find(|c| c.content_type == "text")
            .map(|c| c.text)
            .ok_or_else(|| ReviewError::Parse("No text content in response".to_string()))
    }
}

// OpenAI API types
#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: String,
}

// Anthropic API types
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    system: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clear_keys() {
        for var in [
            "ANTHROPIC_API_KEY",
            "INPUT_ANTHROPIC_API_KEY",
            "OPENAI_API_KEY",
            "INPUT_OPENAI_API_KEY",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn backend_defaults() {
        assert_eq!(LlmBackend::OpenAi.default_model(), "gpt-4o");
        assert_eq!(
            LlmBackend::Anthropic.default_model(),
            "claude-sonnet-4-20250514"
        );
        assert_eq!(
            LlmBackend::Anthropic.api_url(),
            "https://api.anthropic.com/v1/messages"
        );
    }

    #[test]
    fn provider_parsing() {
        use std::str::FromStr;
        assert_eq!(
            LlmBackend::from_str("anthropic").unwrap(),
            LlmBackend::Anthropic
        );
        assert_eq!(LlmBackend::from_str("OpenAI").unwrap(), LlmBackend::OpenAi);
        assert!(LlmBackend::from_str("gemini").is_err());
    }

    #[test]
    fn config_model_override() {
        let config = ClientConfig {
            backend: LlmBackend::Anthropic,
            model: None,
            max_tokens: 4096,
            temperature: 0.7,
        };
        assert_eq!(config.model(), "claude-sonnet-4-20250514");

        let config = ClientConfig {
            model: Some("custom-model".to_string()),
            ..config
        };
        assert_eq!(config.model(), "custom-model");
    }

    // Env-var tests mutate shared process state; they run serially in one
    // test body to avoid interleaving.
    #[test]
    fn backend_selection_matrix() {
        clear_keys();

        assert!(matches!(
            select_backend(None),
            Err(ReviewError::NoCredentials)
        ));

        std::env::set_var("ANTHROPIC_API_KEY", "sk-ant-test");
        let (backend, key) = select_backend(None).unwrap();
        assert_eq!(backend, LlmBackend::Anthropic);
        assert_eq!(key, "sk-ant-test");

        std::env::set_var("OPENAI_API_KEY", "sk-test");
        assert!(matches!(
            select_backend(None),
            Err(ReviewError::AmbiguousCredentials)
        ));

        // Explicit choice cuts through the ambiguity
        let (backend, _) = select_backend(Some(LlmBackend::OpenAi)).unwrap();
        assert_eq!(backend, LlmBackend::OpenAi);

        std::env::remove_var("ANTHROPIC_API_KEY");
        std::env::remove_var("OPENAI_API_KEY");
        assert!(matches!(
            select_backend(Some(LlmBackend::Anthropic)),
            Err(ReviewError::MissingApiKey { .. })
        ));

        // Action-input fallback variables count
        std::env::set_var("INPUT_OPENAI_API_KEY", "sk-input");
        let (backend, key) = select_backend(None).unwrap();
        assert_eq!(backend, LlmBackend::OpenAi);
        assert_eq!(key, "sk-input");

        // Blank keys are treated as unset
        std::env::set_var("INPUT_OPENAI_API_KEY", "  ");
        assert!(matches!(
            select_backend(None),
            Err(ReviewError::NoCredentials)
        ));

        clear_keys();
    }
}
