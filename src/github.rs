//! GitHub Actions integration
//!
//! Everything Karen knows about her host: the event payload, the token,
//! workflow commands, and the `$GITHUB_OUTPUT` protocol. All of it is
//! optional. Outside Actions the context degrades to plain terminal
//! output and skipped outputs.

use std::env;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use serde::Deserialize;
use tracing::{debug, warn};

/// Host context assembled from the GitHub Actions environment
#[derive(Debug, Clone, Default)]
pub struct GithubContext {
    /// "owner/repo" from GITHUB_REPOSITORY
    pub repository: Option<String>,
    pub api_url: String,
    pub token: Option<String>,
    pub is_actions: bool,
    /// PR number when the triggering event is a pull request
    pub pull_request: Option<u64>,
    /// Repository description from the event payload
    pub repo_description: Option<String>,
}

#[derive(Deserialize)]
struct EventPayload {
    #[serde(default)]
    pull_request: Option<PullRequestRef>,
    #[serde(default)]
    repository: Option<RepositoryRef>,
}

#[derive(Deserialize)]
struct PullRequestRef {
    number: u64,
}

#[derive(Deserialize)]
struct RepositoryRef {
    description: Option<String>,
}

impl GithubContext {
    pub fn from_env() -> Self {
        let repository = env::var("GITHUB_REPOSITORY").ok().filter(|r| !r.is_empty());
        let api_url =
            env::var("GITHUB_API_URL").unwrap_or_else(|_| "https://api.github.com".to_string());
        let token = ["GITHUB_TOKEN", "INPUT_GITHUB_TOKEN"]
            .iter()
            .find_map(|var| env::var(var).ok().filter(|t| !t.trim().is_empty()));
        let is_actions = env::var("GITHUB_ACTIONS").map(|v| v == "true").unwrap_or(false);

        let (pull_request, repo_description) = match env::var("GITHUB_EVENT_PATH") {
            Ok(path) => read_event_payload(Path::new(&path)),
            Err(_) => (None, None),
        };

        Self {
            repository,
            api_url,
            token,
            is_actions,
            pull_request,
            repo_description,
        }
    }

    /// Repo name: the segment after the owner in GITHUB_REPOSITORY
    pub fn repo_name(&self) -> Option<String> {
        self.repository
            .as_deref()
            .and_then(|r| r.split('/').nth(1))
            .filter(|name| !name.is_empty())
            .map(|name| name.to_string())
    }

    /// POST a comment on the triggering pull request
    pub fn post_pr_comment(&self, body: &str) -> Result<()> {
        let repository = self
            .repository
            .as_deref()
            .context("GITHUB_REPOSITORY is not set")?;
        let token = self.token.as_deref().context("no GitHub token available")?;
        let number = self
            .pull_request
            .context("the triggering event is not a pull request")?;

        let url = format!(
            "{}/repos/{}/issues/{}/comments",
            self.api_url, repository, number
        );

        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .build()
            .new_agent();

        let response = agent
            .post(&url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", &format!("Bearer {token}"))
            .header("User-Agent", concat!("karen/", env!("CARGO_PKG_VERSION")))
            .send_json(&serde_json::json!({ "body": body }))
            .with_context(|| format!("POST {url} failed"))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let text = response.into_body().read_to_string().unwrap_or_default();
            anyhow::bail!("GitHub API error {status}: {text}");
        }
        Ok(())
    }

    /// Emit a warning through the channel the host understands
    pub fn warn(&self, message: &str) {
        if self.is_actions {
            println!("::warning::{}", escape_data(message));
        } else {
            println!("{} {}", style("⚠").yellow().bold(), message);
        }
    }

    /// Record an action output. Values must be single-line; every output
    /// Karen sets is.
    pub fn set_output(&self, name: &str, value: &str) {
        match env::var("GITHUB_OUTPUT") {
            Ok(path) if !path.is_empty() => {
                let entry = format!("{name}={value}\n");
                let written = fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .and_then(|mut file| file.write_all(entry.as_bytes()));
                if let Err(e) = written {
                    warn!("Could not write output {name} to GITHUB_OUTPUT: {e}");
                }
            }
            _ => debug!("GITHUB_OUTPUT not set; skipping output {name}={value}"),
        }
    }
}

fn read_event_payload(path: &Path) -> (Option<u64>, Option<String>) {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!("Could not read event payload {}: {}", path.display(), e);
            return (None, None);
        }
    };
    match serde_json::from_str::<EventPayload>(&contents) {
        Ok(payload) => (
            payload.pull_request.map(|pr| pr.number),
            payload.repository.and_then(|r| r.description),
        ),
        Err(e) => {
            debug!("Could not parse event payload: {e}");
            (None, None)
        }
    }
}

/// Escape a workflow command's data section
fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_data_escaping() {
        assert_eq!(escape_data("plain"), "plain");
        assert_eq!(escape_data("two\nlines"), "two%0Alines");
        assert_eq!(escape_data("100%"), "100%25");
    }

    #[test]
    fn context_reads_event_payload() {
        let dir = tempfile::tempdir().unwrap();
        let event = dir.path().join("event.json");
        fs::write(
            &event,
            r#"{"pull_request": {"number": 7}, "repository": {"description": "widgets"}}"#,
        )
        .unwrap();

        env::set_var("GITHUB_EVENT_PATH", &event);
        env::set_var("GITHUB_REPOSITORY", "octo/widget-factory");
        let ctx = GithubContext::from_env();
        env::remove_var("GITHUB_EVENT_PATH");
        env::remove_var("GITHUB_REPOSITORY");

        assert_eq!(ctx.pull_request, Some(7));
        assert_eq!(ctx.repo_description.as_deref(), Some("widgets"));
        assert_eq!(ctx.repo_name().as_deref(), Some("widget-factory"));
    }

    #[test]
    fn outputs_append_to_the_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        env::set_var("GITHUB_OUTPUT", &out);

        let ctx = GithubContext::default();
        ctx.set_output("karen_score", "62");
        ctx.set_output("karen_grade", "Mediocre");
        env::remove_var("GITHUB_OUTPUT");

        let contents = fs::read_to_string(&out).unwrap();
        assert_eq!(contents, "karen_score=62\nkaren_grade=Mediocre\n");
    }

    #[test]
    fn missing_payload_degrades_quietly() {
        let (pr, desc) = read_event_payload(Path::new("/nope/event.json"));
        assert_eq!(pr, None);
        assert_eq!(desc, None);
    }

    #[test]
    fn comment_requires_pr_context() {
        let ctx = GithubContext {
            repository: Some("octo/repo".to_string()),
            token: Some("t".to_string()),
            api_url: "https://api.github.com".to_string(),
            ..Default::default()
        };
        assert!(ctx.post_pr_comment("hi").is_err());
    }
}
