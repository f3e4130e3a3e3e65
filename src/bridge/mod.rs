//! Browser work through an external helper command.
//!
//! The helper owns the logged-in browser session. Each call runs the helper
//! once with an action and prints one JSON document on stdout:
//!
//! ```text
//! <command> <args..> search --query "<company> <keywords>" --limit N
//!     [{"name": "...", "title": "...", "profileReference": "..."}]
//! <command> <args..> resolve-employer --profile <ref>
//!     {"employer": "..." | null}
//! <command> <args..> connect --profile <ref> --note <text>
//!     {"outcome": "sent" | "alreadyConnected" | "employerUnknown" | "actionFailed",
//!      "reason": "..."}
//! ```
//!
//! `OUTREACH_HEADLESS` and `OUTREACH_WAITING_TIME` are passed through the
//! environment. A call that outlives the timeout is killed.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::error::CollaboratorError;
use crate::outreach::filters::{clean_employer, matches_target_role};
use crate::outreach::{PersonFinder, ProfileScraper};
use crate::types::{Candidate, Config, ConnectOutcome};

pub struct CommandBridge {
    command: String,
    args: Vec<String>,
    timeout: Duration,
    headless: bool,
    waiting_time: u64,
    search_keywords: String,
    max_results: usize,
}

impl CommandBridge {
    pub fn from_config(config: &Config) -> Result<Self, CollaboratorError> {
        let command = config.bridge.command.trim();
        if command.is_empty() {
            return Err(CollaboratorError::ConfigurationError(
                "bridge.command is empty".to_string(),
            ));
        }
        Ok(Self {
            command: command.to_string(),
            args: config.bridge.args.clone(),
            timeout: Duration::from_secs(config.bridge.timeout_secs.max(1)),
            headless: config.headless,
            waiting_time: config.waiting_time,
            search_keywords: config.search_keywords.trim().to_string(),
            max_results: config.max_search_results,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn search_query(&self, company_name: &str) -> String {
        if self.search_keywords.is_empty() {
            company_name.trim().to_string()
        } else {
            format!("{} {}", company_name.trim(), self.search_keywords)
        }
    }

    /// Run the helper once and return its stdout.
    async fn invoke(&self, action: &[&str]) -> Result<String, CollaboratorError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .args(action)
            .env("OUTREACH_HEADLESS", if self.headless { "true" } else { "false" })
            .env("OUTREACH_WAITING_TIME", self.waiting_time.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                CollaboratorError::CommandNotFound(PathBuf::from(&self.command))
            }
            _ => CollaboratorError::IoError(format!("Failed to start helper: {}", e)),
        })?;

        log::debug!("Bridge: {} {}", self.command, action.first().unwrap_or(&""));

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(CollaboratorError::Timeout(self.timeout.as_secs())),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr
            };
            return Err(CollaboratorError::from_stderr(code, &detail));
        }

        if !stderr.trim().is_empty() {
            log::debug!("Bridge stderr: {}", stderr.trim());
        }
        Ok(stdout)
    }
}

#[async_trait]
impl PersonFinder for CommandBridge {
    async fn search(&self, company_name: &str) -> Result<Vec<Candidate>, CollaboratorError> {
        let query = self.search_query(company_name);
        let limit = self.max_results.to_string();
        let stdout = self
            .invoke(&["search", "--query", &query, "--limit", &limit])
            .await?;
        let hits = parse_search_output(&stdout)?;
        let total = hits.len();
        let candidates = select_candidates(hits, company_name, self.max_results);
        log::info!(
            "Search '{}': {} results, {} matching roles",
            query,
            total,
            candidates.len()
        );
        Ok(candidates)
    }
}

#[async_trait]
impl ProfileScraper for CommandBridge {
    async fn resolve_employer(
        &self,
        profile_reference: &str,
    ) -> Result<Option<String>, CollaboratorError> {
        let stdout = self
            .invoke(&["resolve-employer", "--profile", profile_reference])
            .await?;
        parse_employer_output(&stdout)
    }

    async fn connect(
        &self,
        profile_reference: &str,
        note: &str,
    ) -> Result<ConnectOutcome, CollaboratorError> {
        let stdout = self
            .invoke(&["connect", "--profile", profile_reference, "--note", note])
            .await?;
        parse_connect_output(&stdout)
    }
}

// ---------------------------------------------------------------------------
// Output parsing
// ---------------------------------------------------------------------------

fn parse_search_output(stdout: &str) -> Result<Vec<Candidate>, CollaboratorError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).map_err(|e| CollaboratorError::ParseError(e.to_string()))
}

/// First `limit` hits that have a name, a profile and a target role.
fn select_candidates(hits: Vec<Candidate>, company_name: &str, limit: usize) -> Vec<Candidate> {
    hits.into_iter()
        .take(limit)
        .filter(|hit| !hit.name.trim().is_empty() && !hit.profile_reference.trim().is_empty())
        .filter(|hit| matches_target_role(&hit.title))
        .map(|mut hit| {
            hit.name = hit.name.trim().to_string();
            hit.company = company_name.to_string();
            hit
        })
        .collect()
}

#[derive(Deserialize)]
struct EmployerReply {
    #[serde(default)]
    employer: Option<String>,
}

fn parse_employer_output(stdout: &str) -> Result<Option<String>, CollaboratorError> {
    let reply: EmployerReply = serde_json::from_str(stdout.trim())
        .map_err(|e| CollaboratorError::ParseError(e.to_string()))?;
    Ok(reply.employer.as_deref().and_then(clean_employer))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
enum OutcomeKind {
    Sent,
    AlreadyConnected,
    EmployerUnknown,
    ActionFailed,
}

#[derive(Deserialize)]
struct ConnectReply {
    outcome: OutcomeKind,
    #[serde(default)]
    reason: Option<String>,
}

fn parse_connect_output(stdout: &str) -> Result<ConnectOutcome, CollaboratorError> {
    let reply: ConnectReply = serde_json::from_str(stdout.trim())
        .map_err(|e| CollaboratorError::ParseError(e.to_string()))?;
    Ok(match reply.outcome {
        OutcomeKind::Sent => ConnectOutcome::Sent,
        OutcomeKind::AlreadyConnected => ConnectOutcome::AlreadyConnected,
        OutcomeKind::EmployerUnknown => ConnectOutcome::EmployerUnknown,
        OutcomeKind::ActionFailed => ConnectOutcome::ActionFailed(
            reply
                .reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| "unknown failure".to_string()),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BridgeConfig;

    fn hit(name: &str, title: &str, reference: &str) -> Candidate {
        Candidate {
            name: name.to_string(),
            title: title.to_string(),
            company: String::new(),
            profile_reference: reference.to_string(),
        }
    }

    /// Bridge that runs `script` through `sh -c`; action args become `$1..`.
    fn shell_bridge(script: &str) -> CommandBridge {
        let config = Config {
            bridge: BridgeConfig {
                command: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string(), "helper".to_string()],
                timeout_secs: 10,
            },
            ..Config::default()
        };
        CommandBridge::from_config(&config).unwrap()
    }

    #[test]
    fn test_parse_search_output_accepts_both_key_styles() {
        let json = r#"[
            {"name": "Ann Lee", "title": "Product Manager", "profileReference": "/in/ann"},
            {"name": "Bob", "profile_url": "/in/bob"}
        ]"#;
        let hits = parse_search_output(json).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].profile_reference, "/in/bob");
        assert_eq!(hits[1].title, "");
        assert!(parse_search_output("  ").unwrap().is_empty());
        assert!(matches!(
            parse_search_output("<html>"),
            Err(CollaboratorError::ParseError(_))
        ));
    }

    #[test]
    fn test_select_candidates_bounds_then_filters() {
        let hits = vec![
            hit("Ann", "Senior Product Manager", "/in/ann"),
            hit("Bob", "Software Engineer", "/in/bob"),
            hit("", "Product Lead", "/in/nobody"),
            hit("Cat", "Group PM, Growth", "/in/cat"),
            hit("Dan", "Product Manager", "/in/dan"),
        ];
        let picked = select_candidates(hits, "Acme", 4);
        let names: Vec<&str> = picked.iter().map(|c| c.name.as_str()).collect();
        // Dan is beyond the bound.
        assert_eq!(names, vec!["Ann", "Cat"]);
        assert!(picked.iter().all(|c| c.company == "Acme"));
    }

    #[test]
    fn test_parse_employer_output() {
        assert_eq!(
            parse_employer_output(r#"{"employer": "Blinkit · Full-time"}"#).unwrap(),
            Some("Blinkit".to_string())
        );
        assert_eq!(parse_employer_output(r#"{"employer": null}"#).unwrap(), None);
        assert_eq!(parse_employer_output(r#"{"employer": "x"}"#).unwrap(), None);
        assert_eq!(parse_employer_output("{}").unwrap(), None);
    }

    #[test]
    fn test_parse_connect_output() {
        assert_eq!(
            parse_connect_output(r#"{"outcome": "sent"}"#).unwrap(),
            ConnectOutcome::Sent
        );
        assert_eq!(
            parse_connect_output(r#"{"outcome": "alreadyConnected"}"#).unwrap(),
            ConnectOutcome::AlreadyConnected
        );
        assert_eq!(
            parse_connect_output(r#"{"outcome": "actionFailed", "reason": "no connect button"}"#)
                .unwrap(),
            ConnectOutcome::ActionFailed("no connect button".to_string())
        );
        assert_eq!(
            parse_connect_output(r#"{"outcome": "actionFailed"}"#).unwrap(),
            ConnectOutcome::ActionFailed("unknown failure".to_string())
        );
        assert!(parse_connect_output(r#"{"outcome": "maybe"}"#).is_err());
    }

    #[test]
    fn test_from_config_rejects_empty_command() {
        let mut config = Config::default();
        config.bridge.command = "  ".to_string();
        assert!(matches!(
            CommandBridge::from_config(&config),
            Err(CollaboratorError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_search_query() {
        let bridge = shell_bridge("true");
        assert_eq!(bridge.search_query(" Acme "), "Acme product");
    }

    #[tokio::test]
    async fn test_search_runs_helper() {
        let bridge = shell_bridge(
            r#"[ "$1" = search ] && [ "$3" = "Acme product" ] && [ "$5" = 10 ] || exit 9
echo '[{"name":"Ann","title":"Product Manager","profileReference":"/in/ann"}]'"#,
        );
        let found = bridge.search("Acme").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].company, "Acme");
    }

    #[tokio::test]
    async fn test_helper_sees_environment() {
        let bridge = shell_bridge(
            r#"printf '{"employer": "Waited %s %s"}' "$OUTREACH_WAITING_TIME" "$OUTREACH_HEADLESS""#,
        );
        let employer = bridge.resolve_employer("/in/ann").await.unwrap();
        assert_eq!(employer.as_deref(), Some("Waited 3 false"));
    }

    #[tokio::test]
    async fn test_connect_passes_note() {
        let bridge = shell_bridge(
            r#"[ "$5" = "Hi Ann" ] && echo '{"outcome":"sent"}' || echo '{"outcome":"actionFailed","reason":"bad note"}'"#,
        );
        assert_eq!(
            bridge.connect("/in/ann", "Hi Ann").await.unwrap(),
            ConnectOutcome::Sent
        );
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_classified() {
        let bridge = shell_bridge("echo 'HTTP 429 Too Many Requests' >&2; exit 3");
        assert!(matches!(
            bridge.search("Acme").await,
            Err(CollaboratorError::RateLimited)
        ));

        let bridge = shell_bridge("echo 'boom' >&2; exit 4");
        match bridge.search("Acme").await {
            Err(CollaboratorError::CommandFailed { code, stderr }) => {
                assert_eq!(code, 4);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_helper() {
        let bridge = shell_bridge("sleep 5").with_timeout(Duration::from_millis(200));
        assert!(matches!(
            bridge.resolve_employer("/in/ann").await,
            Err(CollaboratorError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_command() {
        let mut config = Config::default();
        config.bridge.command = "/nonexistent/outreach-helper".to_string();
        let bridge = CommandBridge::from_config(&config).unwrap();
        assert!(matches!(
            bridge.search("Acme").await,
            Err(CollaboratorError::CommandNotFound(_))
        ));
    }
}
