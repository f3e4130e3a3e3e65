//! Error types for collaborator calls
//!
//! Errors are classified by recoverability:
//! - Retryable: timeouts, helper crashes, rate limits
//! - NonRetryable: configuration errors, unparsable helper output
//! - RequiresUserAction: missing helper command, expired browser session

use std::path::PathBuf;
use thiserror::Error;

/// Failures from the finder / scraper collaborators (browser helper calls).
#[derive(Debug, Error)]
pub enum CollaboratorError {
    // Retryable errors
    #[error("Helper timed out after {0} seconds")]
    Timeout(u64),

    #[error("Helper exited with code {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },

    #[error("Upstream rate limit hit")]
    RateLimited,

    // Non-retryable errors
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Failed to parse helper output: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(String),

    // Requires user action
    #[error("Helper command not found: {0}")]
    CommandNotFound(PathBuf),

    #[error("Browser session is not logged in")]
    NotLoggedIn,
}

impl CollaboratorError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CollaboratorError::Timeout(_)
                | CollaboratorError::CommandFailed { .. }
                | CollaboratorError::RateLimited
        )
    }

    /// Returns true if this error requires user action to resolve
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            CollaboratorError::CommandNotFound(_) | CollaboratorError::NotLoggedIn
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CollaboratorError::Timeout(_) => {
                "The page took too long. Raise bridge.timeoutSecs or retry later."
            }
            CollaboratorError::CommandFailed { .. } => {
                "Check the helper's stderr output for details."
            }
            CollaboratorError::RateLimited => "Wait a few hours before the next run.",
            CollaboratorError::ConfigurationError(_) => {
                "Check the bridge section in ~/.outreach/config.json"
            }
            CollaboratorError::ParseError(_) => "The helper printed something other than JSON.",
            CollaboratorError::IoError(_) => {
                "Check file permissions and that the helper is executable."
            }
            CollaboratorError::CommandNotFound(_) => "Install the helper or fix bridge.command.",
            CollaboratorError::NotLoggedIn => {
                "Log in once with the helper so it can reuse the session."
            }
        }
    }

    /// Map a helper's stderr onto a more specific error where one is recognisable.
    pub fn from_stderr(code: i32, stderr: &str) -> Self {
        let lowered = stderr.to_lowercase();
        if lowered.contains("not logged in") || lowered.contains("login required") {
            return CollaboratorError::NotLoggedIn;
        }
        if lowered.contains("rate limit") || lowered.contains("too many requests") {
            return CollaboratorError::RateLimited;
        }
        CollaboratorError::CommandFailed {
            code,
            stderr: stderr.trim().to_string(),
        }
    }
}

impl From<std::io::Error> for CollaboratorError {
    fn from(err: std::io::Error) -> Self {
        CollaboratorError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(err: serde_json::Error) -> Self {
        CollaboratorError::ParseError(err.to_string())
    }
}

/// Serializable error summary for the run report
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSummary {
    pub message: String,
    pub error_type: ErrorType,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Retryable,
    NonRetryable,
    RequiresUserAction,
}

impl From<&CollaboratorError> for ErrorSummary {
    fn from(err: &CollaboratorError) -> Self {
        let error_type = if err.requires_user_action() {
            ErrorType::RequiresUserAction
        } else if err.is_retryable() {
            ErrorType::Retryable
        } else {
            ErrorType::NonRetryable
        };

        ErrorSummary {
            message: err.to_string(),
            error_type,
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
