use camino::Utf8PathBuf;
use comfyctl_domain::{ArgumentsError, Identity, NodeReferenceError};
use serde_json::{json, Value};

use crate::outcome::ExecutionOutcome;

/// Failures raised by the lifecycle operations themselves, as opposed to
/// plain I/O errors bubbling up from the system.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LifecycleIssue {
    #[error("command `{command}` exited with status {code}")]
    CommandFailed { command: String, code: i32 },
    #[error("command `{command}` was killed by signal {signal}")]
    CommandKilled { command: String, signal: i32 },
    #[error("{program} not found on PATH")]
    ProgramNotFound { program: String },
    #[error("account {name:?} not found")]
    AccountNotFound { name: String },
    #[error(
        "cannot modify permissions as a non-root user \
         (current {current}, account {account}, desired {desired})"
    )]
    PermissionDenied {
        current: Identity,
        account: Identity,
        desired: Identity,
    },
    #[error(transparent)]
    InvalidArguments(#[from] ArgumentsError),
    #[error(transparent)]
    InvalidNodeReference(#[from] NodeReferenceError),
    #[error("{field} must not be empty")]
    InvalidInput { field: &'static str },
    #[error("expected sha256 {value:?} is not 64 hex characters")]
    InvalidChecksum { value: String },
    #[error("sha256 of {path} is {actual}, expected {expected}")]
    ChecksumMismatch {
        path: Utf8PathBuf,
        expected: String,
        actual: String,
    },
}

impl LifecycleIssue {
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::CommandFailed { .. } => "command_failed",
            Self::CommandKilled { .. } => "command_killed",
            Self::ProgramNotFound { .. } => "program_not_found",
            Self::AccountNotFound { .. } => "account_not_found",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::InvalidNodeReference(_) => "invalid_node_reference",
            Self::InvalidInput { .. } => "invalid_input",
            Self::InvalidChecksum { .. } => "invalid_checksum",
            Self::ChecksumMismatch { .. } => "checksum_mismatch",
        }
    }

    #[must_use]
    fn hint(&self) -> Option<&'static str> {
        match self {
            Self::PermissionDenied { .. } => Some(
                "Start the container as root, or run it as the service account with matching --uid/--gid.",
            ),
            Self::InvalidArguments(_) => Some("Check for an unterminated quote or trailing backslash."),
            Self::ProgramNotFound { .. } => Some("Install the tool in the image or fix PATH."),
            Self::AccountNotFound { .. } => Some("Run `comfyctl setup` while building the image."),
            _ => None,
        }
    }

    #[must_use]
    pub fn details(&self) -> Value {
        let mut details = json!({ "reason": self.reason() });
        if let Value::Object(map) = &mut details {
            if let Some(hint) = self.hint() {
                map.insert("hint".into(), json!(hint));
            }
            match self {
                Self::CommandFailed { command, code } => {
                    map.insert("command".into(), json!(command));
                    map.insert("code".into(), json!(code));
                }
                Self::CommandKilled { command, signal } => {
                    map.insert("command".into(), json!(command));
                    map.insert("signal".into(), json!(signal));
                }
                Self::ProgramNotFound { program } => {
                    map.insert("program".into(), json!(program));
                }
                Self::AccountNotFound { name } => {
                    map.insert("account".into(), json!(name));
                }
                Self::PermissionDenied {
                    current,
                    account,
                    desired,
                } => {
                    map.insert("current".into(), json!(current));
                    map.insert("account".into(), json!(account));
                    map.insert("desired".into(), json!(desired));
                }
                Self::ChecksumMismatch {
                    path,
                    expected,
                    actual,
                } => {
                    map.insert("path".into(), json!(path));
                    map.insert("expected".into(), json!(expected));
                    map.insert("actual".into(), json!(actual));
                }
                _ => {}
            }
        }
        details
    }
}

/// Converts a failed operation into a failure outcome, keeping the typed
/// issue details when the error carries one.
#[must_use]
pub fn issue_outcome(err: &anyhow::Error) -> ExecutionOutcome {
    let issues: Vec<String> = err.chain().map(ToString::to_string).collect();
    let mut details = match err.downcast_ref::<LifecycleIssue>() {
        Some(issue) => issue.details(),
        None => json!({ "reason": "internal_error" }),
    };
    if let Value::Object(map) = &mut details {
        map.insert("issues".into(), json!(issues));
    }
    ExecutionOutcome::failure(format!("{err:#}"), details)
}
