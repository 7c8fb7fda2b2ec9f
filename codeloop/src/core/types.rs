//! Shared deterministic types for the code-generation loop.
//!
//! These types define stable contracts between the phase machine, the
//! sandbox, and the collaborator interfaces. They must not depend on
//! external state or I/O and must remain deterministic across runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Why a sandbox execution did not succeed.
///
/// `Setup` covers faults before the code ran (staging or spawning);
/// `Timeout` and `Runtime` cover the child process itself. Only the
/// latter two are eligible for a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Staging the temp file or spawning the child failed before the code ran.
    Setup,
    /// The child exceeded the configured timeout and was killed.
    Timeout,
    /// The child ran to completion with a non-zero exit code.
    Runtime,
}

/// Outcome of one sandbox execution.
///
/// The sandbox converts every fault into one of these records; it never
/// returns an `Err` past its boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub return_code: i32,
    /// Human-readable description of the failure, absent on success.
    pub error: Option<String>,
    /// Failure classification, absent on success.
    pub failure_kind: Option<FailureKind>,
}

impl ExecutionRecord {
    /// Record for a child that exited with code 0.
    pub fn succeeded(stdout: String, stderr: String) -> Self {
        Self {
            success: true,
            stdout,
            stderr,
            return_code: 0,
            error: None,
            failure_kind: None,
        }
    }

    /// Record for a child that ran to completion with a non-zero exit code.
    pub fn runtime_failure(return_code: i32, stdout: String, stderr: String) -> Self {
        Self {
            success: false,
            stdout,
            stderr,
            return_code,
            error: Some(format!("process exited with code {return_code}")),
            failure_kind: Some(FailureKind::Runtime),
        }
    }

    /// Record for a child that was killed after exceeding `timeout`.
    ///
    /// The message names the configured timeout and is placed in both
    /// captured streams so either one surfaces it to the summarizer.
    pub fn timed_out(timeout: Duration) -> Self {
        let message = format!(
            "code execution timed out after {} seconds",
            timeout.as_secs()
        );
        Self {
            success: false,
            stdout: message.clone(),
            stderr: message.clone(),
            return_code: -1,
            error: Some(message),
            failure_kind: Some(FailureKind::Timeout),
        }
    }

    /// Record for a fault raised while staging or spawning, before the code ran.
    pub fn setup_failure(message: String) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: message.clone(),
            return_code: -1,
            error: Some(message),
            failure_kind: Some(FailureKind::Setup),
        }
    }

    /// Whether this failure is worth another planning round.
    ///
    /// Setup faults are environment problems: regenerating the code cannot
    /// fix them, so they never consume a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.failure_kind,
            Some(FailureKind::Runtime | FailureKind::Timeout)
        )
    }
}

/// Snapshot of one completed iteration, retained for context on retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptSnapshot {
    pub plan: String,
    pub code: String,
    pub execution: ExecutionRecord,
    pub summary: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_failure_names_exit_code() {
        let record = ExecutionRecord::runtime_failure(3, String::new(), "boom".to_string());
        assert!(!record.success);
        assert_eq!(record.return_code, 3);
        assert_eq!(record.error.as_deref(), Some("process exited with code 3"));
        assert!(record.is_retryable());
    }

    #[test]
    fn timed_out_names_configured_timeout_in_both_streams() {
        let record = ExecutionRecord::timed_out(Duration::from_secs(1));
        assert_eq!(record.return_code, -1);
        assert!(record.stdout.contains('1'));
        assert!(record.stderr.contains('1'));
        assert!(record.is_retryable());
    }

    #[test]
    fn setup_failure_is_not_retryable() {
        let record = ExecutionRecord::setup_failure("no interpreter".to_string());
        assert!(!record.success);
        assert_eq!(record.failure_kind, Some(FailureKind::Setup));
        assert!(!record.is_retryable());
    }

    #[test]
    fn success_has_no_failure_metadata() {
        let record = ExecutionRecord::succeeded("2\n".to_string(), String::new());
        assert!(record.success);
        assert_eq!(record.error, None);
        assert_eq!(record.failure_kind, None);
        assert!(!record.is_retryable());
    }
}
