//! Run state owned by the workflow driver, updated copy-on-write.

use serde::{Deserialize, Serialize};

use crate::core::types::{AttemptSnapshot, ExecutionRecord};

/// Full state of one run, created per query and dropped at Terminal.
///
/// Phase handlers never mutate this in place; they return a [`StateUpdate`]
/// that [`RunState::apply`] merges into a fresh copy. This keeps every
/// transition replayable in isolation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// The user query, immutable for the run.
    pub query: String,
    /// Whether planning routed this run down the coding branch.
    pub is_coding: bool,
    /// Current plan text, overwritten on each planning entry.
    pub plan: String,
    /// Current generated code, overwritten on each coding entry.
    pub code: String,
    /// Result of the current iteration's execution, absent before Execute.
    pub execution: Option<ExecutionRecord>,
    /// Final output, set on successful termination or non-coding paths.
    pub response: Option<String>,
    /// Number of retry transitions taken so far.
    pub retry_count: u32,
    /// Retry budget, fixed for the run.
    pub max_retries: u32,
    /// Snapshots of completed iterations, in chronological order.
    pub previous_attempts: Vec<AttemptSnapshot>,
    /// Fatal collaborator fault, set only on the terminal error path.
    pub error: Option<String>,
}

/// Partial update produced by one phase handler.
///
/// `None` fields leave the previous value untouched.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub is_coding: Option<bool>,
    pub plan: Option<String>,
    pub code: Option<String>,
    pub execution: Option<ExecutionRecord>,
    pub response: Option<String>,
    pub error: Option<String>,
}

impl RunState {
    /// Fresh state for a newly submitted query.
    pub fn new(query: impl Into<String>, max_retries: u32) -> Self {
        Self {
            query: query.into(),
            is_coding: false,
            plan: String::new(),
            code: String::new(),
            execution: None,
            response: None,
            retry_count: 0,
            max_retries,
            previous_attempts: Vec::new(),
            error: None,
        }
    }

    /// Merge a partial update into a new state, leaving `self` untouched.
    pub fn apply(&self, update: StateUpdate) -> Self {
        let mut next = self.clone();
        if let Some(is_coding) = update.is_coding {
            next.is_coding = is_coding;
        }
        if let Some(plan) = update.plan {
            next.plan = plan;
        }
        if let Some(code) = update.code {
            next.code = code;
        }
        if let Some(execution) = update.execution {
            next.execution = Some(execution);
        }
        if let Some(response) = update.response {
            next.response = Some(response);
        }
        if let Some(error) = update.error {
            next.error = Some(error);
        }
        next
    }

    /// Take the retry transition: snapshot the attempt, spend one retry,
    /// and clear the per-iteration fields so a stale execution result can
    /// never be read as current.
    ///
    /// Errors if there is no execution result to snapshot; that indicates a
    /// bug in the phase machine, not a recoverable condition.
    pub fn record_retry(&self, summary: Option<String>) -> Result<Self, String> {
        let execution = self
            .execution
            .clone()
            .ok_or_else(|| "retry transition without an execution result".to_string())?;

        let mut next = self.clone();
        next.previous_attempts.push(AttemptSnapshot {
            plan: self.plan.clone(),
            code: self.code.clone(),
            execution,
            summary,
        });
        next.retry_count += 1;
        next.execution = None;
        next.code = String::new();
        Ok(next)
    }

    /// Check structural invariants, returning one message per violation.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.retry_count > self.max_retries {
            errors.push(format!(
                "retry_count {} exceeds max_retries {}",
                self.retry_count, self.max_retries
            ));
        }
        if self.previous_attempts.len() != self.retry_count as usize {
            errors.push(format!(
                "{} attempt snapshots recorded for retry_count {}",
                self.previous_attempts.len(),
                self.retry_count
            ));
        }
        errors
    }
}
