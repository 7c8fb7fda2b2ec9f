//! Collaborator abstractions for the planning, coding, and summary phases.
//!
//! Each trait is a capability injected into the workflow driver; the
//! language-model prompting behind a real implementation lives outside this
//! crate. Tests use scripted doubles that return predetermined outputs.

use anyhow::Result;

use crate::core::types::ExecutionRecord;

/// Planning decision for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    /// Plan text carried into coding and summarization.
    pub plan: String,
    /// Whether the query needs the coding branch at all.
    pub is_coding: bool,
}

/// Everything the summarizer may draw on for one iteration.
#[derive(Debug, Clone)]
pub struct SummaryRequest<'a> {
    pub query: &'a str,
    pub plan: &'a str,
    pub code: &'a str,
    /// Absent on non-coding runs.
    pub execution: Option<&'a ExecutionRecord>,
    pub retry_count: u32,
    /// Rendered history of prior attempts, empty on the first iteration.
    pub history: &'a str,
}

/// Produces a plan and the coding-branch decision.
pub trait Planner {
    fn plan(&self, query: &str) -> Result<PlanOutcome>;
}

/// Produces runnable code for a planned query.
pub trait Coder {
    fn generate(&self, query: &str, plan: &str, history: &str) -> Result<String>;
}

/// Produces the user-facing summary for one iteration.
pub trait Summarizer {
    fn summarize(&self, request: &SummaryRequest<'_>) -> Result<String>;
}
