//! Test-only scripted collaborators for driving the workflow.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use anyhow::{Result, anyhow};

use crate::agents::{Coder, PlanOutcome, Planner, SummaryRequest, Summarizer};

/// Planner that replays a fixed script and panics on extra calls.
pub struct ScriptedPlanner {
    script: RefCell<VecDeque<Result<PlanOutcome, String>>>,
    calls: Cell<usize>,
}

impl ScriptedPlanner {
    pub fn new(script: Vec<Result<PlanOutcome, String>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            calls: Cell::new(0),
        }
    }

    /// Planner that answers every call with a coding plan.
    pub fn coding(plans: &[&str]) -> Self {
        Self::new(
            plans
                .iter()
                .map(|plan| {
                    Ok(PlanOutcome {
                        plan: (*plan).to_string(),
                        is_coding: true,
                    })
                })
                .collect(),
        )
    }

    /// Planner that answers one call with a non-coding plan.
    pub fn direct(plan: &str) -> Self {
        Self::new(vec![Ok(PlanOutcome {
            plan: plan.to_string(),
            is_coding: false,
        })])
    }

    pub fn failing(message: &str) -> Self {
        Self::new(vec![Err(message.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Planner for ScriptedPlanner {
    fn plan(&self, _query: &str) -> Result<PlanOutcome> {
        self.calls.set(self.calls.get() + 1);
        self.script
            .borrow_mut()
            .pop_front()
            .expect("unexpected planner call")
            .map_err(|message| anyhow!(message))
    }
}

/// Coder that replays a fixed script and records the history it was given.
pub struct ScriptedCoder {
    script: RefCell<VecDeque<Result<String, String>>>,
    histories: RefCell<Vec<String>>,
}

impl ScriptedCoder {
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            histories: RefCell::new(Vec::new()),
        }
    }

    pub fn returning(snippets: &[&str]) -> Self {
        Self::new(snippets.iter().map(|s| Ok((*s).to_string())).collect())
    }

    /// Coder that panics if the coding phase is ever entered.
    pub fn unreachable() -> Self {
        Self::new(Vec::new())
    }

    pub fn histories(&self) -> Vec<String> {
        self.histories.borrow().clone()
    }
}

impl Coder for ScriptedCoder {
    fn generate(&self, _query: &str, _plan: &str, history: &str) -> Result<String> {
        self.histories.borrow_mut().push(history.to_string());
        self.script
            .borrow_mut()
            .pop_front()
            .expect("unexpected coder call")
            .map_err(|message| anyhow!(message))
    }
}

/// One observed summarizer invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryCall {
    pub retry_count: u32,
    pub execution_success: Option<bool>,
    pub history: String,
}

/// Summarizer that replays a fixed script and records what it saw.
pub struct ScriptedSummarizer {
    script: RefCell<VecDeque<Result<String, String>>>,
    seen: RefCell<Vec<SummaryCall>>,
}

impl ScriptedSummarizer {
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn returning(summaries: &[&str]) -> Self {
        Self::new(summaries.iter().map(|s| Ok((*s).to_string())).collect())
    }

    pub fn unreachable() -> Self {
        Self::new(Vec::new())
    }

    pub fn seen(&self) -> Vec<SummaryCall> {
        self.seen.borrow().clone()
    }
}

impl Summarizer for ScriptedSummarizer {
    fn summarize(&self, request: &SummaryRequest<'_>) -> Result<String> {
        self.seen.borrow_mut().push(SummaryCall {
            retry_count: request.retry_count,
            execution_success: request.execution.map(|record| record.success),
            history: request.history.to_string(),
        });
        self.script
            .borrow_mut()
            .pop_front()
            .expect("unexpected summarizer call")
            .map_err(|message| anyhow!(message))
    }
}
