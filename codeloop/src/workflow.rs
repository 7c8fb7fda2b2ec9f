//! Orchestration of the plan, code, execute, summarize loop for one query.
//!
//! The driver owns a [`RunState`] exclusively for the run's lifetime and
//! walks the phase machine until Terminal. Each phase handler calls exactly
//! one collaborator (or the sandbox) and returns a partial update that is
//! merged functionally, so individual transitions stay replayable in tests.

use anyhow::{Error, Result, anyhow};
use tracing::{error, info, instrument, warn};

use crate::agents::{Coder, Planner, SummaryRequest, Summarizer};
use crate::core::history::render_history;
use crate::core::machine::{Phase, next_phase, should_retry};
use crate::core::state::{RunState, StateUpdate};
use crate::io::sandbox::Sandbox;

/// Configuration for one workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Maximum retry transitions before the loop gives up.
    pub max_retries: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

/// Reason the run reached Terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStop {
    /// Summarize produced the final response with nothing outstanding.
    Completed,
    /// Execution was still failing when the loop stopped: the retry budget
    /// ran out, or the failure kind is not retryable.
    Stuck { retries: u32, max_retries: u32 },
    /// A collaborator fault outside the modeled taxonomy; Summarize was
    /// bypassed and no retry attempted.
    Fatal { message: String },
}

/// Final result of one run.
///
/// `response` is present on every non-fatal path, including exhausted
/// retries, so callers always get a structured answer rather than a crash.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub response: Option<String>,
    pub stop: RunStop,
    pub state: RunState,
}

/// Drive one query through the loop until Terminal.
///
/// Planning is entered at most `max_retries + 1` times; the bound holds
/// regardless of collaborator behavior because the retry budget is spent
/// inside the state's own retry transition.
#[instrument(skip_all, fields(max_retries = config.max_retries))]
pub fn run_workflow<P: Planner, C: Coder, S: Summarizer>(
    planner: &P,
    coder: &C,
    summarizer: &S,
    sandbox: &Sandbox,
    config: &WorkflowConfig,
    query: &str,
) -> RunOutcome {
    let mut state = RunState::new(query, config.max_retries);
    let mut phase = Phase::Planning;

    while phase != Phase::Terminal {
        debug_assert!(
            state.invariant_violations().is_empty(),
            "state invariants violated: {:?}",
            state.invariant_violations()
        );

        (state, phase) = match phase {
            Phase::Planning => {
                info!(retry_count = state.retry_count, "planning");
                match planning_update(planner, &state) {
                    Ok(update) => advance(state.apply(update), Phase::Planning),
                    Err(err) => fatal(state, "planning", err),
                }
            }
            Phase::Coding => match coding_update(coder, &state) {
                Ok(update) => advance(state.apply(update), Phase::Coding),
                Err(err) => fatal(state, "coding", err),
            },
            Phase::Execute => advance(state.apply(execute_update(sandbox, &state)), Phase::Execute),
            Phase::Summarize => match summary_for(summarizer, &state) {
                Ok(summary) => {
                    if should_retry(&state) {
                        warn!(
                            attempt = state.retry_count + 1,
                            "execution failed, retrying"
                        );
                        match state.record_retry(Some(summary)) {
                            Ok(next) => (next, Phase::Planning),
                            Err(message) => fatal(state, "retry", anyhow!(message)),
                        }
                    } else {
                        let next = state.apply(StateUpdate {
                            response: Some(summary),
                            ..StateUpdate::default()
                        });
                        (next, Phase::Terminal)
                    }
                }
                Err(err) => fatal(state, "summarize", err),
            },
            Phase::Terminal => (state, Phase::Terminal),
        };
    }

    finish(state)
}

/// Planning handler: one planner call, plan and branch decision.
fn planning_update<P: Planner>(planner: &P, state: &RunState) -> Result<StateUpdate> {
    let outcome = planner.plan(&state.query)?;
    Ok(StateUpdate {
        plan: Some(outcome.plan),
        is_coding: Some(outcome.is_coding),
        ..StateUpdate::default()
    })
}

/// Coding handler: one coder call with the rendered attempt history.
fn coding_update<C: Coder>(coder: &C, state: &RunState) -> Result<StateUpdate> {
    let history = render_history(&state.previous_attempts);
    let code = coder.generate(&state.query, &state.plan, &history)?;
    Ok(StateUpdate {
        code: Some(code),
        ..StateUpdate::default()
    })
}

/// Execute handler: the sandbox call is total, so this cannot fault.
fn execute_update(sandbox: &Sandbox, state: &RunState) -> StateUpdate {
    StateUpdate {
        execution: Some(sandbox.execute(&state.code)),
        ..StateUpdate::default()
    }
}

/// Summarize handler: one summarizer call over the full iteration context.
fn summary_for<S: Summarizer>(summarizer: &S, state: &RunState) -> Result<String> {
    let history = render_history(&state.previous_attempts);
    summarizer.summarize(&SummaryRequest {
        query: &state.query,
        plan: &state.plan,
        code: &state.code,
        execution: state.execution.as_ref(),
        retry_count: state.retry_count,
        history: &history,
    })
}

fn advance(state: RunState, from: Phase) -> (RunState, Phase) {
    let next = next_phase(from, &state);
    (state, next)
}

/// Record a collaborator fault and jump straight to Terminal, bypassing
/// Summarize. Fatal paths are never retried.
fn fatal(state: RunState, phase_name: &str, err: Error) -> (RunState, Phase) {
    let message = format!("{phase_name} failed: {err:#}");
    error!(err = %message, "collaborator fault, terminating run");
    let next = state.apply(StateUpdate {
        error: Some(message),
        ..StateUpdate::default()
    });
    (next, Phase::Terminal)
}

fn finish(state: RunState) -> RunOutcome {
    let stop = if let Some(message) = &state.error {
        RunStop::Fatal {
            message: message.clone(),
        }
    } else if state
        .execution
        .as_ref()
        .is_some_and(|record| !record.success)
    {
        RunStop::Stuck {
            retries: state.retry_count,
            max_retries: state.max_retries,
        }
    } else {
        RunStop::Completed
    };

    info!(
        retry_count = state.retry_count,
        stop = ?stop,
        "run terminated"
    );
    RunOutcome {
        response: state.response.clone(),
        stop,
        state,
    }
}
