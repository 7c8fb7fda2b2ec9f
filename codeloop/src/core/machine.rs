//! Phase machine for the plan, code, execute, summarize loop.
//!
//! The workflow graph is a fixed set of phases with one conditional edge out
//! of Planning (coding vs. direct summary) and one conditional back-edge out
//! of Summarize (retry vs. terminate). Everything here is a pure function of
//! the run state, so each transition can be tested in isolation.

use crate::core::state::RunState;

/// Phases of one run. `Terminal` has no outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Planning,
    Coding,
    Execute,
    Summarize,
    Terminal,
}

/// Static transition table.
///
/// The retry back-edge is taken at most `max_retries` times, so Planning is
/// entered at most `max_retries + 1` times regardless of collaborator
/// behavior.
pub fn next_phase(current: Phase, state: &RunState) -> Phase {
    match current {
        Phase::Planning => {
            if state.is_coding {
                Phase::Coding
            } else {
                Phase::Summarize
            }
        }
        Phase::Coding => Phase::Execute,
        Phase::Execute => Phase::Summarize,
        Phase::Summarize => {
            if should_retry(state) {
                Phase::Planning
            } else {
                Phase::Terminal
            }
        }
        Phase::Terminal => Phase::Terminal,
    }
}

/// Whether the Summarize phase should loop back to Planning.
///
/// True iff this was a coding run, the current execution failed with a
/// retryable kind (runtime or timeout, never setup), and the retry budget
/// is not exhausted.
pub fn should_retry(state: &RunState) -> bool {
    let Some(execution) = &state.execution else {
        return false;
    };
    state.is_coding
        && !execution.success
        && execution.is_retryable()
        && state.retry_count < state.max_retries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{RunState, StateUpdate};
    use crate::core::types::ExecutionRecord;

    fn coding_state(execution: Option<ExecutionRecord>, retry_count: u32, max: u32) -> RunState {
        let mut state = RunState::new("query", max).apply(StateUpdate {
            is_coding: Some(true),
            execution,
            ..StateUpdate::default()
        });
        state.retry_count = retry_count;
        state
    }

    #[test]
    fn planning_branches_on_is_coding() {
        let coding = coding_state(None, 0, 3);
        assert_eq!(next_phase(Phase::Planning, &coding), Phase::Coding);

        let direct = RunState::new("query", 3);
        assert_eq!(next_phase(Phase::Planning, &direct), Phase::Summarize);
    }

    #[test]
    fn coding_and_execute_are_unconditional() {
        let state = RunState::new("query", 3);
        assert_eq!(next_phase(Phase::Coding, &state), Phase::Execute);
        assert_eq!(next_phase(Phase::Execute, &state), Phase::Summarize);
    }

    #[test]
    fn terminal_is_absorbing() {
        let state = RunState::new("query", 3);
        assert_eq!(next_phase(Phase::Terminal, &state), Phase::Terminal);
    }

    fn failed() -> Option<ExecutionRecord> {
        Some(ExecutionRecord::runtime_failure(
            1,
            String::new(),
            "err".to_string(),
        ))
    }

    fn succeeded() -> Option<ExecutionRecord> {
        Some(ExecutionRecord::succeeded("ok".to_string(), String::new()))
    }

    /// Truth table for the retry predicate at the budget boundary.
    #[test]
    fn should_retry_requires_all_three_conditions() {
        // coding + failed + budget remaining
        assert!(should_retry(&coding_state(failed(), 0, 1)));
        // budget exhausted at retry_count == max_retries
        assert!(!should_retry(&coding_state(failed(), 1, 1)));
        // execution succeeded
        assert!(!should_retry(&coding_state(succeeded(), 0, 1)));
        // not a coding run
        let mut direct = coding_state(failed(), 0, 1);
        direct.is_coding = false;
        assert!(!should_retry(&direct));
        // no execution result at all
        assert!(!should_retry(&coding_state(None, 0, 1)));
    }

    #[test]
    fn should_retry_rejects_setup_failures() {
        let state = coding_state(
            Some(ExecutionRecord::setup_failure("spawn failed".to_string())),
            0,
            3,
        );
        assert!(!should_retry(&state));
    }

    #[test]
    fn should_retry_accepts_timeouts() {
        let state = coding_state(
            Some(ExecutionRecord::timed_out(std::time::Duration::from_secs(1))),
            0,
            3,
        );
        assert!(should_retry(&state));
    }

    #[test]
    fn zero_budget_never_retries() {
        assert!(!should_retry(&coding_state(failed(), 0, 0)));
    }

    #[test]
    fn summarize_routes_back_to_planning_on_retry() {
        let state = coding_state(failed(), 0, 2);
        assert_eq!(next_phase(Phase::Summarize, &state), Phase::Planning);

        let done = coding_state(succeeded(), 0, 2);
        assert_eq!(next_phase(Phase::Summarize, &done), Phase::Terminal);
    }
}
