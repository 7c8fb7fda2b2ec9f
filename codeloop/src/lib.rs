//! Bounded plan, code, execute, summarize loop for model-generated code.
//!
//! This crate drives a query through planning, code generation, sandboxed
//! execution, and summarization, retrying failed executions with
//! accumulated history until a retry budget runs out. The architecture
//! enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (phase machine, state updates,
//!   fence sanitization, history rendering). No I/O, fully testable in
//!   isolation.
//! - **[`io`]**: Side-effecting operations (configuration, process
//!   execution, the sandbox). Isolated to enable mocking in tests.
//!
//! [`workflow`] coordinates core logic with the sandbox and the injected
//! collaborator capabilities declared in [`agents`].

pub mod agents;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod workflow;
