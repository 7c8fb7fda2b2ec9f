//! Stable exit codes for codeloop CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid input, config, or an internal error.
pub const INVALID: i32 = 1;
/// `codeloop exec` ran the code and the execution itself failed.
pub const EXEC_FAILED: i32 = 2;
