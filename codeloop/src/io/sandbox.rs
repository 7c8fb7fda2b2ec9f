//! Process-isolated execution of model-generated code.
//!
//! The sandbox stages sanitized code into a uniquely-named temp file, runs
//! it under the configured interpreter with a wall-clock timeout, and
//! classifies the outcome. Isolation is process-level only: a separate
//! process, a private working directory, and a hard timeout — not an OS
//! security boundary.

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use tempfile::{Builder, NamedTempFile};
use tracing::{debug, error, info, instrument, warn};

use crate::core::sanitize::sanitize_code;
use crate::core::types::ExecutionRecord;
use crate::io::process::run_command_with_timeout;

/// Sandbox knobs, fixed at construction.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Interpreter invoked as `interpreter <staged-file>`.
    pub interpreter: String,
    /// Wall-clock budget for one execution.
    pub timeout: Duration,
    /// Truncate captured stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
    /// Suffix for the staged code file.
    pub file_suffix: String,
    /// Directory for staged files; the system temp dir when unset.
    pub stage_dir: Option<PathBuf>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            timeout: Duration::from_secs(30),
            output_limit_bytes: 100_000,
            file_suffix: ".py".to_string(),
            stage_dir: None,
        }
    }
}

/// Executes untrusted generated code, one child process per call.
///
/// `execute` is total: staging faults, spawn faults, timeouts, and non-zero
/// exits all come back as an [`ExecutionRecord`]; nothing is raised past
/// this boundary. No state is shared between calls.
#[derive(Debug, Clone)]
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Sanitize, stage, run, and classify one piece of generated code.
    ///
    /// Blocks until the child exits or the timeout fires.
    #[instrument(skip_all, fields(timeout_secs = self.config.timeout.as_secs(), code_bytes = code.len()))]
    pub fn execute(&self, code: &str) -> ExecutionRecord {
        let code = sanitize_code(code);

        // The staged file is removed when `staged` drops, on every return
        // path out of this function, including unwinding.
        let staged = match self.stage(&code) {
            Ok(file) => file,
            Err(message) => {
                error!(err = %message, "staging failed");
                return ExecutionRecord::setup_failure(message);
            }
        };
        let Some(workdir) = staged.path().parent().map(PathBuf::from) else {
            return ExecutionRecord::setup_failure("staged file has no parent directory".to_string());
        };
        debug!(staged = %staged.path().display(), "staged code file");

        let mut cmd = Command::new(&self.config.interpreter);
        cmd.arg(staged.path()).current_dir(&workdir);

        let output = match run_command_with_timeout(
            cmd,
            self.config.timeout,
            self.config.output_limit_bytes,
        ) {
            Ok(output) => output,
            Err(err) => {
                let message = format!("failed to run {}: {err:#}", self.config.interpreter);
                error!(err = %message, "spawn failed");
                return ExecutionRecord::setup_failure(message);
            }
        };

        if output.timed_out {
            warn!(
                timeout_secs = self.config.timeout.as_secs(),
                "execution timed out"
            );
            return ExecutionRecord::timed_out(self.config.timeout);
        }

        let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        stdout.push_str(&output.stdout_truncated_notice());
        let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        stderr.push_str(&output.stderr_truncated_notice());

        if output.status.success() {
            info!("execution succeeded");
            ExecutionRecord::succeeded(stdout, stderr)
        } else {
            let return_code = output.status.code().unwrap_or(-1);
            error!(return_code, %stderr, "execution failed");
            ExecutionRecord::runtime_failure(return_code, stdout, stderr)
        }
    }

    /// Write `code` to an exclusively-owned temp file, unique per call.
    fn stage(&self, code: &str) -> Result<NamedTempFile, String> {
        let dir = self
            .config
            .stage_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let mut file = Builder::new()
            .prefix("codeloop-")
            .suffix(&self.config.file_suffix)
            .tempfile_in(&dir)
            .map_err(|e| format!("failed to stage code file: {e}"))?;
        file.write_all(code.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| format!("failed to write staged code: {e}"))?;
        Ok(file)
    }
}
