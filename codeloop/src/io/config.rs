//! Loop configuration stored in `codeloop.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::io::sandbox::SandboxConfig;

/// Loop configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoopConfig {
    /// Interpreter used to run generated code.
    pub interpreter: String,

    /// Wall-clock budget for one sandbox execution, in seconds.
    pub timeout_secs: u64,

    /// Maximum retry transitions per run.
    pub max_retries: u32,

    /// Truncate captured stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,

    /// Suffix for staged code files.
    pub file_suffix: String,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            output_limit_bytes: 100_000,
            file_suffix: ".py".to_string(),
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interpreter.trim().is_empty() {
            return Err(anyhow!("interpreter must be non-empty"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    /// Sandbox view of this configuration.
    pub fn sandbox_config(&self) -> SandboxConfig {
        SandboxConfig {
            interpreter: self.interpreter.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            output_limit_bytes: self.output_limit_bytes,
            file_suffix: self.file_suffix.clone(),
            stage_dir: None,
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `LoopConfig::default()`.
pub fn load_config(path: &Path) -> Result<LoopConfig> {
    if !path.exists() {
        let cfg = LoopConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LoopConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &LoopConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, LoopConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("codeloop.toml");
        let cfg = LoopConfig {
            max_retries: 5,
            ..LoopConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = LoopConfig {
            timeout_secs: 0,
            ..LoopConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn sandbox_config_carries_timeout() {
        let cfg = LoopConfig {
            timeout_secs: 7,
            ..LoopConfig::default()
        };
        let sandbox = cfg.sandbox_config();
        assert_eq!(sandbox.timeout, Duration::from_secs(7));
        assert_eq!(sandbox.interpreter, "python3");
    }
}
