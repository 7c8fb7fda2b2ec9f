//! Thin CLI over the deterministic pieces of the loop runner.
//!
//! The workflow itself needs live planner/coder/summarizer collaborators
//! and is driven as a library; the CLI exposes the parts that run without
//! one: config scaffolding, fence sanitization, and one-shot sandbox
//! execution.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use codeloop::core::sanitize::sanitize_code;
use codeloop::exit_codes;
use codeloop::io::config::{LoopConfig, load_config, write_config};
use codeloop::io::sandbox::Sandbox;
use codeloop::logging;

#[derive(Parser)]
#[command(
    name = "codeloop",
    version,
    about = "Bounded plan/code/execute/summarize loop runner"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default `codeloop.toml` if missing.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
    },
    /// Print code with markdown fence lines removed (file or stdin).
    Sanitize { file: Option<PathBuf> },
    /// Run one code file (or stdin) through the sandbox and print the
    /// execution record as JSON.
    Exec {
        file: Option<PathBuf>,
        /// Override the configured timeout, in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Path to the config file.
        #[arg(long, default_value = "codeloop.toml")]
        config: PathBuf,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(force),
        Command::Sanitize { file } => cmd_sanitize(file.as_deref()),
        Command::Exec {
            file,
            timeout_secs,
            config,
        } => cmd_exec(file.as_deref(), timeout_secs, &config),
    }
}

fn cmd_init(force: bool) -> Result<i32> {
    let path = Path::new("codeloop.toml");
    if !force && path.exists() {
        return Ok(exit_codes::OK);
    }
    write_config(path, &LoopConfig::default())?;
    Ok(exit_codes::OK)
}

fn cmd_sanitize(file: Option<&Path>) -> Result<i32> {
    let raw = read_input(file)?;
    print!("{}", sanitize_code(&raw));
    Ok(exit_codes::OK)
}

fn cmd_exec(file: Option<&Path>, timeout_secs: Option<u64>, config_path: &Path) -> Result<i32> {
    let cfg = load_config(config_path)?;
    let mut sandbox_config = cfg.sandbox_config();
    if let Some(secs) = timeout_secs {
        sandbox_config.timeout = Duration::from_secs(secs);
    }

    let code = read_input(file)?;
    let record = Sandbox::new(sandbox_config).execute(&code);

    let mut payload = serde_json::to_string_pretty(&record).context("serialize record")?;
    payload.push('\n');
    print!("{payload}");

    if record.success {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::EXEC_FAILED)
    }
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path).with_context(|| format!("read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read stdin")?;
            Ok(buf)
        }
    }
}
