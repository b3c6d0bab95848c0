use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;

use crate::config::ConfigError;
use crate::config::ProfilerConfig;
use crate::config::ProfilerConfigValue;
use crate::render::RenderedCommand;
use crate::render::ToolSpec;

/// File stem the throwaway report is written under while checking a
/// configuration.
pub const THROWAWAY_OUTPUT_NAME: &str = "empty";

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The configuration is well formed but the tool refused it. `message` is
    /// what the tool printed.
    #[error("profiler failed to run with the following error message:\n{message}")]
    Validation { message: String },
    #[error("profiler tool `{program}` is not installed or not on PATH")]
    ToolNotFound { program: String },
    #[error("io error while {action}: {source}")]
    Io {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl TranslateError {
    fn io(action: &'static str, source: std::io::Error) -> Self {
        Self::Io { action, source }
    }
}

/// Parses the profiler entry of a runtime-env spec, checks that the tool
/// accepts it, and renders it.
///
/// The check profiles `tool.noop_target` with the output redirected to
/// `scratch_dir/empty`, so the returned config is exactly the one that was
/// passed in; output-path rewriting is left to the caller.
pub async fn validate_and_render(
    raw: &Value,
    tool: &ToolSpec,
    scratch_dir: &Path,
) -> Result<(ProfilerConfig, RenderedCommand), TranslateError> {
    let config = ProfilerConfigValue::from_json(raw)?.into_config();
    check_config(&config, tool, scratch_dir).await?;
    let command = config.render(tool);
    Ok((config, command))
}

/// Runs the tool once against `tool.noop_target` using a throwaway copy of
/// `config`.
pub async fn check_config(
    config: &ProfilerConfig,
    tool: &ToolSpec,
    scratch_dir: &Path,
) -> Result<(), TranslateError> {
    let throwaway_output = scratch_dir.join(THROWAWAY_OUTPUT_NAME);
    let throwaway =
        config.with_option(tool.output_path_option(throwaway_output.display().to_string())?);
    let mut argv = throwaway.render(tool).into_tokens();
    argv.extend(tool.noop_target.iter().cloned());

    let program = which::which(&tool.program).map_err(|_| TranslateError::ToolNotFound {
        program: tool.program.clone(),
    })?;

    let output = Command::new(&program)
        .args(&argv[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|err| match err.kind() {
            ErrorKind::NotFound => TranslateError::ToolNotFound {
                program: tool.program.clone(),
            },
            _ => TranslateError::io("running profiler check", err),
        })?;

    if output.status.success() {
        return remove_throwaway_artifact(scratch_dir, tool).await;
    }
    // The tool's message is the error to report; a cleanup failure here is not.
    let _ = remove_throwaway_artifact(scratch_dir, tool).await;
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let message = if stderr.trim().is_empty() {
        stdout.trim()
    } else {
        stderr.trim()
    };
    Err(TranslateError::Validation {
        message: message.to_string(),
    })
}

async fn remove_throwaway_artifact(
    scratch_dir: &Path,
    tool: &ToolSpec,
) -> Result<(), TranslateError> {
    let artifact = scratch_dir.join(format!(
        "{THROWAWAY_OUTPUT_NAME}.{}",
        tool.artifact_extension
    ));
    match tokio::fs::remove_file(&artifact).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(TranslateError::io("removing throwaway profiler report", err)),
    }
}
