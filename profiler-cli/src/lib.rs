// stdout carries only the command result (launch prefix or byte count) so the
// tool can be scripted. Logs go to stderr.
#![deny(clippy::print_stdout)]

mod cli;

pub use cli::CheckArgs;
pub use cli::Cli;
pub use cli::Command;
pub use cli::DeleteUriArgs;

use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use rtenv_profiler_plugin::ProfilerPlugin;
use rtenv_profiler_plugin::ProfilerSettings;
use rtenv_profiler_plugin::RuntimeEnvContext;
use rtenv_profiler_plugin::RuntimeEnvPlugin;
use rtenv_profiler_plugin::RuntimeEnvSpec;
use rtenv_profiler_plugin::TracingLogger;
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const RESOURCES_DIR_NAME: &str = "runtime_resources";

pub async fn run_main(cli: Cli) -> anyhow::Result<()> {
    let default_level = "warn";
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();

    let Cli {
        session_dir,
        config,
        command,
    } = cli;
    let settings = match config {
        Some(path) => ProfilerSettings::load(&path)?,
        None => ProfilerSettings::default(),
    };

    match command {
        Command::Check(CheckArgs {
            profiler_config,
            interpreter,
        }) => {
            let raw = parse_profiler_config_arg(&profiler_config)?;
            let interpreter = interpreter.unwrap_or_else(|| settings.interpreter.clone());
            let py_executable = check(&session_dir, settings, raw, interpreter).await?;
            print_result(py_executable);
        }
        Command::DeleteUri(DeleteUriArgs { uri }) => {
            let bytes = delete_uri(&session_dir, settings, &uri)?;
            print_result(bytes);
        }
    }
    Ok(())
}

/// Runs `create` and `modify_context` the way a worker setup would and
/// returns the resulting interpreter command.
pub async fn check(
    session_dir: &Path,
    settings: ProfilerSettings,
    raw: Value,
    interpreter: String,
) -> anyhow::Result<String> {
    let spec = RuntimeEnvSpec::new().with_field(settings.name.clone(), raw);
    let mut plugin = ProfilerPlugin::new(&resources_root(session_dir), settings)?;
    let mut context = RuntimeEnvContext::new(interpreter);

    plugin
        .create(None, &spec, &mut context, &TracingLogger)
        .await?;
    plugin.modify_context(&[], &spec, &mut context, &TracingLogger);
    Ok(context.py_executable)
}

pub fn delete_uri(
    session_dir: &Path,
    settings: ProfilerSettings,
    uri: &str,
) -> anyhow::Result<u64> {
    let plugin = ProfilerPlugin::new(&resources_root(session_dir), settings)?;
    Ok(plugin.delete_uri(uri, &TracingLogger)?)
}

#[allow(clippy::print_stdout)]
fn print_result(result: impl std::fmt::Display) {
    println!("{result}");
}

fn resources_root(session_dir: &Path) -> PathBuf {
    session_dir.join(RESOURCES_DIR_NAME)
}

/// `@FILE` reads JSON from a file. Anything that is not valid JSON is taken as
/// a bare string so that `default` (and typos of it) reach the plugin as-is.
fn parse_profiler_config_arg(arg: &str) -> anyhow::Result<Value> {
    if let Some(path) = arg.strip_prefix('@') {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profiler config {path:?}"))?;
        return serde_json::from_str(&contents)
            .with_context(|| format!("profiler config {path:?} is not valid JSON"));
    }
    Ok(serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string())))
}
