#![cfg(target_os = "linux")]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Result;
use pretty_assertions::assert_eq;
use rtenv_profiler_config::ToolSpec;
use rtenv_profiler_config::TranslateError;
use rtenv_profiler_plugin::NoopLogger;
use rtenv_profiler_plugin::ProfilerPlugin;
use rtenv_profiler_plugin::ProfilerSettings;
use rtenv_profiler_plugin::RuntimeEnvContext;
use rtenv_profiler_plugin::RuntimeEnvPlugin;
use rtenv_profiler_plugin::RuntimeEnvSetupError;
use rtenv_profiler_plugin::RuntimeEnvSpec;
use serde_json::json;
use tempfile::TempDir;

struct Session {
    dir: TempDir,
    settings: ProfilerSettings,
}

impl Session {
    /// A session whose profiler is a shell script with the given body.
    fn with_tool(body: &str) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin)?;
        let program = bin.join("nsys");
        fs::write(&program, format!("#!/bin/sh\n{body}\n"))?;
        let mut permissions = fs::metadata(&program)?.permissions();
        permissions.set_mode(0o755);
        fs::set_permissions(&program, permissions)?;

        let settings = ProfilerSettings {
            name: "profiler".to_string(),
            tool: ToolSpec {
                program: program.display().to_string(),
                noop_target: vec!["true".to_string()],
                ..ToolSpec::default()
            },
            ..ProfilerSettings::default()
        };
        Ok(Self { dir, settings })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn program(&self) -> &str {
        &self.settings.tool.program
    }

    fn plugin(&self) -> Result<ProfilerPlugin> {
        Ok(ProfilerPlugin::new(
            &self.path().join("runtime_resources"),
            self.settings.clone(),
        )?)
    }

    fn logs_dir(&self) -> PathBuf {
        self.path().join("logs").join("profiler")
    }
}

fn spec(config: serde_json::Value) -> RuntimeEnvSpec {
    RuntimeEnvSpec::new().with_field("profiler", config)
}

#[tokio::test]
async fn create_then_modify_context_prefixes_the_interpreter() -> Result<()> {
    let session = Session::with_tool("exit 0")?;
    let mut plugin = session.plugin()?;
    let spec = spec(json!({"--cuda-stats": "on", "-o": "run1"}));
    let mut context = RuntimeEnvContext::new("python");

    let bytes = plugin.create(None, &spec, &mut context, &NoopLogger).await?;
    plugin.modify_context(&[], &spec, &mut context, &NoopLogger);

    let output = session.logs_dir().join("run1").display().to_string();
    assert_eq!(bytes, 0);
    assert_eq!(
        plugin.command().map(|command| command.tokens().to_vec()),
        Some(vec![
            session.program().to_string(),
            "profile".to_string(),
            "--cuda-stats=on".to_string(),
            "-o".to_string(),
            output.clone(),
        ])
    );
    assert_eq!(
        context.py_executable,
        format!(
            "{} profile --cuda-stats=on -o {output} python",
            session.program()
        )
    );
    Ok(())
}

#[tokio::test]
async fn default_config_writes_reports_under_logs_dir() -> Result<()> {
    let session = Session::with_tool("exit 0")?;
    let mut plugin = session.plugin()?;
    let spec = spec(json!("default"));
    let mut context = RuntimeEnvContext::new("python");

    plugin.create(None, &spec, &mut context, &NoopLogger).await?;

    let Some(command) = plugin.command() else {
        panic!("default config should enable profiling");
    };
    let options = command.parse_options();
    let names: Vec<&str> = options.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["-t", "-o", "--cudabacktrace", "--stop-on-exit"]);
    assert_eq!(
        options[1].1,
        session
            .logs_dir()
            .join("worker_process_%p")
            .display()
            .to_string()
    );
    Ok(())
}

#[tokio::test]
async fn config_without_output_option_gets_default_report_name() -> Result<()> {
    let session = Session::with_tool("exit 0")?;
    let mut plugin = session.plugin()?;
    let spec = spec(json!({"-t": "cuda,nvtx"}));
    let mut context = RuntimeEnvContext::new("python");

    plugin.create(None, &spec, &mut context, &NoopLogger).await?;

    let options = plugin
        .command()
        .map(|command| command.parse_options())
        .unwrap_or_default();
    assert_eq!(
        options,
        vec![
            ("-t".to_string(), "cuda,nvtx".to_string()),
            (
                "-o".to_string(),
                session
                    .logs_dir()
                    .join("worker_process_%p")
                    .display()
                    .to_string()
            ),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn rejected_config_aborts_setup_with_tool_message() -> Result<()> {
    let session = Session::with_tool("echo 'unknown option' >&2\nexit 1")?;
    let mut plugin = session.plugin()?;
    let spec = spec(json!({"--no-such-flag": "1"}));
    let mut context = RuntimeEnvContext::new("python");

    let err = plugin
        .create(None, &spec, &mut context, &NoopLogger)
        .await
        .expect_err("tool rejects the config");

    assert!(err.to_string().contains("unknown option"), "{err}");
    assert!(matches!(
        err,
        RuntimeEnvSetupError::Profiler {
            source: TranslateError::Validation { .. },
            ..
        }
    ));
    assert_eq!(plugin.command(), None);
    Ok(())
}

#[tokio::test]
async fn unsupported_config_string_aborts_setup() -> Result<()> {
    let session = Session::with_tool("exit 0")?;
    let mut plugin = session.plugin()?;
    let spec = spec(json!("garbage"));
    let mut context = RuntimeEnvContext::new("python");

    let err = plugin
        .create(None, &spec, &mut context, &NoopLogger)
        .await
        .expect_err("garbage is not a config");

    assert!(matches!(
        err,
        RuntimeEnvSetupError::Profiler {
            source: TranslateError::Config(_),
            ..
        }
    ));
    Ok(())
}

#[tokio::test]
async fn missing_tool_aborts_setup() -> Result<()> {
    let mut session = Session::with_tool("exit 0")?;
    session.settings.tool.program = session.path().join("bin/missing").display().to_string();
    let mut plugin = session.plugin()?;
    let spec = spec(json!("default"));
    let mut context = RuntimeEnvContext::new("python");

    let err = plugin
        .create(None, &spec, &mut context, &NoopLogger)
        .await
        .expect_err("tool is missing");

    assert!(matches!(
        err,
        RuntimeEnvSetupError::Profiler {
            source: TranslateError::ToolNotFound { .. },
            ..
        }
    ));
    Ok(())
}

#[tokio::test]
async fn validation_report_is_cleaned_up() -> Result<()> {
    let session = Session::with_tool(
        r#"out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
touch "$out.nsys-rep""#,
    )?;
    let mut plugin = session.plugin()?;
    let spec = spec(json!({"-o": "run1"}));
    let mut context = RuntimeEnvContext::new("python");

    plugin.create(None, &spec, &mut context, &NoopLogger).await?;

    assert!(!session.logs_dir().join("empty.nsys-rep").exists());
    Ok(())
}
