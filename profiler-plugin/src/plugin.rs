use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use rtenv_packaging::LocalPackageStore;
use rtenv_packaging::PackageError;
use rtenv_packaging::PackageStore;
use rtenv_profiler_config::DEFAULT_OUTPUT_TEMPLATE;
use rtenv_profiler_config::RenderedCommand;
use rtenv_profiler_config::TranslateError;
use rtenv_profiler_config::validate_and_render;
use rtenv_utils_dir::get_directory_size_bytes;
use rtenv_utils_dir::try_to_create_directory;

use crate::error::RuntimeEnvSetupError;
use crate::logger::SetupLogger;
use crate::runtime_env::RuntimeEnvContext;
use crate::runtime_env::RuntimeEnvSpec;
use crate::settings::ProfilerSettings;

const LOGS_DIR_NAME: &str = "logs";

/// Lifecycle the runtime-env host drives for each worker:
/// `create`, then `modify_context`, then any number of `delete_uri` calls.
#[async_trait]
pub trait RuntimeEnvPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// Prepares the plugin for one worker and returns the number of bytes
    /// it added under the resources dir.
    async fn create(
        &mut self,
        uri: Option<&str>,
        runtime_env: &RuntimeEnvSpec,
        context: &mut RuntimeEnvContext,
        logger: &dyn SetupLogger,
    ) -> Result<u64, RuntimeEnvSetupError>;

    fn modify_context(
        &self,
        uris: &[String],
        runtime_env: &RuntimeEnvSpec,
        context: &mut RuntimeEnvContext,
        logger: &dyn SetupLogger,
    );

    /// Deletes the local copy of `uri` and returns the bytes reclaimed.
    fn delete_uri(&self, uri: &str, logger: &dyn SetupLogger) -> Result<u64, PackageError>;
}

/// Runs worker processes under a profiler such as `nsys profile`.
pub struct ProfilerPlugin {
    settings: ProfilerSettings,
    resources_dir: PathBuf,
    logs_dir: PathBuf,
    store: Arc<dyn PackageStore>,
    command: Option<RenderedCommand>,
}

impl ProfilerPlugin {
    /// `resources_root` is the shared runtime-env resources directory of a
    /// session, e.g. `<session>/runtime_resources`. Reports go to
    /// `<session>/logs/<name>`.
    pub fn new(
        resources_root: &Path,
        settings: ProfilerSettings,
    ) -> Result<Self, RuntimeEnvSetupError> {
        Self::with_store(resources_root, settings, Arc::new(LocalPackageStore))
    }

    pub fn with_store(
        resources_root: &Path,
        settings: ProfilerSettings,
        store: Arc<dyn PackageStore>,
    ) -> Result<Self, RuntimeEnvSetupError> {
        let resources_dir = resources_root.join(&settings.name);
        let session_dir = resources_root.parent().unwrap_or(resources_root);
        let logs_dir = session_dir.join(LOGS_DIR_NAME).join(&settings.name);
        for (action, dir) in [
            ("creating profiler resources dir", &resources_dir),
            ("creating profiler logs dir", &logs_dir),
        ] {
            try_to_create_directory(dir)
                .map_err(|source| RuntimeEnvSetupError::Io { action, source })?;
        }
        Ok(Self {
            settings,
            resources_dir,
            logs_dir,
            store,
            command: None,
        })
    }

    pub fn resources_dir(&self) -> &Path {
        &self.resources_dir
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// The command stored by the last `create`, if profiling was requested.
    pub fn command(&self) -> Option<&RenderedCommand> {
        self.command.as_ref()
    }

    fn setup_error(&self, source: TranslateError) -> RuntimeEnvSetupError {
        RuntimeEnvSetupError::Profiler {
            plugin: self.settings.name.clone(),
            source,
        }
    }
}

#[async_trait]
impl RuntimeEnvPlugin for ProfilerPlugin {
    fn name(&self) -> &str {
        &self.settings.name
    }

    async fn create(
        &mut self,
        _uri: Option<&str>,
        runtime_env: &RuntimeEnvSpec,
        _context: &mut RuntimeEnvContext,
        logger: &dyn SetupLogger,
    ) -> Result<u64, RuntimeEnvSetupError> {
        self.command = None;
        let Some(raw) = runtime_env.requested(&self.settings.name) else {
            return Ok(0);
        };
        if !cfg!(target_os = "linux") {
            return Err(RuntimeEnvSetupError::UnsupportedPlatform {
                plugin: self.settings.name.clone(),
            });
        }

        let tool = &self.settings.tool;
        let (config, _) = match validate_and_render(raw, tool, &self.logs_dir).await {
            Ok(validated) => validated,
            Err(err) => {
                logger.warn(format_args!("{err}"));
                return Err(self.setup_error(err));
            }
        };

        // Anchor reports under the logs dir so every worker's output can be
        // collected from one place.
        let output = config
            .get(&tool.output_option)
            .unwrap_or(DEFAULT_OUTPUT_TEMPLATE);
        let output_path = self.logs_dir.join(output);
        let output_option = tool
            .output_path_option(output_path.display().to_string())
            .map_err(|err| self.setup_error(err.into()))?;
        let command = config.with_option(output_option).render(tool);

        logger.info(format_args!(
            "{} profiling enabled: {command}",
            self.settings.name
        ));
        self.command = Some(command);
        Ok(0)
    }

    fn modify_context(
        &self,
        _uris: &[String],
        _runtime_env: &RuntimeEnvSpec,
        context: &mut RuntimeEnvContext,
        logger: &dyn SetupLogger,
    ) {
        if context.py_executable.is_empty() {
            context.py_executable = self.settings.interpreter.clone();
        }
        let Some(command) = &self.command else {
            return;
        };
        logger.info(format_args!("Running {} profiler", self.settings.name));
        context.py_executable = format!("{} {}", command.to_prefix(), context.py_executable);
    }

    fn delete_uri(&self, uri: &str, logger: &dyn SetupLogger) -> Result<u64, PackageError> {
        logger.info(format_args!("Got request to delete {} URI {uri}", self.settings.name));
        // Measure first: the directory is gone once the store deletes it.
        let local_dir = self.store.local_dir(uri, &self.resources_dir)?;
        let local_dir_size = get_directory_size_bytes(&local_dir);

        if !self.store.delete(uri, &self.resources_dir)? {
            logger.warn(format_args!("Tried to delete nonexistent URI: {uri}."));
            return Ok(0);
        }
        Ok(local_dir_size)
    }
}
