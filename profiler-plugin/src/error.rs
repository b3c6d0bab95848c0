use rtenv_profiler_config::TranslateError;
use thiserror::Error;

/// Aborts environment setup for one worker.
#[derive(Debug, Error)]
pub enum RuntimeEnvSetupError {
    #[error("{plugin} profiling failed: {source}")]
    Profiler {
        plugin: String,
        #[source]
        source: TranslateError,
    },
    #[error("{plugin} profiling is only available on Linux")]
    UnsupportedPlatform { plugin: String },
    #[error("io error while {action}: {source}")]
    Io {
        action: &'static str,
        #[source]
        source: std::io::Error,
    },
}
