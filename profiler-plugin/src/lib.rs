//! Runtime-env plugin that launches worker processes under a profiler and
//! reclaims the packages it is handed.

mod error;
mod logger;
mod plugin;
mod runtime_env;
mod settings;

pub use error::RuntimeEnvSetupError;
pub use logger::NoopLogger;
pub use logger::SetupLogger;
pub use logger::TracingLogger;
pub use plugin::ProfilerPlugin;
pub use plugin::RuntimeEnvPlugin;
pub use runtime_env::RuntimeEnvContext;
pub use runtime_env::RuntimeEnvSpec;
pub use settings::ProfilerSettings;
pub use settings::SettingsError;
