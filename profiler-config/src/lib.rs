//! Translates a user profiler configuration into an `nsys profile` style
//! command line, checking it against the real tool first.

mod config;
mod render;
mod validate;

pub use config::ConfigError;
pub use config::DEFAULT_CONFIG_SENTINEL;
pub use config::DEFAULT_OUTPUT_TEMPLATE;
pub use config::ProfilerConfig;
pub use config::ProfilerConfigValue;
pub use config::ProfilerOption;
pub use render::RenderedCommand;
pub use render::ToolSpec;
pub use validate::THROWAWAY_OUTPUT_NAME;
pub use validate::TranslateError;
pub use validate::check_config;
pub use validate::validate_and_render;
