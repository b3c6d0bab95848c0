use std::path::Path;
use std::path::PathBuf;

use rtenv_profiler_config::ToolSpec;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Host-side settings for the profiler plugin, typically read from a TOML
/// file:
///
/// ```toml
/// name = "nsight"
/// interpreter = "python"
///
/// [tool]
/// program = "/usr/local/cuda/bin/nsys"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerSettings {
    /// Runtime-env key the plugin answers to. Also names its resources and
    /// logs subdirectories.
    pub name: String,
    /// Interpreter token used when the context does not carry one yet.
    pub interpreter: String,
    pub tool: ToolSpec,
}

impl Default for ProfilerSettings {
    fn default() -> Self {
        Self {
            name: "nsight".to_string(),
            interpreter: "python".to_string(),
            tool: ToolSpec::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read profiler settings {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse profiler settings: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ProfilerSettings {
    pub fn from_toml(contents: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }
}
