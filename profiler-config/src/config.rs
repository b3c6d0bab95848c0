use serde::Deserialize;
use serde::Deserializer;
use serde_json::Value;
use thiserror::Error;

use crate::render::RenderedCommand;
use crate::render::ToolSpec;

/// Sentinel a user can pass instead of an option mapping to get
/// [`ProfilerConfig::default_config`].
pub const DEFAULT_CONFIG_SENTINEL: &str = "default";

/// Output file name used when a configuration does not pick one. `%p` is
/// expanded by the profiler to the worker pid.
pub const DEFAULT_OUTPUT_TEMPLATE: &str = "worker_process_%p";

const DEFAULT_OPTIONS: &[(&str, &str)] = &[
    ("-t", "cuda,cudnn,cublas,nvtx"),
    ("-o", DEFAULT_OUTPUT_TEMPLATE),
    ("--cudabacktrace", "all"),
    ("--stop-on-exit", "true"),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(
        "unsupported profiler configuration value {0:?}; expected \"default\" or a mapping of options"
    )]
    Unsupported(String),
    #[error("profiler configuration must be \"default\" or a mapping of options, got {0}")]
    NotAMapping(&'static str),
    #[error("profiler option name must not be empty")]
    EmptyOptionName,
    #[error("profiler option {0:?} must start with `-` or `--` followed by a name without `=`")]
    InvalidOptionName(String),
    #[error("profiler option {name:?} has a {kind} value; expected a string")]
    InvalidOptionValue { name: String, kind: &'static str },
}

/// One command-line option for the profiler tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfilerOption {
    /// `--name=value`
    Long { name: String, value: String },
    /// `-n value`
    Short { name: String, value: String },
}

impl ProfilerOption {
    /// Classifies `name` by its leading dashes. `name` keeps its dashes.
    pub fn parse(name: &str, value: impl Into<String>) -> Result<Self, ConfigError> {
        if name.is_empty() {
            return Err(ConfigError::EmptyOptionName);
        }
        let value = value.into();
        if let Some(rest) = name.strip_prefix("--") {
            // `--name=value` is split at the first `=` when read back.
            if rest.is_empty() || rest.contains('=') {
                return Err(ConfigError::InvalidOptionName(name.to_string()));
            }
            return Ok(Self::Long {
                name: name.to_string(),
                value,
            });
        }
        match name.strip_prefix('-') {
            Some(rest) if !rest.is_empty() => Ok(Self::Short {
                name: name.to_string(),
                value,
            }),
            _ => Err(ConfigError::InvalidOptionName(name.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Long { name, .. } | Self::Short { name, .. } => name,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Long { value, .. } | Self::Short { value, .. } => value,
        }
    }

    pub(crate) fn render_into(&self, tokens: &mut Vec<String>) {
        match self {
            Self::Long { name, value } => tokens.push(format!("{name}={value}")),
            Self::Short { name, value } => {
                tokens.push(name.clone());
                tokens.push(value.clone());
            }
        }
    }
}

/// Ordered profiler options. Order is kept from parsing through rendering
/// because the tool may care about it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilerConfig {
    options: Vec<ProfilerOption>,
}

impl ProfilerConfig {
    pub fn default_config() -> Self {
        let mut config = Self::default();
        for (name, value) in DEFAULT_OPTIONS {
            // The table is static and every name carries a dash.
            if let Ok(option) = ProfilerOption::parse(name, *value) {
                config.insert(option);
            }
        }
        config
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (name, value) in pairs {
            config.insert(ProfilerOption::parse(name.as_ref(), value)?);
        }
        Ok(config)
    }

    /// Adds `option`, replacing the value of an option with the same name in
    /// place so the original position is kept.
    pub fn insert(&mut self, option: ProfilerOption) {
        match self
            .options
            .iter_mut()
            .find(|existing| existing.name() == option.name())
        {
            Some(existing) => *existing = option,
            None => self.options.push(option),
        }
    }

    /// Returns a copy with `option` inserted. `self` is left untouched.
    pub fn with_option(&self, option: ProfilerOption) -> Self {
        let mut config = self.clone();
        config.insert(option);
        config
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.name() == name)
            .map(ProfilerOption::value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProfilerOption> {
        self.options.iter()
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// `[program, subcommand, options...]`.
    pub fn render(&self, tool: &ToolSpec) -> RenderedCommand {
        let mut tokens = vec![tool.program.clone(), tool.subcommand.clone()];
        for option in &self.options {
            option.render_into(&mut tokens);
        }
        RenderedCommand::new(tokens)
    }
}

/// The profiler entry of a runtime-env spec, after the sentinel has been
/// recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfilerConfigValue {
    Default,
    Options(ProfilerConfig),
}

impl ProfilerConfigValue {
    pub fn from_json(value: &Value) -> Result<Self, ConfigError> {
        match value {
            Value::String(s) if s == DEFAULT_CONFIG_SENTINEL => Ok(Self::Default),
            Value::String(s) => Err(ConfigError::Unsupported(s.clone())),
            Value::Object(map) => {
                let mut config = ProfilerConfig::default();
                for (name, value) in map {
                    config.insert(ProfilerOption::parse(name, option_value(name, value)?)?);
                }
                Ok(Self::Options(config))
            }
            other => Err(ConfigError::NotAMapping(json_kind(other))),
        }
    }

    pub fn into_config(self) -> ProfilerConfig {
        match self {
            Self::Default => ProfilerConfig::default_config(),
            Self::Options(config) => config,
        }
    }
}

impl<'de> Deserialize<'de> for ProfilerConfigValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// Scalars are accepted because YAML/JSON users rarely quote `true` or `3`.
fn option_value(name: &str, value: &Value) -> Result<String, ConfigError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ConfigError::InvalidOptionValue {
            name: name.to_string(),
            kind: json_kind(other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
