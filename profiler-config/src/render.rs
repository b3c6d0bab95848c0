use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::config::ConfigError;
use crate::config::ProfilerOption;

/// How to invoke the profiler tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSpec {
    /// Binary name looked up on `PATH`, or a path to it.
    pub program: String,
    pub subcommand: String,
    /// Option whose value names the report the tool writes.
    pub output_option: String,
    /// Extension the tool appends to the output path.
    pub artifact_extension: String,
    /// Command profiled while checking a configuration. It should exit
    /// immediately.
    pub noop_target: Vec<String>,
}

impl Default for ToolSpec {
    fn default() -> Self {
        Self {
            program: "nsys".to_string(),
            subcommand: "profile".to_string(),
            output_option: "-o".to_string(),
            artifact_extension: "nsys-rep".to_string(),
            noop_target: vec!["python".to_string(), "-c".to_string(), String::new()],
        }
    }
}

impl ToolSpec {
    pub fn output_path_option(
        &self,
        value: impl Into<String>,
    ) -> Result<ProfilerOption, ConfigError> {
        ProfilerOption::parse(&self.output_option, value)
    }
}

/// Full profiler invocation, ready to be put in front of a worker command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    tokens: Vec<String>,
}

impl RenderedCommand {
    pub(crate) fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }

    /// Tokens joined by single spaces.
    pub fn to_prefix(&self) -> String {
        self.tokens.join(" ")
    }

    /// Recovers `(name, value)` pairs from the option tokens that follow the
    /// program and subcommand.
    pub fn parse_options(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut tokens = self.tokens.iter().skip(2);
        while let Some(token) = tokens.next() {
            if token.starts_with("--") {
                let (name, value) = token.split_once('=').unwrap_or((token.as_str(), ""));
                pairs.push((name.to_string(), value.to_string()));
            } else {
                let value = tokens.next().cloned().unwrap_or_default();
                pairs.push((token.clone(), value));
            }
        }
        pairs
    }
}

impl fmt::Display for RenderedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_prefix())
    }
}
