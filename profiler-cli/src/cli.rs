use clap::Args;
use clap::Parser;
use clap::Subcommand;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    /// Session directory that holds `runtime_resources/` and `logs/`.
    #[arg(long = "session-dir", value_name = "DIR", default_value = ".", global = true)]
    pub session_dir: PathBuf,

    /// Profiler settings file (TOML). Built-in defaults are used when omitted.
    #[arg(long = "config", short = 'c', value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate a profiler configuration and print the resulting worker
    /// launch command.
    Check(CheckArgs),

    /// Delete the local copy of a package URI and print the bytes reclaimed.
    DeleteUri(DeleteUriArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// `default`, an inline JSON object of options, or `@FILE` to read the
    /// JSON from a file.
    #[arg(value_name = "PROFILER_CONFIG")]
    pub profiler_config: String,

    /// Interpreter command the profiler is put in front of.
    #[arg(long = "interpreter", value_name = "CMD")]
    pub interpreter: Option<String>,
}

#[derive(Args, Debug)]
pub struct DeleteUriArgs {
    #[arg(value_name = "URI")]
    pub uri: String,
}
