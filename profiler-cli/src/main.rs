//! Entry-point for the `rtenv-profiler` binary.
use clap::Parser;
use rtenv_profiler_cli::Cli;
use rtenv_profiler_cli::run_main;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    run_main(Cli::parse()).await
}
