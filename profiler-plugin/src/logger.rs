use std::fmt;

/// Sink for messages produced while setting up or tearing down a runtime env.
///
/// The host passes one into every lifecycle call so that setup logs can be
/// routed per job instead of through process-wide state.
pub trait SetupLogger: Send + Sync {
    fn info(&self, args: fmt::Arguments<'_>);

    fn warn(&self, args: fmt::Arguments<'_>);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl SetupLogger for NoopLogger {
    fn info(&self, _args: fmt::Arguments<'_>) {}

    fn warn(&self, _args: fmt::Arguments<'_>) {}
}

/// Forwards to `tracing` under the `rtenv_profiler` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl SetupLogger for TracingLogger {
    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "rtenv_profiler", "{args}");
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(target: "rtenv_profiler", "{args}");
    }
}
