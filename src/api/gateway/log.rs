use tracing::Level;

/// Sink for the gateway's own log lines.
pub trait EventLog: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

/// Forwards to the global `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl EventLog for TracingLog {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "gateway", "{message}"),
            Level::WARN => tracing::warn!(target: "gateway", "{message}"),
            Level::INFO => tracing::info!(target: "gateway", "{message}"),
            Level::DEBUG => tracing::debug!(target: "gateway", "{message}"),
            _ => tracing::trace!(target: "gateway", "{message}"),
        }
    }
}
