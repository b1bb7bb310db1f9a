//! Injected progress reporting.
//!
//! Long-running operations emit structured events to a caller-supplied
//! sink instead of accumulating log lines in process state. The default
//! sink discards everything.

/// Severity of a progress event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressLevel {
    Info,
    Warn,
    Error,
}

/// One step of an operation, described for the caller's UI or logs.
#[derive(Clone, Debug)]
pub struct ProgressEvent {
    pub level: ProgressLevel,
    pub message: String,
}

impl ProgressEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ProgressLevel::Info,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: ProgressLevel::Warn,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ProgressLevel::Error,
            message: message.into(),
        }
    }
}

/// Receives progress events from encrypt and decrypt operations.
///
/// Implementations must tolerate calls from any thread. Events are not
/// retained anywhere else; a sink that drops them loses them.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Sink that discards every event.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Sink that forwards events to the `tracing` subscriber.
pub struct TracingProgressSink;

impl ProgressSink for TracingProgressSink {
    fn emit(&self, event: ProgressEvent) {
        match event.level {
            ProgressLevel::Info => tracing::info!("{}", event.message),
            ProgressLevel::Warn => tracing::warn!("{}", event.message),
            ProgressLevel::Error => tracing::error!("{}", event.message),
        }
    }
}
