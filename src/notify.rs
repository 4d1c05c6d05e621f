//! Fire-and-forget status messages for whoever is watching the scan.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: &'static str,
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    pub fn info(id: &'static str, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
            severity: Severity::Info,
        }
    }

    pub fn warning(id: &'static str, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn error(id: &'static str, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

pub mod ids {
    pub const STARTED_SCAN: &str = "started-scan";
    pub const SCAN_STATUS: &str = "scan-status";
    pub const COMPLETED_SCAN: &str = "completed-scan";
    pub const ARTWORK_STATUS: &str = "artwork-status";
}

pub trait Notifier: Send + Sync {
    /// Must not block and must not fail.
    fn post(&self, notice: Notice);
}

/// Forwards notices to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn post(&self, notice: Notice) {
        match notice.severity {
            Severity::Info => log::info!("[{}] {}", notice.id, notice.message),
            Severity::Warning => log::warn!("[{}] {}", notice.id, notice.message),
            Severity::Error => log::error!("[{}] {}", notice.id, notice.message),
        }
    }
}

#[cfg(test)]
pub use testing::RecordingNotifier;
