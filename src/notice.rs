use serde::Serialize;
use tokio::sync::broadcast;

const NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient message for the user, e.g. the result of adding a guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Fan-out channel for notices. Sending with no subscribers is not an error.
#[derive(Debug, Clone)]
pub struct Notices {
    tx: broadcast::Sender<Notice>,
}

impl Notices {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn flash(&self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice {
            level,
            message: message.into(),
        };
        tracing::debug!("Notice ({:?}): {}", notice.level, notice.message);
        let _ = self.tx.send(notice);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.flash(NoticeLevel::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.flash(NoticeLevel::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.flash(NoticeLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.flash(NoticeLevel::Error, message);
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self::new()
    }
}
