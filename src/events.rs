// events.rs
use std::fmt;

use tokio::sync::mpsc;
use tracing::debug;

use crate::routes::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient message for the rider (the web client's toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{}] {}", tag, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Notice(Notice),
    Navigate(Route),
}

/// Sending half of the UI event stream. A dropped receiver only means no
/// one is watching any more, so sends never fail.
#[derive(Debug, Clone)]
pub struct UiEvents {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl UiEvents {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            debug!("UI event dropped, receiver closed");
        }
    }

    fn notice(&self, level: NoticeLevel, message: impl Into<String>) {
        self.emit(UiEvent::Notice(Notice {
            level,
            message: message.into(),
        }));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notice(NoticeLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notice(NoticeLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notice(NoticeLevel::Error, message);
    }

    pub fn navigate(&self, route: Route) {
        self.emit(UiEvent::Navigate(route));
    }
}

/// Drains whatever is buffered on a receiver without waiting.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<UiEvent>) -> Vec<UiEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
