//! Sink adapters. Implement CleanupSink.
//!
//! `TracingSink` is the default used by the binary; `MemorySink` keeps notices in memory
//! for tests and dry runs.

use crate::ports::CleanupSink;
use std::sync::Mutex;
use tracing::{error, info};

/// Forwards notices to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl CleanupSink for TracingSink {
    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn error(&self, message: &str, detail: &str) {
        error!(detail, "{}", message);
    }
}

/// A notice captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error { message: String, detail: String },
}

/// Records every notice in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    notices: Mutex<Vec<Notice>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.lock().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|n| match n {
                Notice::Info(m) => Some(m.clone()),
                Notice::Error { .. } => None,
            })
            .collect()
    }

    /// `(message, detail)` pairs.
    pub fn errors(&self) -> Vec<(String, String)> {
        self.lock()
            .iter()
            .filter_map(|n| match n {
                Notice::Error { message, detail } => Some((message.clone(), detail.clone())),
                Notice::Info(_) => None,
            })
            .collect()
    }

    pub fn has_info(&self, message: &str) -> bool {
        self.lock()
            .iter()
            .any(|n| matches!(n, Notice::Info(m) if m == message))
    }

    // A poisoned lock still holds valid notices; recording must never panic.
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Notice>> {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CleanupSink for MemorySink {
    fn info(&self, message: &str) {
        self.lock().push(Notice::Info(message.to_string()));
    }

    fn error(&self, message: &str, detail: &str) {
        self.lock().push(Notice::Error {
            message: message.to_string(),
            detail: detail.to_string(),
        });
    }
}
