//! Operator notices
//!
//! Flash-style messages queued for a backend operator and shown on their next visit to
//! the administrative area. Used to surface binding store outages to operators without
//! exposing them to public visitors.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

/// Notices kept per operator before the oldest are dropped
const MAX_NOTICES_PER_OPERATOR: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// Pending notices indexed by operator ID
#[derive(Default)]
pub struct OperatorNotices {
    queues: RwLock<HashMap<Uuid, Vec<Notice>>>,
}

impl OperatorNotices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notice for an operator. A notice repeating the previous one is dropped.
    pub fn push(&self, operator_id: Uuid, notice: Notice) {
        let Ok(mut queues) = self.queues.write() else {
            return;
        };
        let queue = queues.entry(operator_id).or_default();

        if queue
            .last()
            .is_some_and(|last| last.level == notice.level && last.message == notice.message)
        {
            return;
        }

        queue.push(notice);
        if queue.len() > MAX_NOTICES_PER_OPERATOR {
            let excess = queue.len() - MAX_NOTICES_PER_OPERATOR;
            queue.drain(..excess);
        }
    }

    /// Take every pending notice for an operator
    pub fn drain(&self, operator_id: Uuid) -> Vec<Notice> {
        self.queues
            .write()
            .ok()
            .and_then(|mut queues| queues.remove(&operator_id))
            .unwrap_or_default()
    }

    /// Number of pending notices for an operator
    pub fn pending(&self, operator_id: Uuid) -> usize {
        self.queues
            .read()
            .ok()
            .and_then(|queues| queues.get(&operator_id).map(Vec::len))
            .unwrap_or(0)
    }
}
