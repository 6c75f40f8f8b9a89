//! Ephemeral user-facing notices for the outcome of asynchronous actions.
//!
//! Notices expire on their own after a short TTL; the event loop prunes the
//! board once per iteration and the status bar shows whatever is left.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const DEFAULT_TTL: Duration = Duration::from_secs(5);
const MAX_NOTICES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    posted_at: Instant,
}

/// Bounded queue of short-lived notices, newest last.
#[derive(Debug)]
pub struct NoticeBoard {
    notices: VecDeque<Notice>,
    ttl: Duration,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl NoticeBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            notices: VecDeque::new(),
            ttl,
        }
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(NoticeKind::Success, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeKind::Error, message.into());
    }

    fn push(&mut self, kind: NoticeKind, message: String) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            kind,
            message,
            posted_at: Instant::now(),
        });
    }

    /// Drop notices older than the TTL.
    pub fn prune(&mut self) {
        let ttl = self.ttl;
        let now = Instant::now();
        self.notices
            .retain(|notice| now.duration_since(notice.posted_at) < ttl);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.back()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}
