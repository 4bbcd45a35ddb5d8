//! Short-lived user-facing messages.
//!
//! [`NotificationQueue`] is the producer side: anything can post, every
//! subscriber receives every notification. [`NotificationBoard`] is a
//! consumer-side list of what is currently visible.

use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tokio::{sync::broadcast, time::Instant};

pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    /// `0` means the notification stays until dismissed.
    pub duration_ms: u64,
}

impl Notification {
    pub fn is_persistent(&self) -> bool {
        self.duration_ms == 0
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Debug)]
pub struct NotificationQueue {
    next_id: AtomicU64,
    default_duration: Duration,
    sender: broadcast::Sender<Notification>,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}

impl NotificationQueue {
    pub fn new(default_duration: Duration) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { next_id: AtomicU64::new(0), default_duration, sender }
    }

    /// Assigns the next id and broadcasts the notification to current subscribers.
    pub fn post(
        &self,
        message: impl Into<String>,
        severity: Severity,
        duration: Option<Duration>,
    ) -> Notification {
        let duration = duration.unwrap_or(self.default_duration);
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            message: message.into(),
            severity,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        };

        tracing::debug!(
            id = notification.id,
            severity = %notification.severity,
            message = %notification.message,
            "notification posted"
        );

        // No subscribers is fine: nobody is looking.
        let _ = self.sender.send(notification.clone());
        notification
    }

    pub fn info(&self, message: impl Into<String>, duration: Option<Duration>) -> Notification {
        self.post(message, Severity::Info, duration)
    }

    pub fn success(&self, message: impl Into<String>, duration: Option<Duration>) -> Notification {
        self.post(message, Severity::Success, duration)
    }

    pub fn warning(&self, message: impl Into<String>, duration: Option<Duration>) -> Notification {
        self.post(message, Severity::Warning, duration)
    }

    pub fn error(&self, message: impl Into<String>, duration: Option<Duration>) -> Notification {
        self.post(message, Severity::Error, duration)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

#[derive(Debug, Clone)]
struct Shown {
    notification: Notification,
    expires_at: Option<Instant>,
}

/// Notifications currently on screen, in arrival order.
#[derive(Debug, Default)]
pub struct NotificationBoard {
    shown: Vec<Shown>,
}

impl NotificationBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notification: Notification, now: Instant) {
        let expires_at = (!notification.is_persistent()).then(|| now + notification.duration());
        self.shown.push(Shown { notification, expires_at });
    }

    /// Removes a notification by id; returns whether it was visible.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.shown.len();
        self.shown.retain(|s| s.notification.id != id);
        self.shown.len() != before
    }

    /// Drops every timed notification whose duration has elapsed at `now`.
    pub fn expire(&mut self, now: Instant) -> Vec<Notification> {
        let (expired, kept): (Vec<_>, Vec<_>) = self
            .shown
            .drain(..)
            .partition(|s| s.expires_at.is_some_and(|at| at <= now));
        self.shown = kept;
        expired.into_iter().map(|s| s.notification).collect()
    }

    /// Earliest pending expiry, if any timed notification is visible.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.shown.iter().filter_map(|s| s.expires_at).min()
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.shown.iter().map(|s| &s.notification)
    }

    pub fn len(&self) -> usize {
        self.shown.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_across_severities() {
        let queue = NotificationQueue::default();

        let a = queue.error("a", None);
        let b = queue.info("b", None);
        let c = queue.success("c", Some(Duration::ZERO));
        let d = queue.warning("d", None);

        assert!(a.id < b.id && b.id < c.id && c.id < d.id);
    }

    #[test]
    fn convenience_forms_use_default_duration() {
        let queue = NotificationQueue::default();

        let n = queue.error("boom", None);

        assert_eq!(n.severity, Severity::Error);
        assert_eq!(n.duration_ms, 5000);
        assert!(!n.is_persistent());
    }

    #[test]
    fn does_not_deduplicate() {
        let queue = NotificationQueue::default();
        let mut rx = queue.subscribe();

        queue.info("same", None);
        queue.info("same", None);

        let first = rx.try_recv().expect("first");
        let second = rx.try_recv().expect("second");
        assert_eq!(first.message, second.message);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn every_subscriber_receives_every_notification() {
        let queue = NotificationQueue::default();
        let mut rx1 = queue.subscribe();
        let mut rx2 = queue.subscribe();

        let posted = queue.warning("careful", None);

        assert_eq!(rx1.try_recv().expect("rx1"), posted);
        assert_eq!(rx2.try_recv().expect("rx2"), posted);
    }

    #[test]
    fn persistent_notification_stays_until_dismissed() {
        let queue = NotificationQueue::default();
        let mut board = NotificationBoard::new();
        let start = Instant::now();

        let sticky = queue.error("sticky", Some(Duration::ZERO));
        board.push(sticky.clone(), start);

        assert!(board.expire(start + Duration::from_secs(3600)).is_empty());
        assert_eq!(board.len(), 1);
        assert_eq!(board.next_expiry(), None);

        assert!(board.dismiss(sticky.id));
        assert!(board.is_empty());
        assert!(!board.dismiss(sticky.id));
    }

    #[test]
    fn timed_notification_expires_after_its_duration() {
        let queue = NotificationQueue::default();
        let mut board = NotificationBoard::new();
        let start = Instant::now();

        let timed = queue.info("hello", None);
        board.push(timed.clone(), start);

        assert!(board.expire(start + Duration::from_millis(4999)).is_empty());
        assert_eq!(board.next_expiry(), Some(start + Duration::from_millis(5000)));

        let expired = board.expire(start + Duration::from_millis(5000));
        assert_eq!(expired, vec![timed]);
        assert!(board.is_empty());
    }

    #[test]
    fn expire_keeps_arrival_order_of_survivors() {
        let queue = NotificationQueue::default();
        let mut board = NotificationBoard::new();
        let start = Instant::now();

        board.push(queue.info("short", Some(Duration::from_millis(10))), start);
        board.push(queue.info("sticky", Some(Duration::ZERO)), start);
        board.push(queue.info("long", Some(Duration::from_secs(60))), start);

        board.expire(start + Duration::from_secs(1));

        let messages: Vec<_> = board.visible().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["sticky", "long"]);
    }
}
