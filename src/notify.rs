//! App-wide notification bus for transient success/error banners.
//!
//! The shell creates the bus at startup ([`NotificationBus::init`]) and tears it
//! down on exit. Components that need to report get a cloneable [`Notifier`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// Sending half handed to components.
#[derive(Clone)]
pub struct Notifier {
    tx: Sender<Notification>,
}

impl Notifier {
    pub fn dispatch(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            tracing::debug!("Notification dropped, bus already torn down");
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.dispatch(Notification::success(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.dispatch(Notification::error(message));
    }
}

/// A notification currently on screen.
#[derive(Debug, Clone)]
pub struct Banner {
    pub notification: Notification,
    pub shown_at: Instant,
}

pub struct NotificationBus {
    tx: Sender<Notification>,
    rx: Receiver<Notification>,
    banners: Vec<Banner>,
    ttl: Duration,
}

impl NotificationBus {
    /// Start the bus. Banners stay visible for `ttl`.
    pub fn init(ttl: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            banners: Vec::new(),
            ttl,
        }
    }

    pub fn notifier(&self) -> Notifier {
        Notifier {
            tx: self.tx.clone(),
        }
    }

    /// Move dispatched notifications onto the screen and expire old ones.
    pub fn pump(&mut self, now: Instant) {
        while let Ok(notification) = self.rx.try_recv() {
            match notification.kind {
                NotificationKind::Success => tracing::info!(message = %notification.message, "Notify"),
                NotificationKind::Error => tracing::warn!(message = %notification.message, "Notify"),
            }
            self.banners.push(Banner {
                notification,
                shown_at: now,
            });
        }

        let ttl = self.ttl;
        self.banners
            .retain(|b| now.saturating_duration_since(b.shown_at) < ttl);
    }

    pub fn banners(&self) -> &[Banner] {
        &self.banners
    }

    pub fn dismiss(&mut self, index: usize) {
        if index < self.banners.len() {
            self.banners.remove(index);
        }
    }

    /// Shut the bus down. Later dispatches from outstanding notifiers are dropped.
    pub fn teardown(self) {
        tracing::debug!(pending = self.banners.len(), "Notification bus torn down");
    }
}
