//! Settings change notification.
//!
//! [`SettingsNotifier`] keeps an ordered list of subscriber channels.  A
//! publish walks that list in registration order and pushes the new
//! [`Settings`] into each channel, so every subscriber sees every event
//! exactly once and in publish order.
//!
//! Each subscriber owns an unbounded channel: a slow consumer never loses an
//! event and never blocks the publisher.  Subscribers that join late do not
//! see earlier events.  Dropping a [`SettingsSubscription`] closes its
//! channel, and the closed entry is pruned on the next publish.

use std::sync::{Mutex, PoisonError};

use nearsend_core::Settings;
use tokio::sync::mpsc;
use tracing::debug;

/// Fan-out of settings-changed events to every live subscriber.
#[derive(Default)]
pub struct SettingsNotifier {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Settings>>>,
}

/// Receiving end of one subscription.
#[derive(Debug)]
pub struct SettingsSubscription {
    rx: mpsc::UnboundedReceiver<Settings>,
}

impl SettingsNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber.  It receives only events published after
    /// this call returns.
    pub fn subscribe(&self) -> SettingsSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        SettingsSubscription { rx }
    }

    /// Delivers `settings` to every live subscriber.
    ///
    /// Returns the number of subscribers that received the event.
    pub fn publish(&self, settings: &Settings) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| tx.send(settings.clone()).is_ok());
        debug!("settings change delivered to {} subscriber(s)", subscribers.len());
        subscribers.len()
    }

    /// Number of subscribers whose receiving end is still alive.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<mpsc::UnboundedSender<Settings>>> {
        // A panic while holding the lock cannot leave the Vec half-modified.
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SettingsSubscription {
    /// Waits for the next event.  Returns `None` once the notifier is gone
    /// and every queued event has been taken.
    pub async fn recv(&mut self) -> Option<Settings> {
        self.rx.recv().await
    }

    /// Takes the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Settings> {
        self.rx.try_recv().ok()
    }
}
