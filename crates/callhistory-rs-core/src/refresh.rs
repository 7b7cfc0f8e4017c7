//! Broadcast signal telling views that the call log changed.

use log::debug;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const REFRESH_BUFFER: usize = 16;

/// Why a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    /// The user asked for it.
    Manual,
    /// A call just ended and the log will contain it shortly.
    CallEnded,
    /// The provider reported a change.
    DataChanged,
}

/// Cloneable sender side of the refresh broadcast.
#[derive(Debug, Clone)]
pub struct RefreshSignal {
    sender: broadcast::Sender<RefreshReason>,
}

impl Default for RefreshSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(REFRESH_BUFFER);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshReason> {
        self.sender.subscribe()
    }

    /// Notify every subscriber. Returns how many were listening.
    pub fn fire(&self, reason: RefreshReason) -> usize {
        let listeners = self.sender.send(reason).unwrap_or(0);
        debug!("refresh fired (reason={reason:?}, listeners={listeners})");
        listeners
    }

    /// Fire after `delay`, giving the provider time to record a finished call.
    pub fn fire_after(&self, delay: Duration, reason: RefreshReason) -> JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            signal.fire(reason);
        })
    }
}
