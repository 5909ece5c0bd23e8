//! Cooperative cancellation shared by the scheduler and the reconciler.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{ReconcileError, Result};

/// Cloneable shutdown signal. Once triggered it stays triggered.
#[derive(Debug, Clone)]
pub struct Shutdown {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Signals every clone to stop.
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Completes once the signal has been triggered.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as `self`, so this only returns once triggered.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }

    /// Sleeps for `duration`, returning early with `false` if cancelled.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.cancelled() => false,
        }
    }

    /// Runs `future` to completion unless the signal fires first.
    pub async fn guard<F, T>(&self, future: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        if self.is_triggered() {
            return Err(ReconcileError::Cancelled);
        }
        tokio::select! {
            output = future => Ok(output),
            _ = self.cancelled() => Err(ReconcileError::Cancelled),
        }
    }
}
