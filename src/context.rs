//! Per-call cancellation context.
//!
//! Every driver operation takes a `&Context`. Timed holds race the hold
//! duration against cancellation so a driver can release whatever it asserted
//! before reporting `DriverError::Cancelled`.

use crate::error::{DriverError, Result};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct Context {
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels every clone of the `Context` it was created with.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl Context {
    /// A context that is never cancelled.
    pub fn background() -> Self {
        Self { cancel: None }
    }

    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { cancel: Some(rx) }, CancelHandle { tx })
    }

    pub fn is_cancelled(&self) -> bool {
        match &self.cancel {
            Some(rx) => *rx.borrow(),
            None => false,
        }
    }

    /// Resolves once the context is cancelled. Never resolves for a
    /// background context.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.cancel else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        // A dropped handle without a prior cancel means nobody can cancel anymore.
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Sleeps for `duration` unless the context is cancelled first.
    pub async fn hold(&self, duration: Duration) -> Result<()> {
        if self.is_cancelled() {
            return Err(DriverError::Cancelled);
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.cancelled() => Err(DriverError::Cancelled),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}
