//! Cooperative cancellation for a run
//!
//! A cloneable flag backed by a `watch` channel. The run loop polls it at
//! cycle boundaries and races it against the inter-cycle pause; it never
//! interrupts a strategy mid-execution.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Request cancellation. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation has been requested
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives as long as any clone of the signal, so an error
        // here cannot outlive `self`.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// Returns `true` when the full duration elapsed, `false` on cancellation.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => !self.is_triggered(),
            _ = self.cancelled() => false,
        }
    }

    /// Trigger on Ctrl+C
    pub fn listen_for_ctrl_c(&self) -> JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("Received Ctrl+C, initiating shutdown...");
                    signal.trigger();
                }
                Err(e) => {
                    error!("Error setting up signal handler: {}", e);
                }
            }
        })
    }

    /// Trigger once `deadline` has elapsed
    pub fn trigger_after(&self, deadline: Duration) -> JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(deadline) => {
                    info!("Run deadline of {:?} reached, cancelling", deadline);
                    signal.trigger();
                }
                _ = signal.cancelled() => {}
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sleep_completes_without_cancellation() {
        let signal = ShutdownSignal::new();
        assert!(signal.sleep(Duration::from_millis(5)).await);
        assert!(!signal.is_triggered());
    }

    #[tokio::test]
    async fn test_sleep_interrupted_by_trigger() {
        let signal = ShutdownSignal::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.trigger();
        });

        let started = std::time::Instant::now();
        assert!(!signal.sleep(Duration::from_secs(30)).await);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn test_sleep_after_trigger_returns_immediately() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        signal.trigger();
        assert!(!signal.sleep(Duration::from_secs(30)).await);
    }

    #[tokio::test]
    async fn test_trigger_after_deadline() {
        let signal = ShutdownSignal::new();
        let handle = signal.trigger_after(Duration::from_millis(5));
        signal.cancelled().await;
        assert!(signal.is_triggered());
        handle.await.unwrap();
    }
}
