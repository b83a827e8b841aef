use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures::future;
use tokio::sync::watch;

/// Returned by any suspension point that observed a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Operation cancelled")
    }
}

impl std::error::Error for Cancelled {}

pub fn is_cancelled(e: &anyhow::Error) -> bool {
    e.downcast_ref::<Cancelled>().is_some()
}

#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn stop_on_ctrl_c(self) {
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    log::warn!("Interrupted, stopping");
                    self.stop();
                }
                Err(e) => log::error!("Couldn't listen for SIGINT got: {e}"),
            }
        });
    }
}

#[derive(Debug, Clone)]
pub struct Stop {
    rx: watch::Receiver<bool>,
}

pub fn stop_pair() -> (StopHandle, Stop) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, Stop { rx })
}

impl Stop {
    /// A signal that never fires
    pub fn never() -> Self {
        stop_pair().1
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop was requested, pends forever otherwise.
    pub async fn stopped(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender gone without stopping
                return future::pending().await;
            }
        }
    }
}

/// Runs `fut` unless a stop is requested first.
pub async fn guarded<F>(fut: F, stop: &Stop) -> anyhow::Result<F::Output>
where
    F: Future,
{
    if stop.is_stopped() {
        return Err(Cancelled.into());
    }
    tokio::select! {
        biased;
        _ = stop.stopped() => Err(Cancelled.into()),
        out = fut => Ok(out),
    }
}

/// Simulated I/O wait. Always suspends once, even for zero.
pub async fn pause(ms: u64, stop: &Stop) -> anyhow::Result<()> {
    guarded(tokio::time::sleep(Duration::from_millis(ms)), stop).await
}
