//! Processes pending requests on a fixed interval.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use log::debug;
use log::error;
use log::info;
use log::warn;
use tokio::sync::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::service::Services;

/// Runs one batch per tick. A batch always finishes before the next one starts.
pub struct RequestPoller {
    services: Arc<Services>,
    poll_interval: Duration,
    running: AtomicBool,
    wake: Notify,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl RequestPoller {
    pub fn new(services: Arc<Services>, poll_interval: Duration) -> Arc<Self> {
        info!("Polling for requests every {poll_interval:?}");
        Arc::new(Self {
            services,
            poll_interval,
            running: AtomicBool::new(false),
            wake: Notify::new(),
            handle: Mutex::new(None),
        })
    }

    /// Spawns the polling loop; a no-op when it already runs.
    pub fn start(self: Arc<Self>) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.poll_interval.is_zero(),
            "poll interval must be non-zero"
        );
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let poller = self.clone();
        let handle = tokio::spawn(async move { poller.run().await });
        match self.handle.try_lock() {
            Ok(mut slot) => *slot = Some(handle),
            Err(_) => warn!("Poller handle is busy, shutdown will not wait for the loop."),
        }
        Ok(())
    }

    /// Asks the loop to exit. A batch in flight is not interrupted.
    pub fn stop(self: Arc<Self>) -> anyhow::Result<()> {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Stopping request poller.");
            self.wake.notify_one();
        }
        Ok(())
    }

    /// Stops the loop and waits for the batch in flight, if any.
    pub async fn shutdown(self: Arc<Self>) -> anyhow::Result<()> {
        self.clone().stop()?;
        if let Some(handle) = self.handle.lock().await.take() {
            handle.await?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.wake.notified() => {}
            }
            if !self.is_running() {
                break;
            }
            debug!("Checking for pending requests.");
            if let Err(e) = self.services.run_batch().await {
                error!("Request batch failed: {e}");
            }
        }
        info!("Request poller stopped.");
    }
}
