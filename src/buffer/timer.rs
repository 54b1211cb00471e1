use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Repeating task that invokes a flush callback every period until cancelled.
///
/// Cancellation is deterministic: once [`FlushTimer::stop`] returns, the
/// callback is not running and will never run again. A callback already in
/// progress when the timer is stopped is allowed to finish.
#[derive(Debug)]
pub struct FlushTimer {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl FlushTimer {
    /// Arms the timer on the current tokio runtime. The first tick fires one
    /// full period after arming.
    pub fn start<F, Fut>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = child.cancelled() => break,
                    // A tick in progress always runs to completion.
                    _ = ticker.tick() => on_tick().await,
                }
            }
            debug!("Flush timer stopped");
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels the timer and waits for its task to finish.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!("Flush timer task panicked: {}", e);
                }
            }
        }
    }
}

impl Drop for FlushTimer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_period() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let timer = FlushTimer::start(Duration::from_millis(100), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        timer.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_stop() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let timer = FlushTimer::start(Duration::from_millis(50), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(120)).await;
        timer.stop().await;
        let seen = ticks.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }
}
