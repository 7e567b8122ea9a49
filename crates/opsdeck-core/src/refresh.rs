// ── Polling refresh scheduler ──
//
// One scheduler per dashboard panel. Owns at most one timer task; every
// reconfiguration cancels the previous task before (maybe) starting a
// new one, so two timers can never race for the same panel.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// The data-loading function a panel hands to its scheduler.
pub type Loader = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

struct TimerTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic refresh driver for a single dashboard panel.
///
/// When auto-refresh is on, the loader runs once per interval. A manual
/// [`refresh_now`](Self::refresh_now) runs the loader immediately
/// without disturbing the timer schedule. Dropping the scheduler always
/// cancels the timer -- cleanup is mandatory, not best-effort.
pub struct RefreshScheduler {
    loader: Loader,
    timer: Option<TimerTask>,
}

impl RefreshScheduler {
    /// Create a scheduler with no timer running.
    pub fn new(loader: Loader) -> Self {
        Self {
            loader,
            timer: None,
        }
    }

    /// Convenience constructor from a closure returning a future.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        Self::new(Arc::new(move || Box::pin(f())))
    }

    /// Apply the panel's auto-refresh setting.
    ///
    /// Any existing timer is cancelled first; a new one is started only
    /// when `auto_refresh` is true and the interval is non-zero. Calling
    /// this again with a different interval therefore replaces the timer
    /// rather than stacking a second one.
    pub fn configure(&mut self, auto_refresh: bool, interval: Duration) {
        self.stop();

        if !auto_refresh || interval.is_zero() {
            return;
        }

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let loader = Arc::clone(&self.loader);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    biased;
                    () = task_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        loader().await;
                    }
                }
            }
        });

        debug!(interval_ms = interval.as_millis() as u64, "auto-refresh timer started");
        self.timer = Some(TimerTask { cancel, handle });
    }

    /// Run the loader once, immediately. The timer schedule is untouched.
    pub async fn refresh_now(&self) {
        (self.loader)().await;
    }

    /// Cancel the timer if one is running.
    pub fn stop(&mut self) {
        if let Some(task) = self.timer.take() {
            task.cancel.cancel();
            task.handle.abort();
            debug!("auto-refresh timer cancelled");
        }
    }

    /// Whether a timer is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_scheduler() -> (RefreshScheduler, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let loader_count = Arc::clone(&count);
        let scheduler = RefreshScheduler::from_fn(move || {
            let c = Arc::clone(&loader_count);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });
        (scheduler, count)
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_once_per_interval() {
        let (mut scheduler, count) = counting_scheduler();
        scheduler.configure(true, Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(16)).await;
        tokio::task::yield_now().await;

        // 3 intervals elapsed -> exactly 3 loads, no immediate first fire
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn disabling_auto_refresh_cancels_timer() {
        let (mut scheduler, count) = counting_scheduler();
        scheduler.configure(true, Duration::from_secs(5));
        assert!(scheduler.is_running());

        scheduler.configure(false, Duration::from_secs(5));
        assert!(!scheduler.is_running());

        tokio::time::sleep(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn changing_interval_replaces_timer() {
        let (mut scheduler, count) = counting_scheduler();
        scheduler.configure(true, Duration::from_secs(60));

        // Reconfigure before the first 60s tick -- the old timer must die.
        scheduler.configure(true, Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(21)).await;
        tokio::task::yield_now().await;

        // Only the 5s timer fired: 4 ticks. A leaked 60s timer would not
        // have fired yet either, but a leaked second 5s timer would double
        // the count.
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_now_does_not_disturb_schedule() {
        let (mut scheduler, count) = counting_scheduler();
        scheduler.configure(true, Duration::from_secs(10));

        scheduler.refresh_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_now_works_without_timer() {
        let (scheduler, count) = counting_scheduler();
        scheduler.refresh_now().await;
        scheduler.refresh_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_timer() {
        let (mut scheduler, count) = counting_scheduler();
        scheduler.configure(true, Duration::from_secs(5));
        drop(scheduler);

        tokio::time::sleep(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
