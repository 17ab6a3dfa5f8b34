//! Periodic refresh coordination for a polled monitor endpoint.
//!
//! [`RefreshCoordinator`] owns a background timer, serializes manual and
//! scheduled fetches, and publishes the latest result through a
//! [`watch`] channel. Every fetch carries a sequence number; a result is
//! applied only if no newer fetch has started since, so a slow response
//! can never overwrite a fresher one.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default spacing between scheduled refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Source of refreshed values. Implementors are expected to be
/// infallible: fold failures into the output (see
/// [`MonitorEndpoint`](super::MonitorEndpoint)) rather than erroring.
pub trait Fetcher: Send + Sync + 'static {
    /// The value produced by one fetch.
    type Output: Send + Sync + 'static;

    /// Performs one fetch.
    fn fetch(&self) -> impl Future<Output = Self::Output> + Send;
}

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No timer armed and nothing in flight.
    Idle,
    /// Timer armed, waiting for the next tick.
    Scheduled,
    /// A fetch is in flight.
    Fetching,
    /// Timer disarmed; manual triggers still work.
    Paused,
}

/// One published fetch result, tagged with the sequence number of the
/// fetch that produced it.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    /// Sequence number of the originating fetch.
    pub seq: u64,
    /// The fetched value.
    pub value: T,
}

struct Inner<F: Fetcher> {
    fetcher: F,
    interval: Mutex<Duration>,
    paused: AtomicBool,
    fetching: AtomicBool,
    queued: AtomicBool,
    seq: AtomicU64,
    visible: watch::Sender<Option<Snapshot<F::Output>>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<F: Fetcher> Inner<F> {
    /// Starts a fetch unconditionally, superseding any in-flight one.
    fn start_fetch(self: &Arc<Self>) {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.fetching.store(true, Ordering::SeqCst);
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let value = inner.fetcher.fetch().await;
            let current = inner.seq.load(Ordering::SeqCst);
            if current != seq {
                // A newer fetch started while this one was in flight; the
                // newer one owns the fetching flag and the visible state.
                tracing::debug!(seq, current, "discarding stale fetch result");
                return;
            }
            inner.visible.send_replace(Some(Snapshot { seq, value }));
            inner.fetching.store(false, Ordering::SeqCst);
            if inner.queued.swap(false, Ordering::SeqCst) {
                inner.start_fetch();
            }
        });
    }

    /// Starts a fetch unless one is already in flight, in which case a
    /// single follow-up is queued. Used by manual triggers.
    fn start_or_queue(self: &Arc<Self>) {
        if self.fetching.load(Ordering::SeqCst) {
            self.queued.store(true, Ordering::SeqCst);
            return;
        }
        self.start_fetch();
    }

    /// Timer tick: starts a fetch unless one is already in flight. Ticks
    /// that land during a fetch are skipped outright, never queued, so a
    /// pause taking effect mid-fetch leaves nothing behind to fire later.
    fn start_fetch_if_idle(self: &Arc<Self>) {
        if self.fetching.load(Ordering::SeqCst) {
            return;
        }
        self.start_fetch();
    }
}

/// Drives periodic and on-demand refreshes of a [`Fetcher`].
pub struct RefreshCoordinator<F: Fetcher> {
    inner: Arc<Inner<F>>,
}

impl<F: Fetcher> std::fmt::Debug for RefreshCoordinator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("state", &self.state())
            .finish()
    }
}

impl<F: Fetcher> Clone for RefreshCoordinator<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: Fetcher> RefreshCoordinator<F> {
    /// Creates a coordinator with the default interval. The timer is not
    /// armed until [`start`](Self::start) is called.
    #[must_use]
    pub fn new(fetcher: F) -> Self {
        Self::with_interval(fetcher, DEFAULT_REFRESH_INTERVAL)
    }

    /// Creates a coordinator with the interval from `REFRESH_INTERVAL_SECS`,
    /// falling back to the default on missing or invalid values.
    #[must_use]
    pub fn from_env(fetcher: F) -> Self {
        let interval = std::env::var("REFRESH_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map_or(DEFAULT_REFRESH_INTERVAL, Duration::from_secs);
        Self::with_interval(fetcher, interval)
    }

    /// Creates a coordinator with a custom refresh interval.
    #[must_use]
    pub fn with_interval(fetcher: F, interval: Duration) -> Self {
        let (visible, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                fetcher,
                interval: Mutex::new(interval),
                paused: AtomicBool::new(false),
                fetching: AtomicBool::new(false),
                queued: AtomicBool::new(false),
                seq: AtomicU64::new(0),
                visible,
                timer: Mutex::new(None),
            }),
        }
    }

    /// Subscribes to published snapshots. Holds `None` until the first
    /// fetch completes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot<F::Output>>> {
        self.inner.visible.subscribe()
    }

    /// The current observable state.
    #[must_use]
    pub fn state(&self) -> CoordinatorState {
        if self.inner.paused.load(Ordering::SeqCst) {
            return CoordinatorState::Paused;
        }
        if self.inner.fetching.load(Ordering::SeqCst) {
            return CoordinatorState::Fetching;
        }
        let armed = lock(&self.inner.timer)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        if armed {
            CoordinatorState::Scheduled
        } else {
            CoordinatorState::Idle
        }
    }

    /// Changes the refresh interval. Takes effect from the next tick.
    pub fn set_interval(&self, interval: Duration) {
        *lock(&self.inner.interval) = interval;
    }

    /// Arms the periodic timer, replacing any previous one. Ticks that
    /// land while a fetch is in flight are skipped, not queued.
    pub fn start(&self) {
        self.inner.paused.store(false, Ordering::SeqCst);
        let mut timer = lock(&self.inner.timer);
        if let Some(handle) = timer.take() {
            handle.abort();
        }
        let inner = Arc::clone(&self.inner);
        *timer = Some(tokio::spawn(async move {
            loop {
                let interval = *lock(&inner.interval);
                tokio::time::sleep(interval).await;
                inner.start_fetch_if_idle();
            }
        }));
    }

    /// Disarms the timer and drops any queued follow-up. An in-flight
    /// fetch is allowed to complete and its result is still applied, but
    /// no new fetch starts until [`resume`](Self::resume) or a manual
    /// [`trigger`](Self::trigger).
    pub fn pause(&self) {
        self.inner.paused.store(true, Ordering::SeqCst);
        self.inner.queued.store(false, Ordering::SeqCst);
        if let Some(handle) = lock(&self.inner.timer).take() {
            handle.abort();
        }
    }

    /// Re-arms the timer after a [`pause`](Self::pause).
    pub fn resume(&self) {
        self.start();
    }

    /// Requests an immediate refresh. If a fetch is already in flight,
    /// at most one follow-up is queued no matter how many times this is
    /// called.
    pub fn trigger(&self) {
        self.inner.start_or_queue();
    }

    /// Starts a fresh fetch immediately, superseding any in-flight one.
    /// The superseded fetch's result will be discarded when it lands.
    pub fn refetch(&self) {
        self.inner.start_fetch();
    }

    /// Disarms the timer and returns to [`CoordinatorState::Idle`].
    pub fn stop(&self) {
        self.inner.paused.store(false, Ordering::SeqCst);
        if let Some(handle) = lock(&self.inner.timer).take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    /// Counts calls; each call sleeps for the scripted delay (falling
    /// back to 5ms) and returns its 1-based call number.
    struct ScriptedFetcher {
        calls: AtomicU64,
        delays: Vec<Duration>,
    }

    impl ScriptedFetcher {
        fn new(delays: Vec<Duration>) -> Self {
            Self {
                calls: AtomicU64::new(0),
                delays,
            }
        }

        fn call_count(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Fetcher for Arc<ScriptedFetcher> {
        type Output = u64;

        async fn fetch(&self) -> u64 {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let delay = self
                .delays
                .get((call - 1) as usize)
                .copied()
                .unwrap_or(Duration::from_millis(5));
            tokio::time::sleep(delay).await;
            call
        }
    }

    fn latest(coordinator: &RefreshCoordinator<Arc<ScriptedFetcher>>) -> Option<u64> {
        coordinator
            .subscribe()
            .borrow()
            .as_ref()
            .map(|snapshot| snapshot.value)
    }

    #[tokio::test]
    async fn manual_trigger_publishes_result() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let coordinator = RefreshCoordinator::new(Arc::clone(&fetcher));
        assert_eq!(coordinator.state(), CoordinatorState::Idle);

        coordinator.trigger();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(latest(&coordinator), Some(1));
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(coordinator.state(), CoordinatorState::Idle);
    }

    #[tokio::test]
    async fn stale_result_does_not_overwrite_newer_one() {
        // First fetch is slow, the superseding refetch is fast: when the
        // slow result finally lands it must be discarded.
        let fetcher = Arc::new(ScriptedFetcher::new(vec![
            Duration::from_millis(120),
            Duration::from_millis(10),
        ]));
        let coordinator = RefreshCoordinator::new(Arc::clone(&fetcher));

        coordinator.trigger();
        tokio::time::sleep(Duration::from_millis(20)).await;
        coordinator.refetch();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(fetcher.call_count(), 2);
        assert_eq!(latest(&coordinator), Some(2));
    }

    #[tokio::test]
    async fn triggers_while_fetching_queue_exactly_one_follow_up() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Duration::from_millis(60)]));
        let coordinator = RefreshCoordinator::new(Arc::clone(&fetcher));

        coordinator.trigger();
        tokio::time::sleep(Duration::from_millis(10)).await;
        coordinator.trigger();
        coordinator.trigger();
        coordinator.trigger();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(fetcher.call_count(), 2);
        assert_eq!(latest(&coordinator), Some(2));
    }

    #[tokio::test]
    async fn pause_lets_in_flight_fetch_complete() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Duration::from_millis(60)]));
        let coordinator = RefreshCoordinator::new(Arc::clone(&fetcher));

        coordinator.trigger();
        tokio::time::sleep(Duration::from_millis(10)).await;
        coordinator.pause();
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(latest(&coordinator), Some(1));
        assert_eq!(coordinator.state(), CoordinatorState::Paused);

        // Paused means no further scheduled fetches.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn pause_during_fetch_discards_pending_ticks() {
        // Slow first fetch with a fast timer: several ticks land while
        // the fetch is in flight, then pause takes effect before it
        // completes. The completed fetch still applies, but the skipped
        // ticks must not start a fresh fetch after the pause.
        let fetcher = Arc::new(ScriptedFetcher::new(vec![Duration::from_millis(100)]));
        let coordinator =
            RefreshCoordinator::with_interval(Arc::clone(&fetcher), Duration::from_millis(30));

        coordinator.start();
        tokio::time::sleep(Duration::from_millis(110)).await;
        coordinator.pause();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(latest(&coordinator), Some(1));
        assert_eq!(coordinator.state(), CoordinatorState::Paused);
    }

    #[tokio::test]
    async fn timer_fires_repeatedly_until_stopped() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let coordinator =
            RefreshCoordinator::with_interval(Arc::clone(&fetcher), Duration::from_millis(25));

        coordinator.start();
        assert_eq!(coordinator.state(), CoordinatorState::Scheduled);
        tokio::time::sleep(Duration::from_millis(120)).await;
        coordinator.stop();

        let fired = fetcher.call_count();
        assert!(fired >= 2, "expected at least two ticks, got {fired}");
        assert_eq!(coordinator.state(), CoordinatorState::Idle);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(fetcher.call_count(), fired);
    }

    #[tokio::test]
    async fn resume_rearms_the_timer() {
        let fetcher = Arc::new(ScriptedFetcher::new(vec![]));
        let coordinator =
            RefreshCoordinator::with_interval(Arc::clone(&fetcher), Duration::from_millis(25));

        coordinator.start();
        coordinator.pause();
        assert_eq!(coordinator.state(), CoordinatorState::Paused);

        coordinator.resume();
        assert_eq!(coordinator.state(), CoordinatorState::Scheduled);
        tokio::time::sleep(Duration::from_millis(70)).await;
        coordinator.stop();

        assert!(fetcher.call_count() >= 1);
    }
}
