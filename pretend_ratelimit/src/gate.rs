use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::sync::OwnedSemaphorePermit;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::debug;
use tracing::trace;

use crate::error::RateLimitError;
use crate::error::Result;

/// Requests admitted per window when nothing else is configured
pub const DEFAULT_CAPACITY: u32 = 5;

/// Window length when nothing else is configured
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(5);

/// Counting state for the current window
#[derive(Debug)]
struct WindowState {
    /// Start of the current counting window
    window_start: Instant,

    /// Requests admitted since `window_start`
    count: u32,
}

/// Fixed window request counter combined with a bounded-concurrency gate
///
/// The window counter limits how many requests are *started* per window, which
/// is the quota the remote service enforces. The semaphore separately limits
/// how many requests are *outstanding* at once. A slot counted in the window is
/// never refunded, while a concurrency unit is always returned when its
/// [`GatePermit`] is dropped.
///
/// Windows are fixed, not sliding: up to `2 * capacity` requests can start in
/// a short span straddling a window boundary.
///
/// Waiters queue on a fair mutex, so admissions within a window are FIFO.
/// After a rollover wait ordering is best-effort only: the task that slept
/// holds the mutex, and the tasks queued behind it re-check the fresh window
/// in the order the scheduler wakes them.
#[derive(Debug)]
pub struct Gate {
    /// Window bookkeeping, only mutated while the lock is held
    window_state: Mutex<WindowState>,

    /// In-flight bound, initialised to `capacity` units
    permits: Arc<Semaphore>,

    /// Maximum requests per window and maximum requests in flight
    capacity: u32,

    /// Window duration
    window: Duration,
}

impl Gate {
    /// Create a new gate admitting `capacity` requests per `window`
    pub fn new(capacity: u32, window: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(RateLimitError::InvalidConfig("capacity must be greater than 0"));
        }
        if window.is_zero() {
            return Err(RateLimitError::InvalidConfig("window duration must be greater than 0"));
        }

        Ok(Self::from_parts(capacity, window))
    }

    /// Create a gate with a one second window
    pub fn per_second(capacity: u32) -> Result<Self> {
        Self::new(capacity, Duration::from_secs(1))
    }

    /// Create a builder for configuring a gate
    pub fn builder() -> GateBuilder {
        GateBuilder::new()
    }

    fn from_parts(capacity: u32, window: Duration) -> Self {
        Self {
            window_state: Mutex::new(WindowState { window_start: Instant::now(), count: 0 }),
            permits: Arc::new(Semaphore::new(capacity as usize)),
            capacity,
            window,
        }
    }

    /// Wait until a request may start, then admit it
    ///
    /// Suspends while another caller holds the window lock, while the current
    /// window's quota is exhausted, and while `capacity` requests are already
    /// in flight. Never fails and has no timeout; wrap it in
    /// `tokio::time::timeout` if the caller needs one.
    ///
    /// Cancelling this future before it completes never leaks a concurrency
    /// unit. If it is cancelled after the window slot was counted but while
    /// still waiting for a concurrency unit, the window slot stays consumed.
    pub async fn acquire(&self) -> GatePermit {
        {
            let mut state = self.window_state.lock().await;
            let elapsed = state.window_start.elapsed();

            if elapsed > self.window {
                state.count = 0;
                state.window_start = Instant::now();
            }

            if state.count >= self.capacity {
                // Sleeping with the lock held serialises rollover waits
                let wait = self.window.saturating_sub(elapsed);
                debug!(capacity = self.capacity, wait_ms = wait.as_millis() as u64, "Window quota exhausted, waiting for rollover");
                tokio::time::sleep(wait).await;
                state.count = 0;
                state.window_start = Instant::now();
            }

            state.count += 1;
            trace!(count = state.count, capacity = self.capacity, "Request admitted to window");
        }

        let permit = Arc::clone(&self.permits).acquire_owned().await.expect("Gate semaphore closed");
        GatePermit { _permit: permit }
    }

    /// Maximum requests per window and in flight
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Window duration
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of requests admitted and not yet released
    pub fn in_flight(&self) -> u32 {
        self.capacity.saturating_sub(self.permits.available_permits() as u32)
    }

    /// Number of concurrency units currently free
    pub fn available_permits(&self) -> u32 {
        self.permits.available_permits() as u32
    }

    /// Requests counted against the current window
    ///
    /// Reports 0 once the window has expired, even though the stored counter
    /// is only reset by the next `acquire`.
    pub async fn window_count(&self) -> u32 {
        let state = self.window_state.lock().await;
        if state.window_start.elapsed() > self.window { 0 } else { state.count }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::from_parts(DEFAULT_CAPACITY, DEFAULT_WINDOW)
    }
}

/// Scoped admission returned by [`Gate::acquire`]
///
/// Holds one concurrency unit. Dropping the permit returns it, so the unit is
/// released on success, on error and when the owning future is cancelled.
#[derive(Debug)]
#[must_use = "dropping the permit releases its concurrency unit immediately"]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl GatePermit {
    /// Release the concurrency unit now instead of at end of scope
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        trace!("Gate permit released");
    }
}

/// Builder for configuring a gate
pub struct GateBuilder {
    capacity: Option<u32>,
    window: Option<Duration>,
}

impl GateBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self { capacity: None, window: None }
    }

    /// Set the capacity (max requests per window and in flight)
    pub fn capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the window duration
    pub fn window(mut self, window: Duration) -> Self {
        self.window = Some(window);
        self
    }

    /// Set window to 1 second
    pub fn per_second(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self.window = Some(Duration::from_secs(1));
        self
    }

    /// Set window to 1 minute
    pub fn per_minute(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self.window = Some(Duration::from_secs(60));
        self
    }

    /// Build the gate
    pub fn build(self) -> Result<Gate> {
        let capacity = self.capacity.ok_or(RateLimitError::InvalidConfig("capacity must be set"))?;
        let window = self.window.ok_or(RateLimitError::InvalidConfig("window must be set"))?;
        Gate::new(capacity, window)
    }
}

impl Default for GateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation() {
        let gate = Gate::new(10, Duration::from_secs(1)).unwrap();
        assert_eq!(gate.capacity(), 10);
        assert_eq!(gate.window(), Duration::from_secs(1));
        assert_eq!(gate.available_permits(), 10);
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn test_default_matches_service_quota() {
        let gate = Gate::default();
        assert_eq!(gate.capacity(), 5);
        assert_eq!(gate.window(), Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(Gate::new(0, Duration::from_secs(1)), Err(RateLimitError::InvalidConfig(_))));
        assert!(matches!(Gate::new(5, Duration::ZERO), Err(RateLimitError::InvalidConfig(_))));
    }

    #[test]
    fn test_builder() {
        let gate = Gate::builder().per_minute(100).build().unwrap();
        assert_eq!(gate.capacity(), 100);
        assert_eq!(gate.window(), Duration::from_secs(60));

        let gate = Gate::builder().capacity(3).window(Duration::from_millis(250)).build().unwrap();
        assert_eq!(gate.capacity(), 3);
        assert_eq!(gate.window(), Duration::from_millis(250));
    }

    #[test]
    fn test_builder_missing_fields() {
        assert!(matches!(Gate::builder().capacity(3).build(), Err(RateLimitError::InvalidConfig("window must be set"))));
        assert!(matches!(Gate::builder().window(Duration::from_secs(1)).build(), Err(RateLimitError::InvalidConfig("capacity must be set"))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_window_admits_capacity_immediately() {
        let gate = Gate::new(5, Duration::from_secs(5)).unwrap();
        let start = Instant::now();

        let mut permits = Vec::new();
        for _ in 0..5 {
            permits.push(gate.acquire().await);
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(gate.in_flight(), 5);
        assert_eq!(gate.window_count().await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_window_waits_for_remaining_time() {
        let gate = Gate::new(5, Duration::from_secs(5)).unwrap();
        let start = Instant::now();

        for _ in 0..5 {
            gate.acquire().await.release();
        }

        tokio::time::advance(Duration::from_secs(2)).await;

        // Sixth request waits out the remaining three seconds
        let _permit = gate.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(gate.window_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_acquire_admits_exactly_capacity() {
        let gate = Arc::new(Gate::new(5, Duration::from_secs(5)).unwrap());
        let start = Instant::now();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move {
                    let permit = gate.acquire().await;
                    let admitted_at = start.elapsed();
                    permit.release();
                    admitted_at
                })
            })
            .collect();

        let mut admitted = Vec::new();
        for handle in handles {
            admitted.push(handle.await.unwrap());
        }
        admitted.sort();

        assert!(admitted[..5].iter().all(|t| *t == Duration::ZERO));
        assert!(admitted[5] >= Duration::from_secs(5));
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_rollover_resets_counter() {
        let gate = Gate::new(3, Duration::from_secs(1)).unwrap();

        for _ in 0..3 {
            gate.acquire().await.release();
        }
        assert_eq!(gate.window_count().await, 3);

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert_eq!(gate.window_count().await, 0);

        let start = Instant::now();
        let _permit = gate.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(gate.window_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_window_allows_boundary_burst() {
        // Known property of fixed windows, not a bug
        let gate = Gate::new(2, Duration::from_secs(1)).unwrap();

        tokio::time::advance(Duration::from_millis(999)).await;
        let start = Instant::now();
        gate.acquire().await.release();
        gate.acquire().await.release();

        tokio::time::advance(Duration::from_millis(2)).await;
        gate.acquire().await.release();
        gate.acquire().await.release();

        assert_eq!(start.elapsed(), Duration::from_millis(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_remaining_wait_does_not_sleep() {
        let gate = Gate::new(1, Duration::from_secs(1)).unwrap();
        gate.acquire().await.release();

        // Elapsed equals the window exactly, so no reset happens up front and
        // the remaining wait is zero
        tokio::time::advance(Duration::from_secs(1)).await;
        let start = Instant::now();
        gate.acquire().await.release();

        assert!(start.elapsed() < Duration::from_millis(5));
        assert_eq!(gate.window_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_bound_blocks_after_window_reset() {
        let gate = Gate::new(2, Duration::from_millis(10)).unwrap();
        let first = gate.acquire().await;
        let _second = gate.acquire().await;

        tokio::time::advance(Duration::from_millis(11)).await;

        // Fresh window, but both concurrency units are still held
        let blocked = tokio::time::timeout(Duration::from_millis(5), gate.acquire()).await;
        assert!(blocked.is_err());

        // The abandoned attempt was already counted and is not refunded
        assert_eq!(gate.window_count().await, 1);
        assert_eq!(gate.in_flight(), 2);

        first.release();
        let start = Instant::now();
        let _third = gate.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(gate.window_count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_rollover_wait_consumes_nothing() {
        let gate = Gate::new(2, Duration::from_secs(1)).unwrap();
        gate.acquire().await.release();
        gate.acquire().await.release();

        let cancelled = tokio::time::timeout(Duration::from_millis(100), gate.acquire()).await;
        assert!(cancelled.is_err());
        assert_eq!(gate.in_flight(), 0);
        assert_eq!(gate.window_count().await, 2);

        // Lock was released on cancellation, the next caller still gets through
        let _permit = gate.acquire().await;
        assert_eq!(gate.window_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_restores_full_capacity() {
        let gate = Gate::new(4, Duration::from_secs(1)).unwrap();

        let permits = acquire_many(&gate, 4).await;
        assert_eq!(gate.available_permits(), 0);
        assert_eq!(gate.in_flight(), 4);

        drop(permits);
        assert_eq!(gate.available_permits(), 4);
        assert_eq!(gate.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_count_never_exceeds_capacity_under_contention() {
        let gate = Arc::new(Gate::new(3, Duration::from_millis(100)).unwrap());

        let handles: Vec<_> = (0..12)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move {
                    let _permit = gate.acquire().await;
                    gate.window_count().await
                })
            })
            .collect();

        for handle in handles {
            let count = handle.await.unwrap();
            assert!(count <= 3, "window count {count} exceeded capacity");
        }
        assert_eq!(gate.in_flight(), 0);
    }

    async fn acquire_many(gate: &Gate, n: usize) -> Vec<GatePermit> {
        let mut permits = Vec::with_capacity(n);
        for _ in 0..n {
            permits.push(gate.acquire().await);
        }
        permits
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn admissions_per_window_never_exceed_capacity(capacity in 1u32..8, requests in 1usize..40, window_ms in 1u64..2_000) {
                let runtime = tokio::runtime::Builder::new_current_thread().enable_time().start_paused(true).build().unwrap();
                let window = Duration::from_millis(window_ms);

                let admitted = runtime.block_on(async {
                    let gate = Gate::new(capacity, window).unwrap();
                    let start = Instant::now();
                    let mut admitted = Vec::with_capacity(requests);
                    for _ in 0..requests {
                        gate.acquire().await.release();
                        assert!(gate.window_count().await <= capacity);
                        admitted.push(start.elapsed());
                    }
                    admitted
                });

                // Back-to-back callers: any capacity + 1 admissions span at least one window
                let capacity = capacity as usize;
                for i in capacity..admitted.len() {
                    prop_assert!(admitted[i] - admitted[i - capacity] >= window);
                }
            }
        }
    }
}
