//! Admission control for the external completion service.
//!
//! Three constraints gate every metered call: a rolling 60-second window,
//! a minimum interval between requests, and a hard daily ceiling. Waiters
//! are served by a single dispatch loop, so no two callers can pass the
//! checks concurrently; a permit must be recorded (or dropped) before the
//! next waiter is admitted.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{oneshot, Notify};
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::storage::{BudgetSnapshot, Storage};

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Rate limits for one external target. Defaults stay under the free-tier
/// ceiling (15/min, 1500/day) with safety margin.
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    pub max_per_minute: usize,
    pub min_interval: Duration,
    pub max_per_day: usize,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            max_per_minute: 12,
            min_interval: Duration::from_secs(5),
            max_per_day: 1400,
        }
    }
}

/// Usage counters exposed to callers.
#[derive(Debug, Clone, Serialize)]
pub struct RateStats {
    pub last_minute: usize,
    pub last_hour: usize,
    pub last_day: usize,
    pub remaining_today: usize,
    pub queued_waiters: usize,
}

/// A request timestamp on both clocks: the monotonic clock drives window
/// math, the wall clock survives persistence.
#[derive(Debug, Clone, Copy)]
struct Stamp {
    at: Instant,
    wall: DateTime<Utc>,
}

#[derive(Default)]
struct Budget {
    requests: Vec<Stamp>,
    last_request: Option<Stamp>,
}

impl Budget {
    fn prune(&mut self, now: Instant) {
        self.requests
            .retain(|s| now.saturating_duration_since(s.at) < DAY);
    }

    fn count_within(&self, now: Instant, window: Duration) -> usize {
        self.requests
            .iter()
            .filter(|s| now.saturating_duration_since(s.at) < window)
            .count()
    }
}

enum Decision {
    Admit,
    Wait { reason: &'static str, wait: Duration },
    DailyQuota,
}

/// How the dispatch loop resolved one waiter. The sender is only consumed
/// after this is known, in a single place.
enum Admission {
    Admit,
    Reject(AppError),
    Abandoned,
}

struct Waiter {
    priority: i32,
    seq: u64,
    tx: oneshot::Sender<Result<SlotPermit, AppError>>,
}

impl PartialEq for Waiter {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}
impl Eq for Waiter {}
impl PartialOrd for Waiter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Waiter {
    // Max-heap: higher priority first, FIFO within a priority.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then(other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct Queue {
    heap: BinaryHeap<Waiter>,
    next_seq: u64,
}

struct Inner {
    limits: RateLimits,
    budget: Mutex<Budget>,
    queue: Mutex<Queue>,
    notify: Notify,
    storage: Arc<dyn Storage>,
}

impl Inner {
    /// Evaluates all three constraints against the current budget. The
    /// daily ceiling wins over the waitable constraints so an exhausted
    /// quota rejects without ever sleeping.
    fn check(&self, now: Instant) -> Decision {
        let mut budget = self.budget.lock().unwrap();
        budget.prune(now);

        if budget.requests.len() >= self.limits.max_per_day {
            return Decision::DailyQuota;
        }

        let in_window: Vec<Instant> = budget
            .requests
            .iter()
            .map(|s| s.at)
            .filter(|at| now.saturating_duration_since(*at) < MINUTE)
            .collect();
        if in_window.len() >= self.limits.max_per_minute {
            // Window frees up when its oldest entry ages past 60s.
            let oldest = in_window.iter().min().copied().unwrap_or(now);
            let wait = MINUTE.saturating_sub(now.saturating_duration_since(oldest));
            return Decision::Wait {
                reason: "window",
                wait,
            };
        }

        if let Some(last) = budget.last_request {
            let elapsed = now.saturating_duration_since(last.at);
            if elapsed < self.limits.min_interval {
                return Decision::Wait {
                    reason: "interval",
                    wait: self.limits.min_interval - elapsed,
                };
            }
        }

        Decision::Admit
    }

    fn pop_waiter(&self) -> Option<Waiter> {
        self.queue.lock().unwrap().heap.pop()
    }
}

/// Permit handed to exactly one admitted caller at a time. Call
/// [`SlotPermit::record`] once the gated request has actually been issued;
/// dropping the permit instead releases the slot without consuming quota.
pub struct SlotPermit {
    inner: Arc<Inner>,
    done: Option<oneshot::Sender<()>>,
}

impl SlotPermit {
    /// Appends the current timestamp to the budget and persists it. Failed
    /// external calls still consume quota: the request counts once issued,
    /// not once it succeeds.
    pub async fn record(mut self) {
        let snapshot = {
            let mut budget = self.inner.budget.lock().unwrap();
            let stamp = Stamp {
                at: Instant::now(),
                wall: Utc::now(),
            };
            budget.requests.push(stamp);
            budget.last_request = Some(stamp);
            budget.prune(stamp.at);
            BudgetSnapshot {
                requests: budget.requests.iter().map(|s| s.wall).collect(),
                last_request_at: budget.last_request.map(|s| s.wall),
                saved_at: stamp.wall,
            }
        };
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
        if let Err(e) = self.inner.storage.save_budget(&snapshot).await {
            warn!("Failed to persist rate budget: {e}");
        }
    }
}

impl Drop for SlotPermit {
    fn drop(&mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
    }
}

/// Rate limiter / admission gate for one external target.
///
/// Must be constructed inside a Tokio runtime: a background dispatch task
/// serves the waiter queue for the lifetime of the limiter.
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl RateLimiter {
    pub fn new(limits: RateLimits, storage: Arc<dyn Storage>) -> Self {
        let inner = Arc::new(Inner {
            limits,
            budget: Mutex::new(Budget::default()),
            queue: Mutex::new(Queue::default()),
            notify: Notify::new(),
            storage,
        });
        tokio::spawn(dispatch(Arc::clone(&inner)));
        Self { inner }
    }

    /// Restores the persisted budget so quota accounting survives restarts.
    /// Snapshots older than 24 hours carry no usable history and are skipped.
    pub async fn restore(&self) -> Result<(), AppError> {
        let Some(snapshot) = self.inner.storage.load_budget().await? else {
            return Ok(());
        };
        let now_wall = Utc::now();
        let now = Instant::now();
        if (now_wall - snapshot.saved_at).to_std().unwrap_or_default() > DAY {
            debug!("Skipping stale rate budget snapshot");
            return Ok(());
        }

        let mut budget = self.inner.budget.lock().unwrap();
        for wall in &snapshot.requests {
            let age = (now_wall - *wall).to_std().unwrap_or_default();
            if age < DAY {
                let at = now.checked_sub(age).unwrap_or(now);
                budget.requests.push(Stamp { at, wall: *wall });
            }
        }
        budget.last_request = snapshot.last_request_at.map(|wall| {
            let age = (now_wall - wall).to_std().unwrap_or_default();
            Stamp {
                at: now.checked_sub(age).unwrap_or(now),
                wall,
            }
        });
        debug!(
            "Restored rate budget: {} requests in the last 24h",
            budget.requests.len()
        );
        Ok(())
    }

    /// Waits for an admission slot at the default priority.
    pub async fn wait_for_slot(&self) -> Result<SlotPermit, AppError> {
        self.acquire(0).await
    }

    /// Waits for an admission slot. Higher priorities are dequeued first
    /// among waiters that are currently eligible. Rejects immediately with
    /// `DailyQuotaExceeded` when the hard ceiling is reached — never sleeps
    /// for it. Abandoning the returned future leaves the queue and the
    /// timestamp log intact.
    pub async fn acquire(&self, priority: i32) -> Result<SlotPermit, AppError> {
        let (tx, rx) = oneshot::channel();
        {
            let mut queue = self.inner.queue.lock().unwrap();
            queue.next_seq += 1;
            let seq = queue.next_seq;
            queue.heap.push(Waiter { priority, seq, tx });
        }
        self.inner.notify.notify_one();
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(AppError::Internal(anyhow::anyhow!(
                "admission dispatch loop terminated"
            ))),
        }
    }

    pub fn stats(&self) -> RateStats {
        let now = Instant::now();
        let queued_waiters = self.inner.queue.lock().unwrap().heap.len();
        let budget = self.inner.budget.lock().unwrap();
        let last_day = budget.count_within(now, DAY);
        RateStats {
            last_minute: budget.count_within(now, MINUTE),
            last_hour: budget.count_within(now, HOUR),
            last_day,
            remaining_today: self.inner.limits.max_per_day.saturating_sub(last_day),
            queued_waiters,
        }
    }
}

/// Single sequential admission loop. Pops the best waiter, sleeps out the
/// exact remaining wait, re-evaluates from scratch (a concurrent recording
/// may have consumed the slot), and only moves to the next waiter once the
/// current permit is recorded or dropped.
async fn dispatch(inner: Arc<Inner>) {
    loop {
        let mut waiter = loop {
            match inner.pop_waiter() {
                Some(w) => break w,
                None => inner.notify.notified().await,
            }
        };
        if waiter.tx.is_closed() {
            continue; // caller abandoned while queued
        }

        let admission = loop {
            match inner.check(Instant::now()) {
                Decision::Admit => break Admission::Admit,
                Decision::DailyQuota => {
                    warn!("Daily API quota exhausted; rejecting waiter");
                    break Admission::Reject(AppError::DailyQuotaExceeded);
                }
                Decision::Wait { reason, wait } => {
                    debug!("Admission blocked by {reason}; waiting {}ms", wait.as_millis());
                    tokio::select! {
                        _ = sleep(wait) => {}
                        _ = waiter.tx.closed() => break Admission::Abandoned,
                    }
                }
            }
        };
        match admission {
            Admission::Admit => {}
            Admission::Reject(err) => {
                let _ = waiter.tx.send(Err(err));
                continue;
            }
            Admission::Abandoned => continue,
        }

        let (done_tx, done_rx) = oneshot::channel();
        let permit = SlotPermit {
            inner: Arc::clone(&inner),
            done: Some(done_tx),
        };
        if waiter.tx.send(Ok(permit)).is_err() {
            continue; // abandoned at the last moment; permit dropped, no quota spent
        }
        let _ = done_rx.await;
    }
}
