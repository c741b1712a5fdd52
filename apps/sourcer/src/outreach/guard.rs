//! The outreach guard: decides whether a generated action may execute.
//!
//! Every outbound contact passes three gates in order: dedup (at most one
//! successful contact per candidate/job/channel), action spacing (a minimum
//! gap between any two dispatched actions), and the bounded-retry state
//! machine. Declined attempts are normal outcomes, not errors.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::outreach::{outreach_key, Channel, OutreachRecord, OutreachStatus};
use crate::outreach::retry::{run_with_retry, ActionError, ActionState, RetryPolicy};
use crate::storage::Storage;

pub const DEFAULT_MIN_ACTION_INTERVAL: Duration = Duration::from_secs(5);

/// Terminal outcome of one outreach attempt.
#[derive(Debug)]
pub enum OutreachOutcome {
    /// Action executed and recorded as successful.
    Sent(OutreachRecord),
    /// Declined: this contact already succeeded, or an attempt for the same
    /// key is currently in flight (no record exists yet in that case).
    Duplicate(Option<OutreachRecord>),
    /// Declined: dispatched inside the spacing window. Dropped, never queued.
    TooSoon { wait: Duration },
    /// Action exhausted its retries or failed fatally.
    Failed(OutreachRecord),
}

#[derive(Default)]
struct GuardState {
    records: HashMap<String, OutreachRecord>,
    in_flight: HashSet<String>,
    last_action_at: Option<Instant>,
}

/// Clears the in-flight reservation even if the attempt future is dropped
/// mid-retry.
struct InFlightReservation {
    state: Arc<Mutex<GuardState>>,
    key: String,
}

impl Drop for InFlightReservation {
    fn drop(&mut self) {
        self.state.lock().unwrap().in_flight.remove(&self.key);
    }
}

pub struct OutreachGuard {
    policy: RetryPolicy,
    min_action_interval: Duration,
    state: Arc<Mutex<GuardState>>,
    storage: Arc<dyn Storage>,
}

impl OutreachGuard {
    pub fn new(
        policy: RetryPolicy,
        min_action_interval: Duration,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            policy,
            min_action_interval,
            state: Arc::new(Mutex::new(GuardState::default())),
            storage,
        }
    }

    /// Loads persisted outreach records so dedup survives restarts.
    pub async fn load(&self) -> Result<(), AppError> {
        let records = self.storage.load_outreach().await?;
        let mut state = self.state.lock().unwrap();
        for record in records {
            state.records.insert(record.key(), record);
        }
        debug!("Loaded {} outreach records", state.records.len());
        Ok(())
    }

    /// Drives one generated action through dedup, spacing and the retry
    /// state machine, recording and persisting the result.
    ///
    /// Under concurrent attempts for the same key, exactly one caller
    /// executes the action; the rest observe `Duplicate`.
    pub async fn attempt_outreach<F, Fut>(
        &self,
        fingerprint: &str,
        job_id: Uuid,
        channel: Channel,
        action: F,
    ) -> Result<OutreachOutcome, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), ActionError>>,
    {
        let key = outreach_key(fingerprint, job_id, channel);

        {
            let mut state = self.state.lock().unwrap();
            if let Some(record) = state.records.get(&key) {
                if record.status == OutreachStatus::Success {
                    debug!("Skipping duplicate {} outreach to {fingerprint}", channel.as_str());
                    return Ok(OutreachOutcome::Duplicate(Some(record.clone())));
                }
            }
            if state.in_flight.contains(&key) {
                debug!("Outreach for {fingerprint} already in flight");
                return Ok(OutreachOutcome::Duplicate(None));
            }
            let now = Instant::now();
            if let Some(last) = state.last_action_at {
                let elapsed = now.saturating_duration_since(last);
                if elapsed < self.min_action_interval {
                    let wait = self.min_action_interval - elapsed;
                    debug!("Dropping outreach inside spacing window ({}ms left)", wait.as_millis());
                    return Ok(OutreachOutcome::TooSoon { wait });
                }
            }
            state.in_flight.insert(key.clone());
            state.last_action_at = Some(now);
        }
        let _reservation = InFlightReservation {
            state: Arc::clone(&self.state),
            key: key.clone(),
        };

        let (terminal, attempts) = run_with_retry(&self.policy, action).await;

        let (record, snapshot) = {
            let mut state = self.state.lock().unwrap();
            let status = if terminal == ActionState::Success {
                OutreachStatus::Success
            } else {
                OutreachStatus::Failed
            };
            let record = match state.records.get_mut(&key) {
                Some(existing) => {
                    existing.attempts += attempts;
                    existing.last_attempt_at = Utc::now();
                    existing.status = status;
                    existing.clone()
                }
                None => {
                    let record = OutreachRecord {
                        candidate_fingerprint: fingerprint.to_string(),
                        job_id,
                        channel,
                        last_attempt_at: Utc::now(),
                        attempts,
                        status,
                    };
                    state.records.insert(key.clone(), record.clone());
                    record
                }
            };
            let snapshot: Vec<OutreachRecord> = state.records.values().cloned().collect();
            (record, snapshot)
        };
        self.storage.save_outreach(&snapshot).await?;

        if record.status == OutreachStatus::Success {
            info!("Outreach {} to {fingerprint} sent after {attempts} attempt(s)", channel.as_str());
            Ok(OutreachOutcome::Sent(record))
        } else {
            warn!("Outreach {} to {fingerprint} failed after {attempts} attempt(s)", channel.as_str());
            Ok(OutreachOutcome::Failed(record))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::{advance, sleep};

    fn no_jitter() -> RetryPolicy {
        RetryPolicy {
            jitter: Duration::ZERO,
            ..RetryPolicy::default()
        }
    }

    fn guard(min_interval: Duration) -> (OutreachGuard, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let guard = OutreachGuard::new(
            no_jitter(),
            min_interval,
            Arc::clone(&storage) as Arc<dyn Storage>,
        );
        (guard, storage)
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_outreach_sends_and_persists() {
        let (guard, storage) = guard(Duration::ZERO);
        let outcome = guard
            .attempt_outreach("张伟|bachelor|3", Uuid::new_v4(), Channel::Greet, || async {
                Ok(())
            })
            .await
            .unwrap();

        let OutreachOutcome::Sent(record) = outcome else {
            panic!("expected Sent, got {outcome:?}");
        };
        assert_eq!(record.status, OutreachStatus::Success);
        assert_eq!(record.attempts, 1);
        assert_eq!(storage.load_outreach().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_outreach_is_never_repeated() {
        let (guard, _) = guard(Duration::ZERO);
        let job = Uuid::new_v4();
        let calls = AtomicU32::new(0);
        let action = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };

        let first = guard
            .attempt_outreach("fp", job, Channel::Greet, action)
            .await
            .unwrap();
        assert!(matches!(first, OutreachOutcome::Sent(_)));

        let second = guard
            .attempt_outreach("fp", job, Channel::Greet, action)
            .await
            .unwrap();
        assert!(matches!(second, OutreachOutcome::Duplicate(Some(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_channels_deduplicate_independently() {
        let (guard, _) = guard(Duration::ZERO);
        let job = Uuid::new_v4();
        let sent = guard
            .attempt_outreach("fp", job, Channel::Greet, || async { Ok(()) })
            .await
            .unwrap();
        assert!(matches!(sent, OutreachOutcome::Sent(_)));

        let reply = guard
            .attempt_outreach("fp", job, Channel::Reply, || async { Ok(()) })
            .await
            .unwrap();
        assert!(matches!(reply, OutreachOutcome::Sent(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_action_inside_spacing_window_is_dropped_not_queued() {
        let (guard, _) = guard(DEFAULT_MIN_ACTION_INTERVAL);
        let job = Uuid::new_v4();
        guard
            .attempt_outreach("first", job, Channel::Greet, || async { Ok(()) })
            .await
            .unwrap();

        let before = Instant::now();
        let outcome = guard
            .attempt_outreach("second", job, Channel::Greet, || async { Ok(()) })
            .await
            .unwrap();
        let OutreachOutcome::TooSoon { wait } = outcome else {
            panic!("expected TooSoon, got {outcome:?}");
        };
        assert_eq!(wait, Duration::from_secs(5));
        // Dropped immediately: no queueing, no sleeping.
        assert_eq!(Instant::now(), before);

        advance(Duration::from_secs(5)).await;
        let retried = guard
            .attempt_outreach("second", job, Channel::Greet, || async { Ok(()) })
            .await
            .unwrap();
        assert!(matches!(retried, OutreachOutcome::Sent(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_attempts_produce_exactly_one_success() {
        let storage = Arc::new(MemoryStorage::new());
        let guard = Arc::new(OutreachGuard::new(
            no_jitter(),
            Duration::ZERO,
            Arc::clone(&storage) as Arc<dyn Storage>,
        ));
        let job = Uuid::new_v4();
        let calls = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let guard = Arc::clone(&guard);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                guard
                    .attempt_outreach("fp", job, Channel::Greet, || {
                        let calls = Arc::clone(&calls);
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            sleep(Duration::from_secs(1)).await;
                            Ok(())
                        }
                    })
                    .await
                    .unwrap()
            }));
        }

        let mut sent = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                OutreachOutcome::Sent(_) => sent += 1,
                OutreachOutcome::Duplicate(_) => duplicates += 1,
                other => panic!("unexpected outcome {other:?}"),
            }
        }
        assert_eq!(sent, 1);
        assert_eq!(duplicates, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_outreach_can_be_retried_later() {
        let (guard, _) = guard(Duration::ZERO);
        let job = Uuid::new_v4();

        let failed = guard
            .attempt_outreach("fp", job, Channel::Reply, || async {
                Err(ActionError::Retryable("timeout".into()))
            })
            .await
            .unwrap();
        let OutreachOutcome::Failed(record) = failed else {
            panic!("expected Failed, got {failed:?}");
        };
        assert_eq!(record.status, OutreachStatus::Failed);
        assert_eq!(record.attempts, 4);

        // A failed record does not block another try.
        let recovered = guard
            .attempt_outreach("fp", job, Channel::Reply, || async { Ok(()) })
            .await
            .unwrap();
        let OutreachOutcome::Sent(record) = recovered else {
            panic!("expected Sent, got {recovered:?}");
        };
        assert_eq!(record.attempts, 5);
        assert_eq!(record.status, OutreachStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_failure_records_single_attempt() {
        let (guard, storage) = guard(Duration::ZERO);
        let outcome = guard
            .attempt_outreach("fp", Uuid::new_v4(), Channel::Greet, || async {
                Err(ActionError::Fatal("account restricted".into()))
            })
            .await
            .unwrap();
        let OutreachOutcome::Failed(record) = outcome else {
            panic!("expected Failed, got {outcome:?}");
        };
        assert_eq!(record.attempts, 1);
        assert_eq!(storage.load_outreach().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_restores_dedup_across_instances() {
        let storage = Arc::new(MemoryStorage::new());
        let job = Uuid::new_v4();
        {
            let guard = OutreachGuard::new(
                no_jitter(),
                Duration::ZERO,
                Arc::clone(&storage) as Arc<dyn Storage>,
            );
            guard
                .attempt_outreach("fp", job, Channel::Greet, || async { Ok(()) })
                .await
                .unwrap();
        }

        let revived = OutreachGuard::new(
            no_jitter(),
            Duration::ZERO,
            Arc::clone(&storage) as Arc<dyn Storage>,
        );
        revived.load().await.unwrap();
        let outcome = revived
            .attempt_outreach("fp", job, Channel::Greet, || async { Ok(()) })
            .await
            .unwrap();
        assert!(matches!(outcome, OutreachOutcome::Duplicate(Some(_))));
    }
}
