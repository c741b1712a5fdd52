//! Trigger debouncing. A burst of page events (candidate card renders,
//! incoming message fragments) must collapse to a single outreach action.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::time::{sleep, Duration};

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(2);

/// Collapses bursts of triggers: each trigger starts a quiet period, and
/// only the newest trigger survives it.
pub struct Debouncer {
    quiet: Duration,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            generation: AtomicU64::new(0),
        }
    }

    /// Registers a trigger, waits out the quiet period, and reports whether
    /// this trigger is still the newest. A `false` return means a later
    /// trigger superseded this one and no action should be taken.
    pub async fn settle(&self) -> bool {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        sleep(self.quiet).await;
        self.generation.load(Ordering::SeqCst) == my_generation
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}
