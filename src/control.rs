//! Run-scoped search control: the incumbent, timing, node accounting
//! and termination for one search run.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::quality::Quality;
use crate::state::Qualifiable;

const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Cooperative cancellation. Level-triggered: once cancelled, stays
/// cancelled. Clones share the signal.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

type ImprovementCallback<S> =
    Box<dyn Fn(&SearchControl<S>, &S, &<S as Qualifiable>::Qual) + Send + Sync>;

/// Quality and state are kept under one lock so readers always observe
/// a consistent pair.
struct Incumbent<S: Qualifiable> {
    quality: Option<S::Qual>,
    state: Option<S>,
}

/// Owns everything scoped to one search run: the incumbent, the
/// monotonic timer, the visited-node counter, termination triggers and
/// the improvement callback. Engines share it by reference, so a
/// parallel run needs no further synchronization than the control
/// itself.
pub struct SearchControl<S: Qualifiable> {
    root: S,
    incumbent: Mutex<Incumbent<S>>,
    visited_nodes: AtomicU64,
    started_at: Instant,
    finished_after: OnceLock<Duration>,
    runtime_limit: Option<Duration>,
    node_limit: Option<u64>,
    cancellation: Option<CancellationToken>,
    improvement_callback: Option<ImprovementCallback<S>>,
    last_progress_log: Mutex<Instant>,
}

impl<S: Qualifiable> SearchControl<S> {
    /// Starts a fresh run rooted at `state`, with no incumbent and no
    /// termination triggers.
    pub fn start(state: S) -> Self {
        Self {
            root: state,
            incumbent: Mutex::new(Incumbent {
                quality: None,
                state: None,
            }),
            visited_nodes: AtomicU64::new(0),
            started_at: Instant::now(),
            finished_after: OnceLock::new(),
            runtime_limit: None,
            node_limit: None,
            cancellation: None,
            improvement_callback: None,
            last_progress_log: Mutex::new(Instant::now()),
        }
    }

    /// Seeds the incumbent quality without recording a state, so
    /// pruning is tight from the outset. Only a strictly better quality
    /// will be recorded as a solution.
    pub fn with_upper_bound(self, quality: S::Qual) -> Self {
        {
            let mut incumbent = self.incumbent.lock().unwrap();
            incumbent.quality = Some(quality);
            incumbent.state = None;
        }
        self
    }

    /// Caps the wall-clock time of the run.
    pub fn with_runtime_limit(mut self, limit: Duration) -> Self {
        self.runtime_limit = Some(limit);
        self
    }

    /// Caps the number of visited nodes.
    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Registers a callback invoked on every incumbent update. It runs
    /// under the incumbent lock, so it observes a consistent
    /// `(state, quality)` pair and must not call back into the control.
    pub fn with_improvement_callback(
        mut self,
        callback: impl Fn(&SearchControl<S>, &S, &S::Qual) + Send + Sync + 'static,
    ) -> Self {
        self.improvement_callback = Some(Box::new(callback));
        self
    }

    /// Accounts for one inspected state and folds its quality, if any,
    /// into the incumbent.
    pub fn visit_node(&self, state: &S) {
        self.visited_nodes.fetch_add(1, Ordering::Relaxed);
        let Some(quality) = state.quality() else {
            return;
        };
        let mut incumbent = self.incumbent.lock().unwrap();
        if !quality.is_better_than(incumbent.quality.as_ref()) {
            return;
        }
        incumbent.quality = Some(quality.clone());
        incumbent.state = Some(state.clone());
        debug!(
            visited_nodes = self.visited_nodes.load(Ordering::Relaxed),
            quality = ?quality,
            "incumbent improved"
        );
        if let Some(callback) = &self.improvement_callback {
            callback(self, state, &quality);
        }
    }

    /// True on any termination trigger: the run is finished, cancelled,
    /// past its runtime limit, or past its node limit.
    pub fn should_stop(&self) -> bool {
        if self.is_finished() {
            return true;
        }
        if self
            .cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
        {
            return true;
        }
        if self
            .runtime_limit
            .is_some_and(|limit| self.started_at.elapsed() > limit)
        {
            return true;
        }
        if self
            .node_limit
            .is_some_and(|limit| self.visited_nodes.load(Ordering::Relaxed) >= limit)
        {
            return true;
        }
        false
    }

    /// Freezes the timer and marks the run finished. Idempotent.
    pub fn finish(&self) {
        if self.finished_after.set(self.started_at.elapsed()).is_ok() {
            info!(
                visited_nodes = self.visited_nodes(),
                elapsed = self.elapsed().as_secs_f64(),
                quality = ?self.best_quality(),
                "search finished"
            );
        }
    }

    /// Emits a throttled progress line, at most once every ten seconds.
    /// Contended calls are skipped rather than serialized.
    pub fn log_if_needed(&self) {
        let Ok(mut last) = self.last_progress_log.try_lock() else {
            return;
        };
        if last.elapsed() > PROGRESS_LOG_INTERVAL {
            *last = Instant::now();
            info!(
                visited_nodes = self.visited_nodes.load(Ordering::Relaxed),
                elapsed = self.started_at.elapsed().as_secs_f64(),
                "search in progress"
            );
        }
    }

    pub fn initial_state(&self) -> &S {
        &self.root
    }

    pub fn best_quality(&self) -> Option<S::Qual> {
        self.incumbent.lock().unwrap().quality.clone()
    }

    /// The best solution state found so far, captured by deep clone at
    /// improvement time. `None` when nothing has been found, even if an
    /// upper bound seeded `best_quality`.
    pub fn best_quality_state(&self) -> Option<S> {
        self.incumbent.lock().unwrap().state.clone()
    }

    pub fn visited_nodes(&self) -> u64 {
        self.visited_nodes.load(Ordering::Relaxed)
    }

    /// Time spent searching; frozen once the run finishes.
    pub fn elapsed(&self) -> Duration {
        self.finished_after
            .get()
            .copied()
            .unwrap_or_else(|| self.started_at.elapsed())
    }

    pub fn is_finished(&self) -> bool {
        self.finished_after.get().is_some()
    }

    pub(crate) fn has_termination_trigger(&self) -> bool {
        self.runtime_limit.is_some() || self.node_limit.is_some() || self.cancellation.is_some()
    }
}

impl<S: Qualifiable> fmt::Debug for SearchControl<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchControl")
            .field("visited_nodes", &self.visited_nodes())
            .field("best_quality", &self.best_quality())
            .field("elapsed", &self.elapsed())
            .field("is_finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}
