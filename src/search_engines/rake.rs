//! Rake search: a breadth-first expansion diversifies the top of the
//! tree into a set of sub-roots, then an independent heuristic descent
//! runs from each.

use tracing::debug;

use crate::control::SearchControl;
use crate::frontiers::{BiLevelFifo, Fifo, Frontier};
use crate::search_engines::beam::{beam_from, inspect_child, Rank};
use crate::search_engines::depth_first::depth_first_from;
use crate::search_engines::{inspect_root, still_worth_expanding, ConfigError};
use crate::state::Branching;

impl<S: Branching> SearchControl<S> {
    /// Rake search: `rake_width` breadth-first sub-roots, each finished
    /// by a greedy depth-first descent.
    pub fn rake_search(self, rake_width: usize) -> Result<Self, ConfigError> {
        if rake_width == 0 {
            return Err(ConfigError::RakeWidth);
        }
        let mut seeds = seed_frontier(&self, rake_width);
        while let Some((depth, seed)) = seeds.try_next() {
            if self.should_stop() {
                break;
            }
            depth_first_from(&self, depth, seed, 1);
        }
        self.finish();
        Ok(self)
    }

    /// Rake-and-beam: like [`Self::rake_search`], with the greedy tail
    /// replaced by a beam of `beam_width` per sub-root.
    pub fn rake_and_beam_search(
        self,
        rake_width: usize,
        beam_width: usize,
        rank: Option<Rank<S>>,
    ) -> Result<Self, ConfigError> {
        if rake_width == 0 {
            return Err(ConfigError::RakeWidth);
        }
        if beam_width == 0 {
            return Err(ConfigError::BeamWidth);
        }
        let mut seeds = seed_frontier(&self, rake_width);
        while let Some((_, seed)) = seeds.try_next() {
            if self.should_stop() {
                break;
            }
            beam_from(&self, seed, beam_width, rank.as_ref());
        }
        self.finish();
        Ok(self)
    }
}

/// Expands the root breadth-first until the frontier carries at least
/// `width` states or the tree is exhausted. Every state on the returned
/// frontier has been inspected already. Shared with the parallel
/// engines, which seed their workers the same way.
pub(crate) fn seed_frontier<S: Branching>(control: &SearchControl<S>, width: usize) -> Fifo<S> {
    let mut frontier = BiLevelFifo::new();
    let root = control.initial_state().clone();
    if inspect_root(control, &root) {
        frontier.store(0, root);
        frontier.swap_queues();
    }
    let mut best_terminal = None;
    while frontier.len() < width && !control.should_stop() {
        control.log_if_needed();
        let Some((depth, state)) = frontier.try_next() else {
            frontier.swap_queues();
            if frontier.is_empty() {
                break;
            }
            continue;
        };
        if !still_worth_expanding(control, &state) {
            continue;
        }
        for child in state.branches() {
            if let Some(child) = inspect_child(control, child, &mut best_terminal) {
                frontier.store(depth + 1, child);
            }
        }
    }
    debug!(seeds = frontier.len(), "seed frontier built");
    frontier.into_single_level()
}
