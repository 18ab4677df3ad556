//! Monotonic beam search: instead of expanding a full layer before
//! pruning, each expanded node keeps only its `beam_width` best
//! children, which are then descended depth-first.

use crate::control::SearchControl;
use crate::frontiers::{Frontier, Lifo};
use crate::search_engines::beam::{inspect_child, Rank};
use crate::search_engines::{inspect_root, still_worth_expanding, width_or_unlimited, ConfigError};
use crate::state::Branching;

impl<S: Branching> SearchControl<S> {
    /// Depth-first search with a per-node fan-out cap of `beam_width`,
    /// ranked when a rank is supplied. `filter_width` caps how many
    /// branches are considered before ranking.
    pub fn monotonic_beam_search(
        self,
        beam_width: usize,
        rank: Option<Rank<S>>,
        filter_width: Option<usize>,
    ) -> Result<Self, ConfigError> {
        if beam_width == 0 {
            return Err(ConfigError::BeamWidth);
        }
        let filter_width = width_or_unlimited(filter_width, ConfigError::FilterWidth)?;
        let root = self.initial_state().clone();
        if inspect_root(&self, &root) {
            monotonic_beam_run(&self, root, beam_width, rank.as_ref(), filter_width);
        }
        self.finish();
        Ok(self)
    }
}

fn monotonic_beam_run<S: Branching>(
    control: &SearchControl<S>,
    root: S,
    beam_width: usize,
    rank: Option<&Rank<S>>,
    filter_width: usize,
) {
    let mut best_terminal = None;
    let mut frontier = Lifo::new();
    frontier.store(0, root);
    while let Some((depth, state)) = frontier.try_next() {
        control.log_if_needed();
        if control.should_stop() {
            break;
        }
        if !still_worth_expanding(control, &state) {
            continue;
        }
        let mut kept: Vec<S> = state
            .branches()
            .take(filter_width)
            .filter_map(|child| inspect_child(control, child, &mut best_terminal))
            .collect();
        if let Some(rank) = rank {
            kept.sort_by(|a, b| rank.compare(a, b));
        }
        kept.truncate(beam_width);
        for child in kept.into_iter().rev() {
            frontier.store(depth + 1, child);
        }
    }
}
