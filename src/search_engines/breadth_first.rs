//! Breadth-first search, for both state flavors.

use crate::control::SearchControl;
use crate::frontiers::{Fifo, Frontier};
use crate::quality::Quality;
use crate::search_engines::{
    inspect_root, still_worth_expanding, width_or_unlimited, ConfigError,
};
use crate::state::{Branching, Reversible};

impl<S: Branching> SearchControl<S> {
    /// Breadth-first search. States at `depth_limit` are still visited
    /// but not expanded.
    pub fn breadth_first(
        self,
        filter_width: Option<usize>,
        depth_limit: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let filter_width = width_or_unlimited(filter_width, ConfigError::FilterWidth)?;
        let depth_limit = width_or_unlimited(depth_limit, ConfigError::DepthLimit)?;
        let root = self.initial_state().clone();
        if inspect_root(&self, &root) {
            breadth_first_from(&self, 0, root, filter_width, depth_limit);
        }
        self.finish();
        Ok(self)
    }
}

impl<R: Reversible> SearchControl<R> {
    /// Breadth-first search over a reversible state. Siblings cannot
    /// share one mutable state across a layer, so every child is a
    /// clone with one choice applied.
    pub fn breadth_first_reversible(
        self,
        filter_width: Option<usize>,
        depth_limit: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let filter_width = width_or_unlimited(filter_width, ConfigError::FilterWidth)?;
        let depth_limit = width_or_unlimited(depth_limit, ConfigError::DepthLimit)?;
        let root = self.initial_state().clone();
        if inspect_root(&self, &root) {
            breadth_first_reversible_from(&self, 0, root, filter_width, depth_limit);
        }
        self.finish();
        Ok(self)
    }
}

/// The breadth-first loop from an already inspected start state.
pub(crate) fn breadth_first_from<S: Branching>(
    control: &SearchControl<S>,
    depth: usize,
    start: S,
    filter_width: usize,
    depth_limit: usize,
) {
    let mut frontier = Fifo::new();
    frontier.store(depth, start);
    while let Some((depth, state)) = frontier.try_next() {
        control.log_if_needed();
        if control.should_stop() {
            break;
        }
        if depth >= depth_limit || !still_worth_expanding(control, &state) {
            continue;
        }
        for child in state.branches().take(filter_width) {
            let prune = !child.bound().is_better_than(control.best_quality().as_ref());
            control.visit_node(&child);
            if prune || child.is_terminal() {
                continue;
            }
            frontier.store(depth + 1, child);
        }
    }
}

fn breadth_first_reversible_from<R: Reversible>(
    control: &SearchControl<R>,
    depth: usize,
    start: R,
    filter_width: usize,
    depth_limit: usize,
) {
    let mut frontier = Fifo::new();
    frontier.store(depth, start);
    while let Some((depth, state)) = frontier.try_next() {
        control.log_if_needed();
        if control.should_stop() {
            break;
        }
        if depth >= depth_limit || !still_worth_expanding(control, &state) {
            continue;
        }
        for choice in state.choices().take(filter_width) {
            let mut child = state.clone();
            child.apply(choice);
            let prune = !child.bound().is_better_than(control.best_quality().as_ref());
            control.visit_node(&child);
            if prune || child.is_terminal() {
                continue;
            }
            frontier.store(depth + 1, child);
        }
    }
}
