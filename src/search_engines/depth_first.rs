//! Depth-first branch-and-bound, for both state flavors.

use crate::control::SearchControl;
use crate::frontiers::{Frontier, Lifo};
use crate::quality::Quality;
use crate::search_engines::{
    inspect_root, still_worth_expanding, width_or_unlimited, ConfigError,
};
use crate::state::{Branching, Reversible};

impl<S: Branching> SearchControl<S> {
    /// Depth-first branch-and-bound. `filter_width` caps how many
    /// branches of each node are ever explored; `None` explores all.
    pub fn depth_first(self, filter_width: Option<usize>) -> Result<Self, ConfigError> {
        let filter_width = width_or_unlimited(filter_width, ConfigError::FilterWidth)?;
        let root = self.initial_state().clone();
        if inspect_root(&self, &root) {
            depth_first_from(&self, 0, root, filter_width);
        }
        self.finish();
        Ok(self)
    }
}

impl<R: Reversible> SearchControl<R> {
    /// Depth-first branch-and-bound over a single mutable state. The
    /// frontier stores choices rather than states; the state rewinds
    /// through its undo trail whenever the next entry sits at a
    /// shallower depth.
    pub fn depth_first_reversible(self, filter_width: Option<usize>) -> Result<Self, ConfigError> {
        let filter_width = width_or_unlimited(filter_width, ConfigError::FilterWidth)?;
        depth_first_reversible_run(&self, filter_width);
        self.finish();
        Ok(self)
    }
}

/// The depth-first loop from an already inspected start state.
pub(crate) fn depth_first_from<S: Branching>(
    control: &SearchControl<S>,
    depth: usize,
    start: S,
    filter_width: usize,
) {
    let mut frontier = Lifo::new();
    frontier.store(depth, start);
    while let Some((depth, state)) = frontier.try_next() {
        control.log_if_needed();
        if control.should_stop() {
            break;
        }
        if !still_worth_expanding(control, &state) {
            continue;
        }
        // Branches are pushed in reverse so the first branch pops next,
        // preserving the implementer's preference order.
        let children: Vec<S> = state.branches().take(filter_width).collect();
        for child in children.into_iter().rev() {
            // The prune decision is taken before the visit: the visit
            // may install this very state as the incumbent, which must
            // not retroactively prune it.
            let prune = !child.bound().is_better_than(control.best_quality().as_ref());
            control.visit_node(&child);
            if prune || child.is_terminal() {
                continue;
            }
            frontier.store(depth + 1, child);
        }
    }
}

fn depth_first_reversible_run<R: Reversible>(control: &SearchControl<R>, filter_width: usize) {
    let mut state = control.initial_state().clone();
    if !inspect_root(control, &state) {
        return;
    }
    let mut frontier: Lifo<R::Choice> = Lifo::new();
    store_choices(&mut frontier, &state, 1, filter_width);
    let mut current_depth = 0;
    while let Some((depth, choice)) = frontier.try_next() {
        control.log_if_needed();
        if control.should_stop() {
            break;
        }
        // Rewind to the entry's parent depth before applying.
        while current_depth >= depth {
            state.undo_last();
            current_depth -= 1;
        }
        state.apply(choice);
        current_depth = depth;
        let prune = !state.bound().is_better_than(control.best_quality().as_ref());
        control.visit_node(&state);
        // Pruning skips the children-generation step only; backtracking
        // happens naturally through the depth markers. The incumbent,
        // if captured, was captured by deep clone, so no extra undo is
        // needed here.
        if !prune && !state.is_terminal() {
            store_choices(&mut frontier, &state, depth + 1, filter_width);
        }
    }
}

fn store_choices<R: Reversible>(
    frontier: &mut Lifo<R::Choice>,
    state: &R,
    depth: usize,
    filter_width: usize,
) {
    let choices: Vec<R::Choice> = state.choices().take(filter_width).collect();
    for choice in choices.into_iter().rev() {
        frontier.store(depth, choice);
    }
}
