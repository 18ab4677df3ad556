//! Limited-discrepancy search. A discrepancy is a deviation from the
//! default first-child choice; paths with few discrepancies are
//! explored before paths with many.

use tracing::debug;

use crate::control::SearchControl;
use crate::quality::Quality;
use crate::search_engines::{inspect_root, ConfigError};
use crate::state::Branching;

impl<S: Branching> SearchControl<S> {
    /// Naive limited-discrepancy search: one probe exploring every path
    /// with at most `max_discrepancy` deviations, lower-discrepancy
    /// alternatives first at every node.
    pub fn naive_ld_search(self, max_discrepancy: usize) -> Result<Self, ConfigError> {
        let root = self.initial_state().clone();
        if inspect_root(&self, &root) {
            probe(&self, &root, max_discrepancy);
        }
        self.finish();
        Ok(self)
    }

    /// Anytime limited-discrepancy search: naive probes with budgets
    /// 0, 1, … `max_discrepancy`, so every finished pass establishes an
    /// incumbent before the next widens the sweep.
    pub fn anytime_ld_search(self, max_discrepancy: usize) -> Result<Self, ConfigError> {
        let root = self.initial_state().clone();
        if inspect_root(&self, &root) {
            for budget in 0..=max_discrepancy {
                if self.should_stop() {
                    break;
                }
                debug!(budget, "discrepancy budget widened");
                probe(&self, &root, budget);
            }
        }
        self.finish();
        Ok(self)
    }
}

fn probe<S: Branching>(control: &SearchControl<S>, state: &S, budget: usize) {
    control.log_if_needed();
    for (index, child) in state.branches().enumerate() {
        if control.should_stop() {
            return;
        }
        // The first child is the default; every other child costs one
        // discrepancy.
        if index > 0 && budget == 0 {
            break;
        }
        let remaining = if index == 0 { budget } else { budget - 1 };
        let prune = !child.bound().is_better_than(control.best_quality().as_ref());
        control.visit_node(&child);
        if prune || child.is_terminal() {
            continue;
        }
        probe(control, &child, remaining);
    }
}
