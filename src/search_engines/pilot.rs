//! The Pilot method: lookahead-guided greedy commit. At every step,
//! each candidate branch is evaluated by a bounded beam lookahead; the
//! branch whose lookahead finishes with the best full solution is
//! committed, and the walk repeats from there.

use crate::control::SearchControl;
use crate::quality::Quality;
use crate::search_engines::beam::{beam_from, Rank};
use crate::search_engines::{inspect_root, ConfigError};
use crate::state::Branching;

impl<S: Branching> SearchControl<S> {
    /// The Pilot method with a lookahead beam of `beam_width` (default
    /// one). With width one and no rank this degenerates to a greedy
    /// depth-first descent.
    pub fn pilot_method(
        self,
        beam_width: Option<usize>,
        rank: Option<Rank<S>>,
    ) -> Result<Self, ConfigError> {
        let beam_width = beam_width.unwrap_or(1);
        if beam_width == 0 {
            return Err(ConfigError::BeamWidth);
        }
        let root = self.initial_state().clone();
        if inspect_root(&self, &root) {
            pilot_run(&self, root, beam_width, rank.as_ref());
        }
        self.finish();
        Ok(self)
    }
}

fn pilot_run<S: Branching>(
    control: &SearchControl<S>,
    mut current: S,
    beam_width: usize,
    rank: Option<&Rank<S>>,
) {
    while !control.should_stop() && !current.is_terminal() {
        control.log_if_needed();
        let mut committed: Option<(S, S::Qual)> = None;
        let candidates: Vec<S> = current.branches().collect();
        for candidate in candidates {
            if control.should_stop() {
                break;
            }
            let prune = !candidate
                .bound()
                .is_better_than(control.best_quality().as_ref());
            control.visit_node(&candidate);
            // A terminal branch competes with its own quality; a pruned
            // branch cannot beat the incumbent, so its lookahead is
            // skipped.
            let lookahead = if candidate.is_terminal() {
                candidate.quality()
            } else if prune {
                None
            } else {
                beam_from(control, candidate.clone(), beam_width, rank)
            };
            let Some(quality) = lookahead else {
                continue;
            };
            let improves = match &committed {
                None => true,
                Some((_, best)) => quality.is_better_than(Some(best)),
            };
            if improves {
                committed = Some((candidate, quality));
            }
        }
        // No branch yielded a full solution: the walk ends.
        let Some((next, _)) = committed else {
            break;
        };
        current = next;
    }
}
