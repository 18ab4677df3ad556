//! Beam search with two distinct promotion policies: round-robin when
//! no rank is supplied (protects diversity across parents) and
//! rank-ordered when one is.

use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;

use crate::control::SearchControl;
use crate::quality::Quality;
use crate::search_engines::{inspect_root, still_worth_expanding, ConfigError};
use crate::state::{Branching, Qualifiable};

/// A total preorder over states, used to promote the most promising
/// survivors of a layer. Sorting is stable, so ties keep the branch
/// enumeration order.
pub struct Rank<S> {
    compare: Box<dyn Fn(&S, &S) -> Ordering + Send + Sync>,
}

impl<S> fmt::Debug for Rank<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rank").finish_non_exhaustive()
    }
}

impl<S: Qualifiable> Rank<S> {
    pub fn new(compare: impl Fn(&S, &S) -> Ordering + Send + Sync + 'static) -> Self {
        Self {
            compare: Box::new(compare),
        }
    }

    /// Best bound first, according to the quality sense: for a
    /// maximization problem a larger bound ranks earlier, for a
    /// minimization problem a smaller one.
    pub fn by_bound() -> Self {
        Self::new(|a: &S, b: &S| {
            let (a, b) = (a.bound(), b.bound());
            if a.is_better_than(Some(&b)) {
                Ordering::Less
            } else if b.is_better_than(Some(&a)) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
    }

    pub fn compare(&self, a: &S, b: &S) -> Ordering {
        (self.compare)(a, b)
    }
}

impl<S: Branching> SearchControl<S> {
    /// Beam search keeping at most `beam_width` states per layer.
    /// Without a rank, promotion is round-robin across parents; with
    /// one, the whole layer is sorted and truncated.
    pub fn beam_search(self, beam_width: usize, rank: Option<Rank<S>>) -> Result<Self, ConfigError> {
        if beam_width == 0 {
            return Err(ConfigError::BeamWidth);
        }
        let root = self.initial_state().clone();
        if inspect_root(&self, &root) {
            beam_from(&self, root, beam_width, rank.as_ref());
        }
        self.finish();
        Ok(self)
    }
}

/// The beam loop from an already inspected start state. Returns the
/// best terminal quality generated during this run, even when that
/// quality did not beat the shared incumbent; the pilot method compares
/// lookaheads with it.
pub(crate) fn beam_from<S: Branching>(
    control: &SearchControl<S>,
    start: S,
    beam_width: usize,
    rank: Option<&Rank<S>>,
) -> Option<S::Qual> {
    let mut best_terminal: Option<S::Qual> = None;
    let mut layer = vec![start];
    while !layer.is_empty() && !control.should_stop() {
        control.log_if_needed();
        layer = match rank {
            None => round_robin_layer(control, &layer, beam_width, &mut best_terminal),
            Some(rank) => ranked_layer(control, &layer, beam_width, rank, &mut best_terminal),
        };
    }
    best_terminal
}

/// Inspects one generated child: prune before visit, record terminal
/// qualities, and hand back the child only if its subtree is worth
/// keeping.
pub(crate) fn inspect_child<S: Qualifiable>(
    control: &SearchControl<S>,
    child: S,
    best_terminal: &mut Option<S::Qual>,
) -> Option<S> {
    let prune = !child.bound().is_better_than(control.best_quality().as_ref());
    control.visit_node(&child);
    if child.is_terminal() {
        if let Some(quality) = child.quality() {
            if quality.is_better_than(best_terminal.as_ref()) {
                *best_terminal = Some(quality);
            }
        }
        return None;
    }
    if prune {
        None
    } else {
        Some(child)
    }
}

/// Promotion takes the first branch of every parent, then the second,
/// and so on, so a single fan-out-heavy parent cannot monopolize the
/// beam. Per-parent queues stop filling beyond `beam_width` entries.
fn round_robin_layer<S: Branching>(
    control: &SearchControl<S>,
    layer: &[S],
    beam_width: usize,
    best_terminal: &mut Option<S::Qual>,
) -> Vec<S> {
    let mut per_parent: Vec<VecDeque<S>> = Vec::with_capacity(layer.len());
    for parent in layer {
        if control.should_stop() {
            break;
        }
        let mut queue = VecDeque::new();
        if still_worth_expanding(control, parent) {
            for child in parent.branches() {
                if queue.len() >= beam_width {
                    break;
                }
                if let Some(child) = inspect_child(control, child, best_terminal) {
                    queue.push_back(child);
                }
            }
        }
        per_parent.push(queue);
    }
    let mut promoted = Vec::new();
    'promotion: loop {
        let mut drained = true;
        for queue in &mut per_parent {
            if let Some(child) = queue.pop_front() {
                promoted.push(child);
                drained = false;
                if promoted.len() >= beam_width {
                    break 'promotion;
                }
            }
        }
        if drained {
            break;
        }
    }
    promoted
}

/// All survivors of the layer gathered into one list, stably sorted by
/// the rank, top `beam_width` promoted.
fn ranked_layer<S: Branching>(
    control: &SearchControl<S>,
    layer: &[S],
    beam_width: usize,
    rank: &Rank<S>,
    best_terminal: &mut Option<S::Qual>,
) -> Vec<S> {
    let mut survivors = Vec::new();
    for parent in layer {
        if control.should_stop() {
            break;
        }
        if !still_worth_expanding(control, parent) {
            continue;
        }
        survivors.extend(
            parent
                .branches()
                .filter_map(|child| inspect_child(control, child, best_terminal)),
        );
    }
    let mut promoted = survivors
        .into_iter()
        .sorted_by(|a, b| rank.compare(a, b))
        .collect_vec();
    promoted.truncate(beam_width);
    promoted
}
