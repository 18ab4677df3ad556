//! Monte Carlo tree search with adaptive UCB. The tree is an arena
//! owned by the run; parent links are indices, so no node outlives the
//! search and backpropagation walks plain integers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::control::SearchControl;
use crate::quality::Quality;
use crate::search_engines::ConfigError;
use crate::state::Branching;

/// Exploration decays after a successful expansion and re-inflates when
/// selection dead-ends in a terminal.
const CONFIDENCE_DECAY: f64 = 0.903602;
const CONFIDENCE_REINFLATE: f64 = 1.5;
const DEFAULT_CONFIDENCE: f64 = std::f64::consts::SQRT_2;

struct Node<S> {
    state: S,
    parent: Option<usize>,
    children: Vec<usize>,
    visits: u32,
    score: f64,
}

impl<S> Node<S> {
    fn new(state: S, parent: Option<usize>) -> Self {
        Self {
            state,
            parent,
            children: Vec::new(),
            visits: 0,
            score: 0.0,
        }
    }

    fn mean_score(&self) -> f64 {
        self.score / f64::from(self.visits)
    }
}

impl<S: Branching> SearchControl<S> {
    /// Monte Carlo tree search. The search only ends on a termination
    /// trigger, so configuring at least one of a runtime limit, a node
    /// limit or a cancellation token is required.
    pub fn mcts(
        self,
        confidence: Option<f64>,
        adaptive: bool,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        mcts_run(&self, confidence, adaptive, seed)?;
        self.finish();
        Ok(self)
    }

    /// Like [`Self::mcts`], additionally returning the root child with
    /// the best mean score (ties broken by discovery order), or the
    /// root itself when no child was ever visited.
    pub fn mcts_recommend(
        self,
        confidence: Option<f64>,
        adaptive: bool,
        seed: Option<u64>,
    ) -> Result<(Self, S), ConfigError> {
        let recommendation = mcts_run(&self, confidence, adaptive, seed)?;
        self.finish();
        Ok((self, recommendation))
    }
}

fn mcts_run<S: Branching>(
    control: &SearchControl<S>,
    confidence: Option<f64>,
    adaptive: bool,
    seed: Option<u64>,
) -> Result<S, ConfigError> {
    if !control.has_termination_trigger() {
        return Err(ConfigError::UnboundedMonteCarlo);
    }
    let mut confidence = confidence.unwrap_or(DEFAULT_CONFIDENCE);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let root = control.initial_state().clone();
    control.visit_node(&root);
    let mut arena = vec![Node::new(root, None)];

    while !control.should_stop() {
        control.log_if_needed();
        let selected = select(&arena, confidence);
        if arena[selected].state.is_terminal() {
            // Selection dead-ended: the terminal is inspected again,
            // its quality credited to the path, and exploration
            // re-inflated. The repeated inspection also keeps a
            // node-limit-only run terminating on exhausted trees.
            control.visit_node(&arena[selected].state);
            if adaptive {
                confidence *= CONFIDENCE_REINFLATE;
                debug!(confidence, "confidence re-inflated");
            }
            let reward = arena[selected].state.quality().map(|q| q.reward());
            backpropagate(&mut arena, selected, reward);
            continue;
        }
        let Some(chosen) = expand(control, &mut arena, selected, &mut rng) else {
            // A non-terminal state without branches: nothing to descend
            // into, nothing to credit.
            control.visit_node(&arena[selected].state);
            backpropagate(&mut arena, selected, None);
            continue;
        };
        if adaptive {
            confidence *= CONFIDENCE_DECAY;
        }
        let reward = simulate(control, arena[chosen].state.clone(), &mut rng);
        backpropagate(&mut arena, chosen, reward);
    }

    Ok(recommendation(&arena))
}

/// Descends from the root along the highest UCB child until reaching a
/// terminal or a node without children. An unvisited child is taken
/// immediately.
fn select<S: Branching>(arena: &[Node<S>], confidence: f64) -> usize {
    let mut index = 0;
    loop {
        let node = &arena[index];
        if node.state.is_terminal() || node.children.is_empty() {
            return index;
        }
        index = best_child_by_ucb(arena, index, confidence);
    }
}

fn best_child_by_ucb<S: Branching>(arena: &[Node<S>], parent: usize, confidence: f64) -> usize {
    let parent_visits = f64::from(arena[parent].visits);
    let mut best = None;
    let mut best_score = f64::NEG_INFINITY;
    for &child in &arena[parent].children {
        let visits = arena[child].visits;
        if visits == 0 {
            return child;
        }
        let exploration = confidence * (parent_visits.ln() / f64::from(visits)).sqrt();
        let ucb = arena[child].mean_score() + exploration;
        if ucb > best_score {
            best_score = ucb;
            best = Some(child);
        }
    }
    best.expect("selection only descends into nodes with children")
}

/// Creates a child node per branch, visiting each in the control, and
/// picks the node to simulate from: the first terminal child if any,
/// otherwise a uniformly random child.
fn expand<S: Branching>(
    control: &SearchControl<S>,
    arena: &mut Vec<Node<S>>,
    parent: usize,
    rng: &mut StdRng,
) -> Option<usize> {
    let branches: Vec<S> = arena[parent].state.branches().collect();
    if branches.is_empty() {
        return None;
    }
    let mut first_terminal = None;
    for state in branches {
        control.visit_node(&state);
        let terminal = state.is_terminal();
        let index = arena.len();
        arena.push(Node::new(state, Some(parent)));
        arena[parent].children.push(index);
        if terminal && first_terminal.is_none() {
            first_terminal = Some(index);
        }
    }
    Some(first_terminal.unwrap_or_else(|| {
        let children = &arena[parent].children;
        children[rng.gen_range(0..children.len())]
    }))
}

/// Uniform random rollout to a terminal. Each step picks a branch by
/// reservoir sampling: at the `i`-th branch, a swap happens with
/// probability `1/i`, so one pass over the lazy sequence suffices.
fn simulate<S: Branching>(
    control: &SearchControl<S>,
    mut state: S,
    rng: &mut StdRng,
) -> Option<f64> {
    while !state.is_terminal() {
        if control.should_stop() {
            return None;
        }
        let mut picked: Option<S> = None;
        for (seen, branch) in state.branches().enumerate() {
            if seen == 0 || rng.gen_range(0..=seen) == 0 {
                picked = Some(branch);
            }
        }
        match picked {
            None => return None,
            Some(next) => {
                control.visit_node(&next);
                state = next;
            }
        }
    }
    state.quality().map(|quality| quality.reward())
}

/// Walks the parent links to the root, counting the visit and adding
/// the rollout's reward.
fn backpropagate<S: Branching>(arena: &mut [Node<S>], from: usize, reward: Option<f64>) {
    let reward = reward.unwrap_or(0.0);
    let mut cursor = Some(from);
    while let Some(index) = cursor {
        arena[index].visits += 1;
        arena[index].score += reward;
        cursor = arena[index].parent;
    }
}

fn recommendation<S: Branching>(arena: &[Node<S>]) -> S {
    let mut best = None;
    let mut best_mean = f64::NEG_INFINITY;
    for &child in &arena[0].children {
        let node = &arena[child];
        if node.visits == 0 {
            continue;
        }
        // Strict comparison keeps the earliest discovered child on
        // ties.
        if node.mean_score() > best_mean {
            best_mean = node.mean_score();
            best = Some(child);
        }
    }
    arena[best.unwrap_or(0)].state.clone()
}
