//! Shared fixtures for the crate's tests: small optimization models
//! exercising both sides of the state contract.

use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use crate::quality::{Maximize, Minimize};
use crate::state::{Branching, Qualifiable, Reversible};

/// Installs a subscriber printing to the test writer. Safe to call from
/// several tests; only the first call wins.
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------
// {0,1}-knapsack, reversible. Items are decided in efficiency order;
// taking an item is always offered before skipping it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnapsackItem {
    pub profit: u64,
    pub weight: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnapsackChoice {
    Take,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Knapsack {
    items: Arc<Vec<KnapsackItem>>,
    taken: Vec<bool>,
    free_capacity: u64,
    profit: u64,
}

impl Knapsack {
    pub fn new(mut items: Vec<KnapsackItem>, capacity: u64) -> Self {
        // Most profit per unit of weight first.
        items.sort_by(|a, b| (b.profit * a.weight).cmp(&(a.profit * b.weight)));
        Self {
            items: Arc::new(items),
            taken: Vec::new(),
            free_capacity: capacity,
            profit: 0,
        }
    }

    /// Three items, capacity seven, optimum nine (the two lightest).
    pub fn small() -> Self {
        Self::new(
            vec![
                KnapsackItem {
                    profit: 6,
                    weight: 5,
                },
                KnapsackItem {
                    profit: 5,
                    weight: 4,
                },
                KnapsackItem {
                    profit: 4,
                    weight: 3,
                },
            ],
            7,
        )
    }

    /// A reproducible instance: `n` items with profits and weights
    /// drawn from 1..100, capacity half the total weight.
    pub fn seeded(seed: u64, n: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let profits: Vec<u64> = (0..n).map(|_| rng.gen_range(1..100)).collect();
        let weights: Vec<u64> = (0..n).map(|_| rng.gen_range(1..100)).collect();
        let capacity = (weights.iter().sum::<u64>() as f64 * 0.5).round() as u64;
        let items = profits
            .into_iter()
            .zip(weights)
            .map(|(profit, weight)| KnapsackItem { profit, weight })
            .collect();
        Self::new(items, capacity)
    }

    fn decided(&self) -> usize {
        self.taken.len()
    }
}

impl Qualifiable for Knapsack {
    type Qual = Maximize<u64>;

    fn is_terminal(&self) -> bool {
        self.decided() == self.items.len()
    }

    fn bound(&self) -> Self::Qual {
        // Fractional relaxation in integer arithmetic: fill whole items
        // in efficiency order, then the truncated share of the first
        // item that no longer fits.
        let mut capacity = self.free_capacity;
        let mut bound = self.profit;
        for item in &self.items[self.decided()..] {
            if item.weight <= capacity {
                capacity -= item.weight;
                bound += item.profit;
            } else {
                bound += item.profit * capacity / item.weight;
                break;
            }
        }
        Maximize(bound)
    }

    fn quality(&self) -> Option<Self::Qual> {
        // Any partial selection is feasible.
        Some(Maximize(self.profit))
    }
}

impl Reversible for Knapsack {
    type Choice = KnapsackChoice;

    fn choices(&self) -> Box<dyn Iterator<Item = KnapsackChoice> + '_> {
        if self.is_terminal() {
            return Box::new(std::iter::empty());
        }
        let mut choices = Vec::with_capacity(2);
        if self.items[self.decided()].weight <= self.free_capacity {
            choices.push(KnapsackChoice::Take);
        }
        choices.push(KnapsackChoice::Skip);
        Box::new(choices.into_iter())
    }

    fn apply(&mut self, choice: KnapsackChoice) {
        match choice {
            KnapsackChoice::Take => {
                let item = self.items[self.decided()];
                self.free_capacity -= item.weight;
                self.profit += item.profit;
                self.taken.push(true);
            }
            KnapsackChoice::Skip => self.taken.push(false),
        }
    }

    fn undo_last(&mut self) {
        let took = self.taken.pop().expect("undo without a matching apply");
        if took {
            let item = self.items[self.decided()];
            self.free_capacity += item.weight;
            self.profit -= item.profit;
        }
    }
}

// ---------------------------------------------------------------------
// Euclidean TSP, reversible. The tour starts at city 0 and the choices
// yield the nearest unvisited city first, so a greedy descent is the
// nearest-neighbour construction.

#[derive(Debug, Clone, PartialEq)]
pub struct Tsp {
    coords: Arc<Vec<(f64, f64)>>,
    tour: Vec<usize>,
    visited: Vec<bool>,
}

impl Tsp {
    pub fn new(coords: Vec<(f64, f64)>) -> Self {
        let cities = coords.len();
        let mut visited = vec![false; cities];
        visited[0] = true;
        Self {
            coords: Arc::new(coords),
            tour: vec![0],
            visited,
        }
    }

    pub fn berlin52() -> Self {
        Self::new(BERLIN52.to_vec())
    }

    fn distance(&self, from: usize, to: usize) -> f64 {
        let (x1, y1) = self.coords[from];
        let (x2, y2) = self.coords[to];
        ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()
    }

    fn current(&self) -> usize {
        *self.tour.last().expect("the tour always contains the start")
    }

    fn travelled(&self) -> f64 {
        self.tour.windows(2).map(|leg| self.distance(leg[0], leg[1])).sum()
    }
}

impl Qualifiable for Tsp {
    type Qual = Minimize<OrderedFloat<f64>>;

    fn is_terminal(&self) -> bool {
        self.tour.len() == self.coords.len()
    }

    fn bound(&self) -> Self::Qual {
        Minimize(OrderedFloat(self.travelled()))
    }

    fn quality(&self) -> Option<Self::Qual> {
        if !self.is_terminal() {
            return None;
        }
        let closing = self.distance(self.current(), 0);
        Some(Minimize(OrderedFloat(self.travelled() + closing)))
    }
}

impl Reversible for Tsp {
    type Choice = usize;

    fn choices(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        let from = self.current();
        let mut next: Vec<usize> = (0..self.coords.len())
            .filter(|&city| !self.visited[city])
            .collect();
        // Stable sort: equidistant cities stay in index order.
        next.sort_by(|&a, &b| {
            self.distance(from, a)
                .partial_cmp(&self.distance(from, b))
                .expect("distances are finite")
        });
        Box::new(next.into_iter())
    }

    fn apply(&mut self, city: usize) {
        self.visited[city] = true;
        self.tour.push(city);
    }

    fn undo_last(&mut self) {
        let city = self.tour.pop().expect("undo without a matching apply");
        self.visited[city] = false;
    }
}

/// The tour length the nearest-neighbour construction yields from city
/// 0, computed directly for cross-checking the search engines.
pub fn greedy_nearest_neighbour_length() -> f64 {
    let tsp = Tsp::berlin52();
    let cities = BERLIN52.len();
    let mut visited = vec![false; cities];
    visited[0] = true;
    let mut current = 0;
    let mut length = 0.0;
    for _ in 1..cities {
        let mut nearest = None;
        let mut nearest_distance = f64::INFINITY;
        for city in 0..cities {
            if visited[city] {
                continue;
            }
            let distance = tsp.distance(current, city);
            if distance < nearest_distance {
                nearest_distance = distance;
                nearest = Some(city);
            }
        }
        let next = nearest.expect("an unvisited city remains");
        visited[next] = true;
        length += nearest_distance;
        current = next;
    }
    length + tsp.distance(current, 0)
}

const BERLIN52: [(f64, f64); 52] = [
    (565.0, 575.0),
    (25.0, 185.0),
    (345.0, 750.0),
    (945.0, 685.0),
    (845.0, 655.0),
    (880.0, 660.0),
    (25.0, 230.0),
    (525.0, 1000.0),
    (580.0, 1175.0),
    (650.0, 1130.0),
    (1605.0, 620.0),
    (1220.0, 580.0),
    (1465.0, 200.0),
    (1530.0, 5.0),
    (845.0, 680.0),
    (725.0, 370.0),
    (145.0, 665.0),
    (415.0, 635.0),
    (510.0, 875.0),
    (560.0, 365.0),
    (300.0, 465.0),
    (520.0, 585.0),
    (480.0, 415.0),
    (835.0, 625.0),
    (975.0, 580.0),
    (1215.0, 245.0),
    (1320.0, 315.0),
    (1250.0, 400.0),
    (660.0, 180.0),
    (410.0, 250.0),
    (420.0, 555.0),
    (575.0, 665.0),
    (1150.0, 1160.0),
    (700.0, 580.0),
    (685.0, 595.0),
    (685.0, 610.0),
    (770.0, 610.0),
    (795.0, 645.0),
    (720.0, 635.0),
    (760.0, 650.0),
    (475.0, 960.0),
    (95.0, 260.0),
    (875.0, 920.0),
    (700.0, 500.0),
    (555.0, 815.0),
    (830.0, 485.0),
    (1170.0, 65.0),
    (830.0, 610.0),
    (605.0, 625.0),
    (595.0, 360.0),
    (1340.0, 725.0),
    (1740.0, 245.0),
];

// ---------------------------------------------------------------------
// Choose-smallest: a chain of `size` monotonically increasing picks,
// minimizing their sum. The leftmost descent is optimal, which makes
// traversal comparisons easy to reason about.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChooseSmallest {
    size: usize,
    picks: Vec<u64>,
}

impl ChooseSmallest {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            picks: Vec::new(),
        }
    }

    fn last(&self) -> u64 {
        self.picks.last().copied().unwrap_or(0)
    }

    fn sum(&self) -> u64 {
        self.picks.iter().sum()
    }
}

impl Qualifiable for ChooseSmallest {
    type Qual = Minimize<u64>;

    fn is_terminal(&self) -> bool {
        self.picks.len() == self.size
    }

    fn bound(&self) -> Self::Qual {
        // The cheapest completion increments by one at every remaining
        // level.
        let remaining = (self.size - self.picks.len()) as u64;
        let cheapest_tail = remaining * self.last() + remaining * (remaining + 1) / 2;
        Minimize(self.sum() + cheapest_tail)
    }

    fn quality(&self) -> Option<Self::Qual> {
        self.is_terminal().then(|| Minimize(self.sum()))
    }
}

impl Reversible for ChooseSmallest {
    type Choice = u64;

    fn choices(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        if self.is_terminal() {
            return Box::new(std::iter::empty());
        }
        let last = self.last();
        Box::new((1..=3).map(move |step| last + step))
    }

    fn apply(&mut self, pick: u64) {
        self.picks.push(pick);
    }

    fn undo_last(&mut self) {
        self.picks.pop().expect("undo without a matching apply");
    }
}

// ---------------------------------------------------------------------
// An explicitly scripted branching tree, for tests that need full
// control over bounds and qualities. Maximizing.

#[derive(Debug, Clone, PartialEq, Eq)]
struct ScriptedNode {
    bound: i64,
    quality: Option<i64>,
    children: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedTree {
    nodes: Arc<Vec<ScriptedNode>>,
    current: usize,
}

#[derive(Debug, Default)]
pub struct ScriptedTreeBuilder {
    nodes: Vec<ScriptedNode>,
}

impl ScriptedTree {
    pub fn builder() -> ScriptedTreeBuilder {
        ScriptedTreeBuilder::default()
    }

    /// A single terminal node whose bound equals its quality.
    pub fn leaf(quality: i64) -> Self {
        let mut builder = Self::builder();
        let leaf = builder.leaf_node(quality, quality);
        builder.finish(leaf)
    }

    /// A root over one internal child per slice, each fanning out into
    /// terminal leaves with the given qualities. Bounds are the subtree
    /// maxima.
    pub fn two_level(subtrees: &[&[i64]]) -> Self {
        let mut builder = Self::builder();
        let mut children = Vec::with_capacity(subtrees.len());
        let mut root_bound = i64::MIN;
        for leaves in subtrees {
            let bound = leaves.iter().copied().max().expect("subtrees are nonempty");
            root_bound = root_bound.max(bound);
            let leaf_nodes = leaves.iter().map(|&q| builder.leaf_node(q, q)).collect();
            children.push(builder.internal(bound, leaf_nodes));
        }
        builder.root(root_bound, children)
    }
}

impl ScriptedTreeBuilder {
    pub fn leaf_node(&mut self, bound: i64, quality: i64) -> usize {
        self.push(ScriptedNode {
            bound,
            quality: Some(quality),
            children: Vec::new(),
        })
    }

    pub fn internal(&mut self, bound: i64, children: Vec<usize>) -> usize {
        self.push(ScriptedNode {
            bound,
            quality: None,
            children,
        })
    }

    pub fn root(mut self, bound: i64, children: Vec<usize>) -> ScriptedTree {
        let root = self.internal(bound, children);
        self.finish(root)
    }

    fn push(&mut self, node: ScriptedNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn finish(self, root: usize) -> ScriptedTree {
        ScriptedTree {
            nodes: Arc::new(self.nodes),
            current: root,
        }
    }
}

impl Qualifiable for ScriptedTree {
    type Qual = Maximize<i64>;

    fn is_terminal(&self) -> bool {
        self.nodes[self.current].children.is_empty()
    }

    fn bound(&self) -> Self::Qual {
        Maximize(self.nodes[self.current].bound)
    }

    fn quality(&self) -> Option<Self::Qual> {
        self.nodes[self.current].quality.map(Maximize)
    }
}

impl Branching for ScriptedTree {
    fn branches(&self) -> Box<dyn Iterator<Item = Self> + '_> {
        Box::new(
            self.nodes[self.current]
                .children
                .iter()
                .map(move |&child| Self {
                    nodes: Arc::clone(&self.nodes),
                    current: child,
                }),
        )
    }
}

// ---------------------------------------------------------------------
// An infinite binary tree with no terminals: only a termination
// trigger can stop a search over it.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endless {
    depth: u64,
}

impl Endless {
    pub fn new() -> Self {
        Self { depth: 0 }
    }
}

impl Qualifiable for Endless {
    type Qual = Maximize<i64>;

    fn is_terminal(&self) -> bool {
        false
    }

    fn bound(&self) -> Self::Qual {
        Maximize(1)
    }

    fn quality(&self) -> Option<Self::Qual> {
        None
    }
}

impl Branching for Endless {
    fn branches(&self) -> Box<dyn Iterator<Item = Self> + '_> {
        let depth = self.depth;
        Box::new((0..2).map(move |_| Self { depth: depth + 1 }))
    }
}
