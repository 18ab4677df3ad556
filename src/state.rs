//! The state contract the engines search over. States come in two
//! flavors sharing the [`Qualifiable`] base: [`Branching`] states fan
//! out into independent children, [`Reversible`] states advance in
//! place and rewind through an undo trail.

use crate::quality::Quality;
use std::fmt;

/// Common base of every searchable state.
pub trait Qualifiable: Clone + fmt::Debug {
    type Qual: Quality;

    /// True at a leaf of the search tree.
    fn is_terminal(&self) -> bool;

    /// Optimistic completion estimate: no state reachable from `self`
    /// may have a quality strictly better than this. This is the sole
    /// pruning contract.
    fn bound(&self) -> Self::Qual;

    /// The quality of the solution this state represents, if it
    /// represents one. May be present at any depth; must be present on
    /// terminal states.
    fn quality(&self) -> Option<Self::Qual>;
}

/// A state that branches into new independent child states.
pub trait Branching: Qualifiable {
    /// The children of this state. The sequence is finite, evaluated
    /// lazily, and its order conveys the implementer's preference.
    fn branches(&self) -> Box<dyn Iterator<Item = Self> + '_>;
}

/// A state advanced in place by choices and rewound through an undo
/// trail. `apply(c)` followed by `undo_last()` must restore the state
/// observably.
pub trait Reversible: Qualifiable {
    type Choice: Clone + fmt::Debug;

    /// The choices applicable to the current state, preference order
    /// first.
    fn choices(&self) -> Box<dyn Iterator<Item = Self::Choice> + '_>;

    /// Advances the state. Reverted by exactly one `undo_last`.
    fn apply(&mut self, choice: Self::Choice);

    /// Reverts the most recent `apply`.
    fn undo_last(&mut self);
}

/// Presents a reversible state as a branching one by cloning on every
/// branch. Loses the efficiency of the undo trail, but lets reversible
/// models run on any engine written against [`Branching`].
#[derive(Debug, Clone, PartialEq)]
pub struct BranchingAdapter<R: Reversible> {
    inner: R,
}

impl<R: Reversible> BranchingAdapter<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Reversible> Qualifiable for BranchingAdapter<R> {
    type Qual = R::Qual;

    fn is_terminal(&self) -> bool {
        self.inner.is_terminal()
    }

    fn bound(&self) -> Self::Qual {
        self.inner.bound()
    }

    fn quality(&self) -> Option<Self::Qual> {
        self.inner.quality()
    }
}

impl<R: Reversible> Branching for BranchingAdapter<R> {
    fn branches(&self) -> Box<dyn Iterator<Item = Self> + '_> {
        Box::new(self.inner.choices().map(move |choice| {
            let mut child = self.inner.clone();
            child.apply(choice);
            Self { inner: child }
        }))
    }
}
