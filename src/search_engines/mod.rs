//! The search algorithms driving a [`SearchControl`](crate::SearchControl) run.
//!
//! Every engine is exposed as a method on the control, validates its
//! configuration synchronously, and returns the control after
//! finishing, so runs chain:
//!
//! ```ignore
//! let control = SearchControl::start(state)
//!     .with_node_limit(1_000_000)
//!     .depth_first(None)?;
//! ```

mod beam;
mod breadth_first;
mod depth_first;
mod lds;
mod mcts;
mod monotonic_beam;
mod parallel;
mod pilot;
mod rake;

pub use beam::Rank;

use crate::control::SearchControl;
use crate::quality::Quality;
use crate::state::Qualifiable;
use thiserror::Error;

/// Synchronous configuration errors, raised before a search does any
/// work.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("filter width must be at least one")]
    FilterWidth,
    #[error("beam width must be at least one")]
    BeamWidth,
    #[error("rake width must be at least one")]
    RakeWidth,
    #[error("depth limit must be at least one")]
    DepthLimit,
    #[error("degree of parallelism must be at least one")]
    DegreeOfParallelism,
    #[error("monte carlo tree search needs a runtime limit, a node limit or a cancellation token")]
    UnboundedMonteCarlo,
}

/// An absent width means unlimited; a zero width is a configuration
/// error.
pub(crate) fn width_or_unlimited(
    width: Option<usize>,
    zero: ConfigError,
) -> Result<usize, ConfigError> {
    match width {
        Some(0) => Err(zero),
        Some(width) => Ok(width),
        None => Ok(usize::MAX),
    }
}

/// Inspects the root of a run: the prune decision is taken against any
/// seeded upper bound before the visit, and the return value says
/// whether the root's subtree is worth expanding at all.
pub(crate) fn inspect_root<S: Qualifiable>(control: &SearchControl<S>, root: &S) -> bool {
    let prune = !root.bound().is_better_than(control.best_quality().as_ref());
    control.visit_node(root);
    !prune && !root.is_terminal()
}

/// Whether a state popped off a frontier is still worth expanding. The
/// incumbent may have improved since the state was stored, retroactively
/// pruning it.
pub(crate) fn still_worth_expanding<S: Qualifiable>(control: &SearchControl<S>, state: &S) -> bool {
    state.bound().is_better_than(control.best_quality().as_ref())
}
