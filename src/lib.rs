#![warn(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
#![deny(unit_bindings)]
#![warn(unused_crate_dependencies)]
#![warn(unused_qualifications)]

pub mod control;
pub mod frontiers;
pub mod quality;
pub mod search_engines;
pub mod state;

pub use control::{CancellationToken, SearchControl};
pub use quality::{Maximize, Minimize, Quality, QualityValue};
pub use search_engines::{ConfigError, Rank};
pub use state::{Branching, BranchingAdapter, Qualifiable, Reversible};

#[cfg(test)]
mod test_utils;
