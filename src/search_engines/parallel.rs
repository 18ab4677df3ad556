//! Parallel variants: the top of the tree is expanded breadth-first
//! into at least `max_degree_of_parallelism` sub-roots, which a worker
//! pool searches with the single-threaded engines. The shared control
//! is the only synchronization point, and its incumbent doubles as a
//! cross-worker pruning signal.

use scoped_threadpool::Pool;

use crate::control::SearchControl;
use crate::frontiers::Frontier;
use crate::search_engines::beam::{beam_from, Rank};
use crate::search_engines::breadth_first::breadth_first_from;
use crate::search_engines::depth_first::depth_first_from;
use crate::search_engines::rake::seed_frontier;
use crate::search_engines::{width_or_unlimited, ConfigError};
use crate::state::Branching;

impl<S> SearchControl<S>
where
    S: Branching + Send + Sync,
    S::Qual: Send + Sync,
{
    /// Parallel depth-first branch-and-bound across
    /// `max_degree_of_parallelism` workers.
    pub fn parallel_depth_first(
        self,
        filter_width: Option<usize>,
        max_degree_of_parallelism: usize,
    ) -> Result<Self, ConfigError> {
        let filter_width = width_or_unlimited(filter_width, ConfigError::FilterWidth)?;
        check_degree(max_degree_of_parallelism)?;
        run_on_workers(&self, max_degree_of_parallelism, |control, depth, seed| {
            depth_first_from(control, depth, seed, filter_width);
        });
        self.finish();
        Ok(self)
    }

    /// Parallel breadth-first search across
    /// `max_degree_of_parallelism` workers.
    pub fn parallel_breadth_first(
        self,
        filter_width: Option<usize>,
        depth_limit: Option<usize>,
        max_degree_of_parallelism: usize,
    ) -> Result<Self, ConfigError> {
        let filter_width = width_or_unlimited(filter_width, ConfigError::FilterWidth)?;
        let depth_limit = width_or_unlimited(depth_limit, ConfigError::DepthLimit)?;
        check_degree(max_degree_of_parallelism)?;
        run_on_workers(&self, max_degree_of_parallelism, |control, depth, seed| {
            breadth_first_from(control, depth, seed, filter_width, depth_limit);
        });
        self.finish();
        Ok(self)
    }

    /// Parallel beam search: an independent beam per sub-root.
    pub fn parallel_beam_search(
        self,
        beam_width: usize,
        rank: Option<Rank<S>>,
        max_degree_of_parallelism: usize,
    ) -> Result<Self, ConfigError> {
        if beam_width == 0 {
            return Err(ConfigError::BeamWidth);
        }
        check_degree(max_degree_of_parallelism)?;
        let rank = rank.as_ref();
        run_on_workers(&self, max_degree_of_parallelism, |control, _, seed| {
            beam_from(control, seed, beam_width, rank);
        });
        self.finish();
        Ok(self)
    }
}

fn check_degree(max_degree_of_parallelism: usize) -> Result<(), ConfigError> {
    if max_degree_of_parallelism == 0 {
        return Err(ConfigError::DegreeOfParallelism);
    }
    Ok(())
}

/// Seeds the frontier sequentially, deals the sub-roots round-robin
/// into one bucket per worker, and drives the buckets on a scoped pool
/// borrowing the shared control.
fn run_on_workers<S, F>(control: &SearchControl<S>, degree: usize, search: F)
where
    S: Branching + Send + Sync,
    S::Qual: Send + Sync,
    F: Fn(&SearchControl<S>, usize, S) + Send + Sync,
{
    let mut seeds = seed_frontier(control, degree);
    let mut buckets: Vec<Vec<(usize, S)>> = (0..degree).map(|_| Vec::new()).collect();
    let mut dealt = 0;
    while let Some(entry) = seeds.try_next() {
        buckets[dealt % degree].push(entry);
        dealt += 1;
    }
    let mut pool = Pool::new(u32::try_from(degree).unwrap_or(u32::MAX));
    let search = &search;
    pool.scoped(|scope| {
        for bucket in buckets {
            if bucket.is_empty() {
                continue;
            }
            scope.execute(move || {
                for (depth, seed) in bucket {
                    if control.should_stop() {
                        break;
                    }
                    search(control, depth, seed);
                }
            });
        }
    });
}
