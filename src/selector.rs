//! Random reviewer selection.
//!
//! The selector knows nothing about persistence or pull request state: it
//! picks identifiers out of a candidate pool. Selection is intentionally
//! unweighted (no round-robin, no load ranking) so review load spreads
//! without any coordination between requests.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::ReviewError;
use crate::types::UserId;

/// Picks reviewers uniformly at random from a candidate pool.
///
/// The generator is owned by the selector, so tests can pin the seed with
/// [`ReviewerSelector::with_seed`]. It sits behind a mutex because one
/// selector is shared by every in-flight request.
#[derive(Debug)]
pub struct ReviewerSelector {
    rng: Mutex<StdRng>,
}

impl ReviewerSelector {
    /// Create a selector seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a selector with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Select up to `limit` distinct reviewers from `candidates`.
    ///
    /// Returns every candidate, in random order, when the pool is no larger
    /// than `limit`; otherwise a uniform sample of size `limit` without
    /// replacement. An empty pool yields an empty vector.
    pub fn select_reviewers(&self, candidates: &[UserId], limit: usize) -> Vec<UserId> {
        let mut pool = distinct(candidates);
        if pool.is_empty() || limit == 0 {
            return Vec::new();
        }

        let amount = limit.min(pool.len());
        let mut rng = self.rng.lock();
        let (chosen, _) = pool.partial_shuffle(&mut *rng, amount);
        chosen.to_vec()
    }

    /// Select one replacement reviewer not present in `excluded`.
    ///
    /// Fails with [`ReviewError::NoCandidate`] when every candidate is
    /// excluded.
    pub fn select_replacement(
        &self,
        candidates: &[UserId],
        excluded: &[UserId],
    ) -> Result<UserId, ReviewError> {
        let available: Vec<UserId> = distinct(candidates)
            .into_iter()
            .filter(|c| !excluded.contains(c))
            .collect();

        let mut rng = self.rng.lock();
        available
            .choose(&mut *rng)
            .cloned()
            .ok_or(ReviewError::NoCandidate)
    }
}

impl Default for ReviewerSelector {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Sorted, de-duplicated copy of the pool.
///
/// Sorting first makes seeded selections independent of the order the
/// store returned the candidates in.
fn distinct(candidates: &[UserId]) -> Vec<UserId> {
    let mut pool = candidates.to_vec();
    pool.sort();
    pool.dedup();
    pool
}
