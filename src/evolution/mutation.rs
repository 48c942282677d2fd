//! Permutation mutation operators.

use super::crossover::CutPoints;
use super::individual::Tour;
use super::settings::MutationVariant;
use rand::prelude::*;

/// Attempts at drawing two distinct positions before giving up on a transposition
const TRANSPOSITION_ATTEMPTS: usize = 100;

pub type MutationFn<R> = fn(Tour, &mut R) -> Tour;

/// Resolve the operator for a variant
pub fn mutation_fn<R: Rng>(variant: MutationVariant) -> MutationFn<R> {
    match variant {
        MutationVariant::Inversion => mutate_inversion,
        MutationVariant::Transposition => mutate_transposition,
    }
}

/// Reverse the `[cut1, cut2)` segment, with cut points drawn like crossover's
pub fn mutate_inversion<R: Rng + ?Sized>(mut tour: Tour, rng: &mut R) -> Tour {
    if tour.len() < 3 {
        return tour;
    }
    let cuts = CutPoints::sample(tour.len(), rng);
    tour[cuts.cut1..cuts.cut2].reverse();
    tour
}

/// Swap the values at two distinct random positions
pub fn mutate_transposition<R: Rng + ?Sized>(mut tour: Tour, rng: &mut R) -> Tour {
    let n = tour.len();
    if n == 0 {
        return tour;
    }

    let first = rng.gen_range(0..n);
    let mut second = rng.gen_range(0..n);
    let mut attempts = 0;
    while second == first {
        attempts += 1;
        if attempts >= TRANSPOSITION_ATTEMPTS {
            return tour;
        }
        second = rng.gen_range(0..n);
    }

    tour.swap(first, second);
    tour
}
