//! Permutation crossover operators.
//!
//! Every operator takes two parent tours of equal length and returns two
//! children, both permutations of the same city set. Parents are never
//! modified; the only other input is the random source used to draw the cut
//! points (PMX, OX) or the cycle start (CX).

use super::individual::Tour;
use super::settings::CrossoverVariant;
use rand::prelude::*;
use std::collections::HashMap;

/// Signature shared by all crossover operators
pub type CrossoverFn<R> = fn(&[usize], &[usize], &mut R) -> (Tour, Tour);

/// Resolve the operator for a variant
pub fn crossover_fn<R: Rng>(variant: CrossoverVariant) -> CrossoverFn<R> {
    match variant {
        CrossoverVariant::PMX => pmx_crossover,
        CrossoverVariant::OX => order_crossover,
        CrossoverVariant::CX => cycle_crossover,
    }
}

/// Segment boundaries `[cut1, cut2)` shared by both children of one crossover.
///
/// `cut1` is uniform in `[1, floor(2n/3))` and `cut2` uniform in `(cut1, n)`,
/// which keeps the segment away from the very start of the tour and biases
/// it towards its first two thirds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutPoints {
    pub cut1: usize,
    pub cut2: usize,
}

impl CutPoints {
    /// Draw cut points for a tour of length `n`. Requires `n >= 3`.
    pub fn sample<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Self {
        debug_assert!(n >= 3, "cut points need at least three cities");
        let upper = (2 * n / 3).max(2);
        let cut1 = rng.gen_range(1..upper);
        let cut2 = rng.gen_range(cut1 + 1..n);
        CutPoints { cut1, cut2 }
    }
}

/// Partially Mapped Crossover (PMX)
pub fn pmx_crossover<R: Rng + ?Sized>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Tour, Tour) {
    let n = parent1.len();
    if n < 3 {
        return (parent1.to_vec(), parent2.to_vec());
    }
    let cuts = CutPoints::sample(n, rng);
    pmx_with_cuts(parent1, parent2, cuts)
}

pub(crate) fn pmx_with_cuts(parent1: &[usize], parent2: &[usize], cuts: CutPoints) -> (Tour, Tour) {
    let n = parent1.len();
    let mut child1 = vec![0; n];
    let mut child2 = vec![0; n];

    // parent2 value -> parent1 value, and the reverse, for the swapped segment
    let mut forward: HashMap<usize, usize> = HashMap::with_capacity(cuts.cut2 - cuts.cut1);
    let mut backward: HashMap<usize, usize> = HashMap::with_capacity(cuts.cut2 - cuts.cut1);

    for i in cuts.cut1..cuts.cut2 {
        child1[i] = parent2[i];
        child2[i] = parent1[i];
        forward.insert(parent2[i], parent1[i]);
        backward.insert(parent1[i], parent2[i]);
    }

    for i in (0..cuts.cut1).chain(cuts.cut2..n) {
        child1[i] = resolve_mapping(parent1[i], &forward);
        child2[i] = resolve_mapping(parent2[i], &backward);
    }

    (child1, child2)
}

/// Follow the mapping chain until reaching a value that is not a key.
/// The chain length is bounded by the mapping size.
fn resolve_mapping(mut value: usize, mapping: &HashMap<usize, usize>) -> usize {
    for _ in 0..=mapping.len() {
        match mapping.get(&value) {
            Some(&next) => value = next,
            None => break,
        }
    }
    value
}

/// Order Crossover (OX)
pub fn order_crossover<R: Rng + ?Sized>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Tour, Tour) {
    let n = parent1.len();
    if n < 3 {
        return (parent1.to_vec(), parent2.to_vec());
    }
    let cuts = CutPoints::sample(n, rng);
    (
        ox_build_child(parent1, parent2, cuts),
        ox_build_child(parent2, parent1, cuts),
    )
}

/// Copy the segment from `template`, then fill the remaining positions from
/// `donor`. Both the fill position and the donor walk start at `cut2` and wrap.
fn ox_build_child(template: &[usize], donor: &[usize], cuts: CutPoints) -> Tour {
    let n = template.len();
    let mut child = vec![0; n];
    let mut used = vec![false; n];

    for i in cuts.cut1..cuts.cut2 {
        child[i] = template[i];
        used[template[i]] = true;
    }

    let free = n - (cuts.cut2 - cuts.cut1);
    let mut filled = 0;
    for offset in 0..n {
        if filled == free {
            break;
        }
        let value = donor[(cuts.cut2 + offset) % n];
        if used[value] {
            continue;
        }
        child[(cuts.cut2 + filled) % n] = value;
        used[value] = true;
        filled += 1;
    }

    child
}

/// Cycle Crossover (CX)
pub fn cycle_crossover<R: Rng + ?Sized>(
    parent1: &[usize],
    parent2: &[usize],
    rng: &mut R,
) -> (Tour, Tour) {
    let n = parent1.len();
    if n < 3 {
        return (parent1.to_vec(), parent2.to_vec());
    }
    let start = rng.gen_range(0..n);
    cx_from_start(parent1, parent2, start)
}

pub(crate) fn cx_from_start(parent1: &[usize], parent2: &[usize], start: usize) -> (Tour, Tour) {
    let cycle1 = cycle_positions(parent1, parent2, start);
    let cycle2 = cycle_positions(parent2, parent1, start);

    (
        cx_build_child(parent1, parent2, &cycle1),
        cx_build_child(parent2, parent1, &cycle2),
    )
}

/// Positions of the cycle through `start`: `i -> position in home of other[i]`.
///
/// The walk is capped at `n` steps and stops early on a value that `home`
/// does not contain, so malformed parents cannot loop forever.
fn cycle_positions(home: &[usize], other: &[usize], start: usize) -> Vec<bool> {
    let n = home.len();
    let mut position_in_home = vec![usize::MAX; n];
    for (i, &value) in home.iter().enumerate() {
        if let Some(slot) = position_in_home.get_mut(value) {
            *slot = i;
        }
    }

    let mut in_cycle = vec![false; n];
    let mut position = start;
    for _ in 0..n {
        let next = match position_in_home.get(other[position]) {
            Some(&p) if p != usize::MAX => p,
            _ => break,
        };
        in_cycle[next] = true;
        if next == start {
            break;
        }
        position = next;
    }
    in_cycle
}

/// Cycle positions keep `home`'s value, every other position takes `other`'s
fn cx_build_child(home: &[usize], other: &[usize], in_cycle: &[bool]) -> Tour {
    in_cycle
        .iter()
        .enumerate()
        .map(|(i, &keep)| if keep { home[i] } else { other[i] })
        .collect()
}
