//! Tours, individuals and the ranked population.

use crate::instance::DistanceMatrix;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use std::collections::HashSet;

/// A visiting order: a permutation of the city indices `0..n`
pub type Tour = Vec<usize>;

/// Individual in the genetic algorithm population
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    tour: Tour,
    distance: f64,
}

impl Individual {
    /// Evaluate a tour. The distance is always computed from the tour it is stored with.
    pub fn new(tour: Tour, matrix: &DistanceMatrix) -> Self {
        let distance = matrix.tour_length(&tour);
        Individual { tour, distance }
    }

    pub fn tour(&self) -> &[usize] {
        &self.tour
    }

    /// Cached closed-tour length
    pub fn distance(&self) -> f64 {
        self.distance
    }
}

/// Draw a uniformly random permutation of `0..n`
pub fn random_tour<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Tour {
    let mut tour: Tour = (0..n).collect();
    tour.shuffle(rng);
    tour
}

/// Check that `tour` holds every index of `0..n` exactly once
pub fn is_permutation(tour: &[usize], n: usize) -> bool {
    if tour.len() != n {
        return false;
    }
    let unique: HashSet<usize> = tour.iter().copied().collect();
    unique.len() == n && tour.iter().all(|&city| city < n)
}

/// Individuals ranked by ascending distance (best first)
#[derive(Debug, Clone, Default)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    /// Create `count` random, evaluated individuals ranked best first
    pub fn random<R: Rng + ?Sized>(count: usize, matrix: &DistanceMatrix, rng: &mut R) -> Self {
        let individuals = (0..count)
            .map(|_| Individual::new(random_tour(matrix.len(), rng), matrix))
            .collect();
        let mut population = Population { individuals };
        population.sort();
        population
    }

    /// Stable sort by ascending distance
    pub fn sort(&mut self) {
        self.individuals
            .sort_by_key(|individual| OrderedFloat(individual.distance));
    }

    /// Keep only the `count` best-ranked individuals
    pub fn truncate(&mut self, count: usize) {
        self.individuals.truncate(count);
    }

    /// Number of top-ranked individuals used as breeding stock
    pub fn elite_count(&self, elite_ratio: f64) -> usize {
        ((self.individuals.len() as f64 * elite_ratio).floor() as usize).min(self.individuals.len())
    }

    pub fn elite(&self, elite_ratio: f64) -> &[Individual] {
        &self.individuals[..self.elite_count(elite_ratio)]
    }

    /// Merge children and re-rank
    pub fn merge(&mut self, children: Vec<Individual>) {
        self.individuals.extend(children);
        self.sort();
    }

    pub fn best(&self) -> Option<&Individual> {
        self.individuals.first()
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::City;
    use rand_chacha::ChaCha8Rng;

    fn square_matrix() -> DistanceMatrix {
        DistanceMatrix::from_cities(&[
            City::new(0, 0),
            City::new(1, 0),
            City::new(1, 1),
            City::new(0, 1),
        ])
    }

    #[test]
    fn test_individual_caches_distance() {
        let individual = Individual::new(vec![0, 1, 2, 3], &square_matrix());
        assert!((individual.distance() - 4.0).abs() < 1e-10);
        assert_eq!(individual.tour(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_random_tour_is_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for n in 1..30 {
            assert!(is_permutation(&random_tour(n, &mut rng), n));
        }
    }

    #[test]
    fn test_is_permutation_rejects_duplicates_and_gaps() {
        assert!(is_permutation(&[2, 0, 1], 3));
        assert!(!is_permutation(&[0, 0, 1], 3));
        assert!(!is_permutation(&[0, 1, 3], 3));
        assert!(!is_permutation(&[0, 1], 3));
    }

    #[test]
    fn test_population_is_ranked() {
        let matrix = square_matrix();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let population = Population::random(25, &matrix, &mut rng);

        assert_eq!(population.len(), 25);
        let distances: Vec<f64> = population.individuals().iter().map(|i| i.distance()).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(population.best().map(|b| b.distance()), Some(distances[0]));
    }

    #[test]
    fn test_elite_count_floors() {
        let matrix = square_matrix();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let population = Population::random(7, &matrix, &mut rng);

        assert_eq!(population.elite_count(0.5), 3);
        assert_eq!(population.elite_count(0.0), 0);
        assert_eq!(population.elite_count(1.0), 7);
        assert_eq!(population.elite(0.3).len(), 2);
    }

    #[test]
    fn test_merge_then_truncate_keeps_best() {
        let matrix = square_matrix();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut population = Population::random(3, &matrix, &mut rng);

        let optimal = Individual::new(vec![3, 2, 1, 0], &matrix);
        population.merge(vec![optimal]);
        assert_eq!(population.len(), 4);
        population.truncate(3);

        assert_eq!(population.len(), 3);
        assert!((population.best().unwrap().distance() - 4.0).abs() < 1e-10);
    }
}
