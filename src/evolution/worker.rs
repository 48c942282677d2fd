//! The generation loop.
//!
//! An [`EvolutionWorker`] owns the population, the random source and the run
//! history. Each call to [`EvolutionWorker::run_evolution`] continues from the
//! state the previous call left behind: generation numbering, best tour and
//! progress log all carry over.

use super::crossover::{crossover_fn, CrossoverFn};
use super::individual::{Individual, Population, Tour};
use super::mutation::{mutation_fn, MutationFn};
use super::progress::ProgressLog;
use super::settings::{EvolutionSettings, MutationVariant, StopPolicy};
use crate::instance::DistanceMatrix;
use chrono::{DateTime, Local};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    GenerationLimit,
    Stall,
}

/// Summary of one `run_evolution` call
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Generations executed by this call
    pub generations: u32,
    pub stop_reason: StopReason,
    pub best_distance: f64,
    /// Mutation operator used by this call
    pub mutation: MutationVariant,
    pub duration: Duration,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl RunOutcome {
    /// Mean wall-clock time per generation in milliseconds
    pub fn millis_per_generation(&self) -> f64 {
        if self.generations == 0 {
            return 0.0;
        }
        self.duration.as_secs_f64() * 1000.0 / self.generations as f64
    }
}

/// Genetic algorithm worker for one city set
pub struct EvolutionWorker<R: Rng = ChaCha8Rng> {
    settings: EvolutionSettings,
    matrix: DistanceMatrix,
    population: Population,
    rng: R,
    best_solution: Tour,
    best_distance: f64,
    last_generation: u32,
    progress: ProgressLog,
}

impl EvolutionWorker<ChaCha8Rng> {
    /// Create a worker seeded from `settings.seed`
    pub fn new(matrix: DistanceMatrix, settings: EvolutionSettings) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(settings.seed);
        Self::with_rng(matrix, settings, rng)
    }
}

impl<R: Rng> EvolutionWorker<R> {
    /// Create a worker drawing from the given random source.
    ///
    /// The initial population is generated, evaluated and ranked here; its
    /// best individual becomes the starting best solution.
    pub fn with_rng(matrix: DistanceMatrix, settings: EvolutionSettings, mut rng: R) -> Self {
        let population = Population::random(settings.population_count, &matrix, &mut rng);

        let (best_solution, best_distance) = match population.best() {
            Some(best) => (best.tour().to_vec(), best.distance()),
            None => (Vec::new(), f64::INFINITY),
        };
        log::info!(
            "Initialized population of {} tours over {} cities, best initial distance {:.3}",
            population.len(),
            matrix.len(),
            best_distance
        );

        EvolutionWorker {
            settings,
            matrix,
            population,
            rng,
            best_solution,
            best_distance,
            last_generation: 0,
            progress: ProgressLog::new(),
        }
    }

    /// Evolve until the stop policy fires
    pub fn run_evolution(&mut self, policy: StopPolicy) -> RunOutcome {
        let started_at = Local::now();
        let start = Instant::now();

        let crossover = crossover_fn::<R>(self.settings.crossover);
        let mutation_variant = if self.settings.randomize_mutation {
            MutationVariant::ALL[self.rng.gen_range(0..MutationVariant::ALL.len())]
        } else {
            self.settings.mutation
        };
        let mutate = mutation_fn::<R>(mutation_variant);

        log::info!(
            "Starting evolution at generation {}: {} crossover, {} mutation, stop after {}",
            self.last_generation,
            self.settings.crossover,
            mutation_variant,
            policy
        );

        let mut generations: u32 = 0;
        let mut stalled: u32 = 0;

        let stop_reason = loop {
            match policy {
                StopPolicy::GenerationLimit(limit) if generations >= limit => {
                    log::info!("Stopping evolution after {} generations", limit);
                    break StopReason::GenerationLimit;
                }
                StopPolicy::StallLimit(limit) if stalled >= limit => {
                    log::info!("No improvement for {} generations, stopping evolution", limit);
                    break StopReason::Stall;
                }
                _ => {}
            }

            generations += 1;
            let generation = self.last_generation + generations;

            if self.evolve_generation(generation, crossover, mutate) {
                stalled = 0;
            } else {
                stalled += 1;
            }
        };

        self.last_generation += generations;
        let duration = start.elapsed();
        let outcome = RunOutcome {
            generations,
            stop_reason,
            best_distance: self.best_distance,
            mutation: mutation_variant,
            duration,
            started_at,
            finished_at: Local::now(),
        };

        log::info!(
            "Evolution has stopped. Generations: {}, best distance: {:.3}, time: {:.3}s ({:.5} ms/generation)",
            self.last_generation,
            self.best_distance,
            duration.as_secs_f64(),
            outcome.millis_per_generation()
        );

        outcome
    }

    /// Run one generation. Returns whether a new best solution was found.
    fn evolve_generation(
        &mut self,
        generation: u32,
        crossover: CrossoverFn<R>,
        mutate: MutationFn<R>,
    ) -> bool {
        self.population.truncate(self.settings.population_count);

        let mut pool: Vec<&Individual> = self
            .population
            .elite(self.settings.elite_ratio)
            .iter()
            .collect();
        let mut children: Vec<Tour> = Vec::with_capacity(pool.len());

        // Pair elites without replacement; an odd one out stays unbred
        while pool.len() > 1 {
            let first = pool.remove(self.rng.gen_range(0..pool.len()));
            let second = pool.remove(self.rng.gen_range(0..pool.len()));
            let (child1, child2) = crossover(first.tour(), second.tour(), &mut self.rng);
            children.push(child1);
            children.push(child2);
        }

        let mut offspring = Vec::with_capacity(children.len());
        let mut mutations = 0;
        for mut child in children {
            if self.rng.gen::<f64>() < self.settings.mutation_chance {
                child = mutate(child, &mut self.rng);
                mutations += 1;
            }
            offspring.push(Individual::new(child, &self.matrix));
        }
        log::trace!(
            "Generation {}: {} children, {} mutated",
            generation,
            offspring.len(),
            mutations
        );

        self.population.merge(offspring);

        let Some(best) = self.population.best() else {
            return false;
        };
        if best.distance() < self.best_distance {
            let improvement = self.best_distance - best.distance();
            self.best_distance = best.distance();
            self.best_solution = best.tour().to_vec();
            self.progress.record(generation, improvement);
            log::debug!(
                "Found new best solution of distance {:.3} at generation {}",
                self.best_distance,
                generation
            );
            true
        } else {
            false
        }
    }

    pub fn best_solution(&self) -> &[usize] {
        &self.best_solution
    }

    pub fn best_distance(&self) -> f64 {
        self.best_distance
    }

    /// Generations executed over all runs of this worker
    pub fn last_generation(&self) -> u32 {
        self.last_generation
    }

    pub fn progress(&self) -> &ProgressLog {
        &self.progress
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn settings(&self) -> &EvolutionSettings {
        &self.settings
    }

    pub fn distance_matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }
}
