//! Result summary of an evolution session.
//!
//! A [`Solution`] snapshots the best tour of a worker together with the
//! settings and history that produced it, ready for display or JSON export.

use crate::evolution::{EvolutionSettings, EvolutionWorker, ProgressRecord, RunOutcome, StopPolicy};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Best tour found by a worker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Name of the city set
    pub instance: String,
    /// The tour as a sequence of city indices
    pub tour: Vec<usize>,
    /// Closed tour length
    pub distance: f64,
    /// Generations executed over all runs
    pub generations: u32,
    /// Number of `run_evolution` calls
    pub runs: usize,
    pub stop_policy: StopPolicy,
    pub settings: EvolutionSettings,
    /// Mutation operator of the last run (differs from the settings when randomized)
    pub last_mutation: String,
    pub progress: Vec<ProgressRecord>,
    /// Wall-clock time over all runs in seconds
    pub computation_time: f64,
    /// RFC 3339 timestamp of the first run start
    pub started_at: String,
    /// RFC 3339 timestamp of the last run end
    pub finished_at: String,
}

impl Solution {
    /// Summarize a worker after one or more runs
    pub fn from_worker<R: Rng>(
        instance: &str,
        worker: &EvolutionWorker<R>,
        policy: StopPolicy,
        outcomes: &[RunOutcome],
    ) -> Self {
        let computation_time = outcomes.iter().map(|o| o.duration.as_secs_f64()).sum();
        let started_at = outcomes
            .first()
            .map(|o| o.started_at.to_rfc3339())
            .unwrap_or_default();
        let finished_at = outcomes
            .last()
            .map(|o| o.finished_at.to_rfc3339())
            .unwrap_or_default();
        let last_mutation = outcomes
            .last()
            .map(|o| o.mutation)
            .unwrap_or(worker.settings().mutation)
            .to_string();

        Solution {
            instance: instance.to_string(),
            tour: worker.best_solution().to_vec(),
            distance: worker.best_distance(),
            generations: worker.last_generation(),
            runs: outcomes.len(),
            stop_policy: policy,
            settings: worker.settings().clone(),
            last_mutation,
            progress: worker.progress().records().to_vec(),
            computation_time,
            started_at,
            finished_at,
        }
    }

    /// Mean time per generation in milliseconds
    pub fn millis_per_generation(&self) -> f64 {
        if self.generations == 0 {
            return 0.0;
        }
        self.computation_time * 1000.0 / self.generations as f64
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.instance)?;
        writeln!(
            f,
            "  Operators: path representation, {}, {}",
            self.settings.crossover, self.last_mutation
        )?;
        writeln!(
            f,
            "  Population {}, elite ratio {}, mutation chance {}",
            self.settings.population_count, self.settings.elite_ratio, self.settings.mutation_chance
        )?;
        writeln!(f, "  Stop policy: {}", self.stop_policy)?;
        writeln!(
            f,
            "  Best distance: {:.3} achieved after {} generations",
            self.distance, self.generations
        )?;
        writeln!(
            f,
            "  Time: {:.3}s ({:.5} ms/generation)",
            self.computation_time,
            self.millis_per_generation()
        )?;
        let tour: Vec<String> = self.tour.iter().map(|c| c.to_string()).collect();
        writeln!(f, "  Tour: {}", tour.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::TspInstance;

    #[test]
    fn test_solution_from_worker() {
        let instance = TspInstance::random(10, 1).unwrap();
        let settings = EvolutionSettings {
            population_count: 12,
            ..Default::default()
        };
        let mut worker = EvolutionWorker::new(instance.distance_matrix.clone(), settings);
        let policy = StopPolicy::GenerationLimit(8);
        let outcomes = vec![worker.run_evolution(policy), worker.run_evolution(policy)];

        let solution = Solution::from_worker(&instance.name, &worker, policy, &outcomes);
        assert_eq!(solution.generations, 16);
        assert_eq!(solution.runs, 2);
        assert_eq!(solution.tour, worker.best_solution());
        assert_eq!(solution.last_mutation, "Inversion");
        assert!(!solution.started_at.is_empty());

        let text = solution.to_string();
        assert!(text.contains("CX"));
        assert!(text.contains("after 16 generations"));
    }

    #[test]
    fn test_solution_serializes() {
        let instance = TspInstance::random(6, 2).unwrap();
        let mut worker = EvolutionWorker::new(
            instance.distance_matrix.clone(),
            EvolutionSettings::default(),
        );
        let policy = StopPolicy::StallLimit(3);
        let outcomes = vec![worker.run_evolution(policy)];
        let solution = Solution::from_worker(&instance.name, &worker, policy, &outcomes);

        let json = serde_json::to_string(&solution).unwrap();
        let back: Solution = serde_json::from_str(&json).unwrap();
        assert_eq!(back.tour, solution.tour);
        assert_eq!(back.stop_policy, StopPolicy::StallLimit(3));
    }
}
