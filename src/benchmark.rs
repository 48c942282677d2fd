//! Operator comparison for the genetic algorithm.
//!
//! Runs every crossover/mutation combination over a set of seeds on one city
//! set, collects per-run results and aggregates them per combination.

use crate::evolution::{CrossoverVariant, EvolutionSettings, EvolutionWorker, MutationVariant, StopPolicy};
use crate::instance::TspInstance;
use indicatif::{ProgressBar, ProgressStyle};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fs::File;
use std::path::Path;

/// Result of one seeded run of one operator combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub crossover: CrossoverVariant,
    pub mutation: MutationVariant,
    pub seed: u64,
    /// Best tour length found
    pub distance: f64,
    /// Generations executed
    pub generations: u32,
    /// Computation time in seconds
    pub time: f64,
}

/// Aggregated statistics for an operator combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboStatistics {
    pub crossover: CrossoverVariant,
    pub mutation: MutationVariant,
    pub runs: usize,
    pub best_distance: f64,
    pub worst_distance: f64,
    pub mean_distance: f64,
    /// Sample standard deviation, zero below two runs
    pub std_distance: f64,
    pub mean_generations: f64,
    pub mean_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Seeds per combination
    pub num_runs: usize,
    /// Seed of the first run; run `i` uses `base_seed + i`
    pub base_seed: u64,
    pub stop_policy: StopPolicy,
    pub population_count: usize,
    pub elite_ratio: f64,
    pub mutation_chance: f64,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            base_seed: 0,
            stop_policy: StopPolicy::GenerationLimit(500),
            population_count: 100,
            elite_ratio: 0.7,
            mutation_chance: 0.2,
            show_progress: true,
        }
    }
}

impl BenchmarkConfig {
    fn settings(&self, crossover: CrossoverVariant, mutation: MutationVariant, seed: u64) -> EvolutionSettings {
        EvolutionSettings {
            population_count: self.population_count,
            elite_ratio: self.elite_ratio,
            mutation_chance: self.mutation_chance,
            crossover,
            mutation,
            randomize_mutation: false,
            seed,
        }
    }
}

/// Every crossover paired with every mutation
pub fn operator_combinations() -> Vec<(CrossoverVariant, MutationVariant)> {
    CrossoverVariant::ALL
        .iter()
        .flat_map(|&c| MutationVariant::ALL.iter().map(move |&m| (c, m)))
        .collect()
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    instance: Option<String>,
    results: Vec<RunResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            instance: None,
            results: Vec::new(),
        }
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(total);
        match ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}") {
            Ok(style) => bar.set_style(style.progress_chars("=>-")),
            Err(e) => log::warn!("Invalid progress bar template: {}", e),
        }
        bar
    }

    /// Run all operator combinations on a city set
    pub fn run(&mut self, instance: &TspInstance) {
        log::info!(
            "Running benchmark on {} ({} cities), {} runs per combination",
            instance.name,
            instance.dimension(),
            self.config.num_runs
        );
        self.instance = Some(instance.name.clone());

        let combinations = operator_combinations();
        let bar = self.progress_bar((combinations.len() * self.config.num_runs) as u64);

        for (crossover, mutation) in combinations {
            bar.set_message(format!("{} + {}", crossover, mutation));
            for run in 0..self.config.num_runs {
                let seed = self.config.base_seed + run as u64;
                let settings = self.config.settings(crossover, mutation, seed);
                let mut worker = EvolutionWorker::new(instance.distance_matrix.clone(), settings);
                let outcome = worker.run_evolution(self.config.stop_policy);

                self.results.push(RunResult {
                    crossover,
                    mutation,
                    seed,
                    distance: outcome.best_distance,
                    generations: outcome.generations,
                    time: outcome.duration.as_secs_f64(),
                });
                bar.inc(1);
            }
        }

        bar.finish_with_message("done");
    }

    /// Compute statistics for each combination, best mean distance first
    pub fn compute_statistics(&self) -> Vec<ComboStatistics> {
        let mut statistics = Vec::new();

        for (crossover, mutation) in operator_combinations() {
            let runs: Vec<&RunResult> = self
                .results
                .iter()
                .filter(|r| r.crossover == crossover && r.mutation == mutation)
                .collect();
            if runs.is_empty() {
                continue;
            }

            let distances: Vec<f64> = runs.iter().map(|r| r.distance).collect();
            let generations: Vec<f64> = runs.iter().map(|r| r.generations as f64).collect();
            let times: Vec<f64> = runs.iter().map(|r| r.time).collect();

            let std_distance = if distances.len() < 2 {
                0.0
            } else {
                distances.iter().std_dev()
            };

            statistics.push(ComboStatistics {
                crossover,
                mutation,
                runs: runs.len(),
                best_distance: distances.iter().cloned().fold(f64::INFINITY, f64::min),
                worst_distance: distances.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                mean_distance: distances.iter().mean(),
                std_distance,
                mean_generations: generations.iter().mean(),
                mean_time: times.iter().mean(),
            });
        }

        statistics.sort_by_key(|s| OrderedFloat(s.mean_distance));
        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("      TSP Operator Benchmark Report\n");
        report.push_str("========================================\n\n");

        if let Some(name) = &self.instance {
            report.push_str(&format!("Instance: {}\n", name));
        }
        report.push_str(&format!(
            "Runs per combination: {}, stop policy: {}\n\n",
            self.config.num_runs, self.config.stop_policy
        ));

        let stats = self.compute_statistics();

        report.push_str("-".repeat(84).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<22} {:>6} {:>12} {:>12} {:>10} {:>10} {:>8}\n",
            "Operators", "Runs", "Best", "Mean", "Std Dev", "Gens", "Time"
        ));
        report.push_str("-".repeat(84).as_str());
        report.push('\n');

        for stat in &stats {
            report.push_str(&format!(
                "{:<22} {:>6} {:>12.2} {:>12.2} {:>10.2} {:>10.1} {:>8.4}\n",
                format!("{} + {}", stat.crossover, stat.mutation),
                stat.runs,
                stat.best_distance,
                stat.mean_distance,
                stat.std_distance,
                stat.mean_generations,
                stat.mean_time
            ));
        }

        report.push_str("-".repeat(84).as_str());
        report.push('\n');

        if let Some(best) = self
            .results
            .iter()
            .min_by_key(|r| OrderedFloat(r.distance))
        {
            report.push_str(&format!(
                "\nBest run: {:.2} ({} + {}, seed {})\n",
                best.distance, best.crossover, best.mutation, best.seed
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config(num_runs: usize) -> BenchmarkConfig {
        BenchmarkConfig {
            num_runs,
            stop_policy: StopPolicy::GenerationLimit(10),
            population_count: 12,
            show_progress: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 5);
        assert_eq!(config.stop_policy, StopPolicy::GenerationLimit(500));
    }

    #[test]
    fn test_six_combinations() {
        let combinations = operator_combinations();
        assert_eq!(combinations.len(), 6);
        assert!(combinations.contains(&(CrossoverVariant::OX, MutationVariant::Transposition)));
    }

    #[test]
    fn test_run_covers_every_combination() {
        let instance = TspInstance::random(12, 5).unwrap();
        let mut benchmark = Benchmark::new(quick_config(3));
        benchmark.run(&instance);

        assert_eq!(benchmark.results().len(), 18);
        assert!(benchmark.results().iter().all(|r| r.generations == 10));

        let stats = benchmark.compute_statistics();
        assert_eq!(stats.len(), 6);
        for stat in &stats {
            assert_eq!(stat.runs, 3);
            assert!(stat.best_distance <= stat.mean_distance + 1e-9);
            assert!(stat.mean_distance <= stat.worst_distance + 1e-9);
            assert!(stat.std_distance >= 0.0);
        }
        assert!(stats.windows(2).all(|w| w[0].mean_distance <= w[1].mean_distance));

        let report = benchmark.generate_report();
        assert!(report.contains(&instance.name));
        assert!(report.contains("Best run"));
    }

    #[test]
    fn test_single_run_has_zero_std_dev() {
        let instance = TspInstance::random(8, 6).unwrap();
        let mut benchmark = Benchmark::new(quick_config(1));
        benchmark.run(&instance);

        assert!(benchmark
            .compute_statistics()
            .iter()
            .all(|s| s.std_distance == 0.0 && s.best_distance == s.worst_distance));
    }

    #[test]
    fn test_csv_export() {
        let instance = TspInstance::random(8, 7).unwrap();
        let mut benchmark = Benchmark::new(quick_config(1));
        benchmark.run(&instance);

        let path = std::env::temp_dir().join(format!("tsp-benchmark-{}.csv", std::process::id()));
        benchmark.export_to_csv(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("crossover,mutation,seed,distance,generations,time"));
        assert_eq!(lines.count(), 6);
    }
}
