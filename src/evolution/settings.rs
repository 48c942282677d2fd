//! Run configuration for the evolutionary engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Smallest population the engine is designed for
pub const MIN_POPULATION: usize = 3;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("population count must be at least {min}, got {0}", min = MIN_POPULATION)]
    PopulationTooSmall(usize),
    #[error("{name} must lie in [0, 1], got {value}")]
    RatioOutOfRange { name: &'static str, value: f64 },
    #[error("cannot read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crossover operator types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossoverVariant {
    /// Partially Mapped Crossover
    PMX,
    /// Order Crossover
    OX,
    /// Cycle Crossover
    CX,
}

impl CrossoverVariant {
    pub const ALL: [CrossoverVariant; 3] =
        [CrossoverVariant::PMX, CrossoverVariant::OX, CrossoverVariant::CX];
}

impl fmt::Display for CrossoverVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrossoverVariant::PMX => "PMX",
            CrossoverVariant::OX => "OX",
            CrossoverVariant::CX => "CX",
        };
        f.write_str(name)
    }
}

/// Mutation operator types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationVariant {
    /// Reverse a random segment
    Inversion,
    /// Swap two random positions
    Transposition,
}

impl MutationVariant {
    pub const ALL: [MutationVariant; 2] =
        [MutationVariant::Inversion, MutationVariant::Transposition];
}

impl fmt::Display for MutationVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MutationVariant::Inversion => "Inversion",
            MutationVariant::Transposition => "Transposition",
        };
        f.write_str(name)
    }
}

/// When a call to `run_evolution` stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopPolicy {
    /// Run exactly this many generations
    GenerationLimit(u32),
    /// Stop once this many consecutive generations brought no new best.
    /// Every improvement resets the count.
    StallLimit(u32),
}

impl StopPolicy {
    /// Build the policy from a limit and the "reset when progress is made" switch
    pub fn from_limit(limit: u32, reset_on_progress: bool) -> Self {
        if reset_on_progress {
            StopPolicy::StallLimit(limit)
        } else {
            StopPolicy::GenerationLimit(limit)
        }
    }
}

impl fmt::Display for StopPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopPolicy::GenerationLimit(g) => write!(f, "{} generations", g),
            StopPolicy::StallLimit(s) => write!(f, "{} generations without improvement", s),
        }
    }
}

/// Genetic algorithm configuration, immutable for the lifetime of a worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionSettings {
    /// Number of individuals kept after each truncation
    pub population_count: usize,
    /// Fraction of the population used as breeding stock
    pub elite_ratio: f64,
    /// Probability that a child is mutated
    pub mutation_chance: f64,
    pub crossover: CrossoverVariant,
    pub mutation: MutationVariant,
    /// Draw the mutation operator at random at the start of each run
    pub randomize_mutation: bool,
    /// Random seed
    pub seed: u64,
}

impl Default for EvolutionSettings {
    fn default() -> Self {
        EvolutionSettings {
            population_count: 100,
            elite_ratio: 0.7,
            mutation_chance: 0.2,
            crossover: CrossoverVariant::CX,
            mutation: MutationVariant::Inversion,
            randomize_mutation: false,
            seed: 42,
        }
    }
}

impl EvolutionSettings {
    /// Load settings from a JSON file. Missing fields take their default value.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        let settings: EvolutionSettings = serde_json::from_str(&text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.population_count < MIN_POPULATION {
            return Err(SettingsError::PopulationTooSmall(self.population_count));
        }
        check_ratio("elite ratio", self.elite_ratio)?;
        check_ratio("mutation chance", self.mutation_chance)?;
        Ok(())
    }
}

fn check_ratio(name: &'static str, value: f64) -> Result<(), SettingsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::RatioOutOfRange { name, value })
    }
}
