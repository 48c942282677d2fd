//! Genetic algorithm engine for the TSP.
//!
//! This module exports the population model, the crossover and mutation
//! operators, the run configuration and the generation loop.

pub mod crossover;
pub mod individual;
pub mod mutation;
pub mod progress;
pub mod settings;
pub mod worker;

pub use crossover::{cycle_crossover, order_crossover, pmx_crossover, CutPoints};
pub use individual::{Individual, Population, Tour};
pub use mutation::{mutate_inversion, mutate_transposition};
pub use progress::{ProgressBucket, ProgressLog, ProgressRecord};
pub use settings::{
    CrossoverVariant, EvolutionSettings, MutationVariant, SettingsError, StopPolicy,
};
pub use worker::{EvolutionWorker, RunOutcome, StopReason};
