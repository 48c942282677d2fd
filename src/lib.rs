//! TSP Evolution Library
//!
//! A genetic algorithm solver for the symmetric Euclidean Travelling Salesman
//! Problem, using the path representation.
//!
//! # Features
//!
//! - Three order-preserving crossovers (PMX, OX, CX)
//! - Inversion and transposition mutations
//! - Elitist truncation selection with a generation or stall limit
//! - Progress tracking with a per-decile improvement distribution
//! - Operator benchmarking and SVG visualization
//!
//! # Example
//!
//! ```no_run
//! use tsp_evolution::evolution::{EvolutionSettings, EvolutionWorker, StopPolicy};
//! use tsp_evolution::instance::TspInstance;
//!
//! // Load the city list
//! let instance = TspInstance::from_file("cities.txt").unwrap();
//!
//! // Evolve for 1000 generations
//! let mut worker = EvolutionWorker::new(instance.distance_matrix.clone(), EvolutionSettings::default());
//! worker.run_evolution(StopPolicy::GenerationLimit(1000));
//!
//! println!("Best distance: {:.2}", worker.best_distance());
//! ```

pub mod instance;
pub mod solution;
pub mod evolution;
pub mod benchmark;
pub mod visualization;

pub use instance::TspInstance;
pub use solution::Solution;
