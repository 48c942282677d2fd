//! TSP Evolution - Command Line Interface
//!
//! Solves TSP instances with a genetic algorithm, generates random city sets
//! and compares the operators.

use clap::{Args, Parser, Subcommand, ValueEnum};
use tsp_evolution::benchmark::{Benchmark, BenchmarkConfig};
use tsp_evolution::evolution::{
    CrossoverVariant, EvolutionSettings, EvolutionWorker, MutationVariant, StopPolicy,
};
use tsp_evolution::instance::TspInstance;
use tsp_evolution::solution::Solution;
use tsp_evolution::visualization::{render_progress_histogram, Visualizer};

use std::error::Error;
use std::path::PathBuf;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "tsp-evolution")]
#[command(version = "1.0")]
#[command(about = "A genetic algorithm solver for the Travelling Salesman Problem")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve a tour for a city set
    Solve {
        #[command(flatten)]
        source: CitySource,

        /// Crossover operator
        #[arg(long, value_enum)]
        crossover: Option<CrossoverArg>,

        /// Mutation operator
        #[arg(long, value_enum)]
        mutation: Option<MutationArg>,

        /// Pick the mutation operator at random for every run
        #[arg(long)]
        randomize_mutation: bool,

        /// Population size kept after each generation
        #[arg(short, long)]
        population: Option<usize>,

        /// Fraction of the population that breeds
        #[arg(long)]
        elite_ratio: Option<f64>,

        /// Probability that a child is mutated
        #[arg(long)]
        mutation_chance: Option<f64>,

        /// Generation limit
        #[arg(short, long, default_value = "1000")]
        generations: u32,

        /// Count the limit in generations without improvement
        #[arg(long)]
        stall: bool,

        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Additional runs continuing from the evolved population
        #[arg(long, default_value = "0")]
        reruns: usize,

        /// JSON settings file; command line flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the run summary as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write an SVG drawing of the best tour
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Save the city list in the text format
        #[arg(long)]
        save_cities: Option<PathBuf>,

        /// Print instance statistics and the tour
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write a random city file
    Generate {
        /// Number of cities
        #[arg(short, long)]
        count: usize,

        /// Random seed
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Compare all operator combinations on a city set
    Benchmark {
        #[command(flatten)]
        source: CitySource,

        /// Runs per combination
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Generation limit per run
        #[arg(short, long, default_value = "500")]
        generations: u32,

        /// Count the limit in generations without improvement
        #[arg(long)]
        stall: bool,

        /// Population size
        #[arg(short, long, default_value = "100")]
        population: usize,

        /// Seed of the first run
        #[arg(short, long, default_value = "0")]
        seed: u64,

        /// Output directory for CSV results and the report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct CitySource {
    /// City file with one "x  y" pair per line
    #[arg(short, long, conflicts_with = "random")]
    instance: Option<PathBuf>,

    /// Generate this many random cities instead of reading a file
    #[arg(long)]
    random: Option<usize>,

    /// Seed for the random cities
    #[arg(long, default_value = "0")]
    city_seed: u64,
}

impl CitySource {
    fn load(&self) -> Result<TspInstance, Box<dyn Error>> {
        match (&self.instance, self.random) {
            (Some(path), _) => {
                println!("Loading cities from {:?}...", path);
                Ok(TspInstance::from_file(path)?)
            }
            (None, Some(count)) => Ok(TspInstance::random(count, self.city_seed)?),
            (None, None) => Err("either --instance or --random is required".into()),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum CrossoverArg {
    /// Partially mapped crossover
    Pmx,
    /// Order crossover
    Ox,
    /// Cycle crossover
    Cx,
}

impl From<CrossoverArg> for CrossoverVariant {
    fn from(arg: CrossoverArg) -> Self {
        match arg {
            CrossoverArg::Pmx => CrossoverVariant::PMX,
            CrossoverArg::Ox => CrossoverVariant::OX,
            CrossoverArg::Cx => CrossoverVariant::CX,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum MutationArg {
    /// Reverse a random segment
    Inversion,
    /// Swap two random cities
    Transposition,
}

impl From<MutationArg> for MutationVariant {
    fn from(arg: MutationArg) -> Self {
        match arg {
            MutationArg::Inversion => MutationVariant::Inversion,
            MutationArg::Transposition => MutationVariant::Transposition,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Solve {
            source,
            crossover,
            mutation,
            randomize_mutation,
            population,
            elite_ratio,
            mutation_chance,
            generations,
            stall,
            seed,
            reruns,
            config,
            output,
            svg,
            save_cities,
            verbose,
        } => {
            let overrides = SettingsOverrides {
                crossover,
                mutation,
                randomize_mutation,
                population,
                elite_ratio,
                mutation_chance,
                seed,
            };
            let outputs = SolveOutputs {
                json: output,
                svg,
                cities: save_cities,
            };
            solve(&source, config, overrides, StopPolicy::from_limit(generations, stall), reruns, outputs, verbose)
        }

        Commands::Generate {
            count,
            seed,
            output,
        } => generate(count, seed, &output),

        Commands::Benchmark {
            source,
            runs,
            generations,
            stall,
            population,
            seed,
            output,
        } => {
            let config = BenchmarkConfig {
                num_runs: runs,
                base_seed: seed,
                stop_policy: StopPolicy::from_limit(generations, stall),
                population_count: population,
                ..Default::default()
            };
            run_benchmark(&source, config, output)
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Settings given on the command line
struct SettingsOverrides {
    crossover: Option<CrossoverArg>,
    mutation: Option<MutationArg>,
    randomize_mutation: bool,
    population: Option<usize>,
    elite_ratio: Option<f64>,
    mutation_chance: Option<f64>,
    seed: Option<u64>,
}

impl SettingsOverrides {
    fn apply(self, settings: &mut EvolutionSettings) {
        if let Some(crossover) = self.crossover {
            settings.crossover = crossover.into();
        }
        if let Some(mutation) = self.mutation {
            settings.mutation = mutation.into();
        }
        if self.randomize_mutation {
            settings.randomize_mutation = true;
        }
        if let Some(population) = self.population {
            settings.population_count = population;
        }
        if let Some(ratio) = self.elite_ratio {
            settings.elite_ratio = ratio;
        }
        if let Some(chance) = self.mutation_chance {
            settings.mutation_chance = chance;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
    }
}

struct SolveOutputs {
    json: Option<PathBuf>,
    svg: Option<PathBuf>,
    cities: Option<PathBuf>,
}

fn solve(
    source: &CitySource,
    config: Option<PathBuf>,
    overrides: SettingsOverrides,
    policy: StopPolicy,
    reruns: usize,
    outputs: SolveOutputs,
    verbose: bool,
) -> CliResult {
    let instance = source.load()?;

    let mut settings = match config {
        Some(path) => EvolutionSettings::from_json_file(path)?,
        None => EvolutionSettings::default(),
    };
    overrides.apply(&mut settings);
    settings.validate()?;

    if verbose {
        println!("{}", instance.statistics());
    }

    let mut worker = EvolutionWorker::new(instance.distance_matrix.clone(), settings);
    let mut outcomes = Vec::with_capacity(reruns + 1);
    for run in 0..=reruns {
        let outcome = worker.run_evolution(policy);
        println!(
            "Run {}: {} generations, best distance {:.3}, {:.3}s",
            run + 1,
            outcome.generations,
            outcome.best_distance,
            outcome.duration.as_secs_f64()
        );
        outcomes.push(outcome);
    }

    let solution = Solution::from_worker(&instance.name, &worker, policy, &outcomes);

    println!("\n========== Results ==========");
    print!("{}", solution);
    println!("\nProgress distribution:");
    print!(
        "{}",
        render_progress_histogram(&worker.progress().distribution(worker.last_generation()))
    );

    if verbose {
        println!("\nProgress records:");
        for record in worker.progress().records() {
            println!("  generation {:>6}: -{:.3}", record.generation, record.improvement);
        }
    }

    if let Some(path) = outputs.json {
        let json = serde_json::to_string_pretty(&solution)?;
        std::fs::write(&path, json)?;
        println!("\nSolution saved to {:?}", path);
    }

    if let Some(path) = outputs.svg {
        let viz = Visualizer::new();
        viz.save_svg(&viz.generate_svg(&instance, &solution), &path)?;
        println!("Visualization saved to {:?}", path);

        let progress_path = path.with_extension("progress.svg");
        let buckets = worker.progress().distribution(worker.last_generation());
        viz.save_svg(&viz.generate_progress_svg(&buckets), &progress_path)?;
        println!("Progress chart saved to {:?}", progress_path);
    }

    if let Some(path) = outputs.cities {
        instance.save_to_file(&path)?;
        println!("Cities saved to {:?}", path);
    }

    Ok(())
}

fn generate(count: usize, seed: u64, output: &PathBuf) -> CliResult {
    let instance = TspInstance::random(count, seed)?;
    instance.save_to_file(output)?;
    println!("Wrote {} cities to {:?}", instance.dimension(), output);
    Ok(())
}

fn run_benchmark(source: &CitySource, config: BenchmarkConfig, output: Option<PathBuf>) -> CliResult {
    let instance = source.load()?;
    println!("{}", instance.statistics());

    let mut benchmark = Benchmark::new(config);
    benchmark.run(&instance);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    if let Some(dir) = output {
        std::fs::create_dir_all(&dir)?;

        let results_path = dir.join("results.csv");
        benchmark.export_to_csv(&results_path)?;
        println!("Results exported to {:?}", results_path);

        let stats_path = dir.join("statistics.csv");
        benchmark.export_statistics_csv(&stats_path)?;
        println!("Statistics exported to {:?}", stats_path);

        let report_path = dir.join("report.txt");
        std::fs::write(&report_path, &report)?;
        println!("Report saved to {:?}", report_path);
    }

    Ok(())
}
