use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, LevelFilter};
use pack_optimizer_2d::io;
use pack_optimizer_2d::{GeneticConfig, Optimizer, TabuConfig};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// A `.bp2d` instance file, or a directory scanned for them
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// Directory where solution JSON files are written
    #[arg(short, long, value_name = "FOLDER")]
    output: PathBuf,

    /// JSON run configuration file; takes precedence over the parameter flags below
    #[arg(short, long, value_name = "FILE")]
    config_file: Option<PathBuf>,

    /// Which metaheuristic searches the item orderings
    #[arg(short, long, value_enum, default_value_t = Metaheuristic::Ga)]
    metaheuristic: Metaheuristic,

    /// Number of orderings per GA generation
    #[arg(long, default_value_t = 100)]
    population_size: usize,

    /// Number of GA generations
    #[arg(long, default_value_t = 50)]
    generations: usize,

    /// Fraction of the GA population replaced by crossover offspring
    #[arg(long, default_value_t = 0.7)]
    crossover_rate: f64,

    /// Probability for each GA individual to be mutated per generation
    #[arg(long, default_value_t = 0.1)]
    mutation_rate: f64,

    /// Number of tabu search iterations
    #[arg(long, default_value_t = 500)]
    iterations: usize,

    /// Capacity of the tabu list (must be below 3x the number of items)
    #[arg(long, default_value_t = 10)]
    tabu_size: usize,

    /// Bias of generated orderings towards the large-items-first sequence (>= 1)
    #[arg(long, default_value_t = 1.0)]
    kappa: f64,

    /// Bias of crossover partner selection towards fitter orderings (>= 1)
    #[arg(long, default_value_t = 1.0)]
    delta: f64,

    /// Require every bin layout to be producible by guillotine cuts
    #[arg(long)]
    guillotine: bool,

    /// Allow items to be rotated by 90 degrees
    #[arg(long)]
    rotation: bool,

    /// Master seed for the pseudo-random number generator
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Metaheuristic {
    Ga,
    Tabu,
}

/// Everything a run needs besides the paths and the metaheuristic selector. Loaded
/// from `--config-file` when given, otherwise assembled from the parameter flags.
/// Fields missing from the JSON fall back to their defaults.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
struct RunConfig {
    genetic: GeneticConfig,
    tabu: TabuConfig,
    guillotine: bool,
    rotation: bool,
    prng_seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            genetic: GeneticConfig::default(),
            tabu: TabuConfig::default(),
            guillotine: false,
            rotation: false,
            prng_seed: 0,
        }
    }
}

fn run_config(cli: &Cli) -> Result<RunConfig> {
    match &cli.config_file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("could not open config file {}", path.display()))?;
            let config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("could not parse config file {}", path.display()))?;
            info!("run configuration loaded from {}", path.display());
            Ok(config)
        }
        None => Ok(RunConfig {
            genetic: GeneticConfig {
                population_size: cli.population_size,
                generations: cli.generations,
                crossover_rate: cli.crossover_rate,
                mutation_rate: cli.mutation_rate,
                kappa: cli.kappa,
                delta: cli.delta,
            },
            tabu: TabuConfig {
                iterations: cli.iterations,
                tabu_size: cli.tabu_size,
                kappa: cli.kappa,
            },
            guillotine: cli.guillotine,
            rotation: cli.rotation,
            prng_seed: cli.seed,
        }),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level)?;

    let config = run_config(&cli)?;
    debug!(
        "effective run configuration: {}",
        serde_json::to_string(&config)?
    );

    let instance_paths = collect_instance_paths(&cli.input)?;
    if instance_paths.is_empty() {
        bail!("no .bp2d instance files found at {}", cli.input.display());
    }

    fs::create_dir_all(&cli.output).with_context(|| {
        format!(
            "could not create solution folder {}",
            cli.output.display()
        )
    })?;

    for path in &instance_paths {
        solve_instance(&cli, &config, path)?;
    }

    Ok(())
}

fn solve_instance(cli: &Cli, config: &RunConfig, path: &Path) -> Result<()> {
    let instance = io::read_instance(path)?;
    let stem = path
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("solution");

    info!("===================== {} =====================", stem);
    info!(
        "bin dimensions: {}x{}",
        instance.bin_width, instance.bin_height
    );
    info!("number of items: {}", instance.items.len());

    let start = Instant::now();

    let mut optimizer = Optimizer::new(instance.bin_width, instance.bin_height);
    optimizer
        .add_items(instance.items.iter().copied())
        .set_random_seed(config.prng_seed)
        .allow_rotation(config.rotation)
        .require_guillotine(config.guillotine);

    let solution = match cli.metaheuristic {
        Metaheuristic::Ga => optimizer.optimize_genetic(&config.genetic)?,
        Metaheuristic::Tabu => optimizer.optimize_tabu(&config.tabu)?,
    };

    info!("time elapsed: {:.1} seconds", start.elapsed().as_secs_f64());
    info!(
        "best solution: {} bins (fitness {:.4})",
        solution.bins.len(),
        solution.fitness
    );

    let solution_path = cli.output.join(format!("{}-solution.json", stem));
    io::write_solution(&solution.bins, &solution_path)?;

    Ok(())
}

fn collect_instance_paths(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let entries = fs::read_dir(input)
        .with_context(|| format!("could not read input directory {}", input.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(OsStr::to_str) == Some("bp2d") {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths)
}

fn init_logger(level_filter: LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}", record.level(), message))
        })
        .level(level_filter)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}
