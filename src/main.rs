use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use popsim::{
    config::{init_tracing, LoggingConfig, OutputConfig},
    engine::SimulationEngine,
    growth::GrowthSummary,
    render::{console, csv, html, ChartConfig, Theme},
    replicate::{run_replicates, ReplicateSummary},
    rng::SeededRng,
    scenario::{Scenario, ScenarioLoader, SpeciesInput},
    snapshot::SnapshotStore,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Cohort-based animal population projector")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one simulation and print the results
    Run(RunArgs),
    /// Run independent seeded replicates of one scenario
    Replicate {
        #[command(flatten)]
        input: InputArgs,
        /// Number of replicates
        #[arg(long, default_value_t = 20)]
        count: usize,
    },
    /// Manage saved simulations
    Saved {
        #[command(subcommand)]
        action: SavedCommand,
        /// Directory holding saved simulations
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },
    /// Run a simulation behind a live web chart
    Serve {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Save the finished run under this name
        #[arg(long)]
        save_as: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum SavedCommand {
    /// List saved simulations
    List,
    /// Print a saved simulation
    Show {
        name: String,
        /// Also write an HTML chart
        #[arg(long)]
        html: bool,
        #[command(flatten)]
        chart: ChartArgs,
    },
    /// Delete a saved simulation
    Delete { name: String },
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Save the run under this name
    #[arg(long)]
    save: Option<String>,
    /// Write an HTML chart into the chart directory
    #[arg(long)]
    html: bool,
    /// Export the yearly totals as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Print a line per simulated year
    #[arg(long)]
    yearly: bool,
    /// Skip the console chart
    #[arg(long)]
    no_chart: bool,
}

#[derive(Debug, Args)]
struct InputArgs {
    /// Path to a scenario YAML file
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Species name (e.g. "House Mouse")
    #[arg(long)]
    species: Option<String>,
    /// Average litter size
    #[arg(long)]
    litter_size: Option<f64>,
    /// Average litters per year
    #[arg(long)]
    litters_per_year: Option<f64>,
    /// Survival rate between 0.0 and 1.0
    #[arg(long)]
    survival_rate: Option<f64>,
    /// Reproduction age in months
    #[arg(long)]
    reproduction_age: Option<u32>,
    #[arg(long)]
    initial_population: Option<u64>,
    /// Years to simulate
    #[arg(long)]
    years: Option<u32>,
    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,
    #[command(flatten)]
    chart: ChartArgs,
}

#[derive(Debug, Args)]
struct ChartArgs {
    #[arg(long, value_enum)]
    theme: Option<Theme>,
    #[arg(long)]
    chart_width: Option<usize>,
    #[arg(long)]
    chart_height: Option<usize>,
    /// Directory for HTML charts
    #[arg(long)]
    chart_dir: Option<PathBuf>,
}

impl ChartArgs {
    fn apply(&self, chart: &mut ChartConfig, output: &mut OutputConfig) {
        if let Some(theme) = self.theme {
            chart.theme = theme;
        }
        if let Some(width) = self.chart_width {
            chart.width = width;
        }
        if let Some(height) = self.chart_height {
            chart.height = height;
        }
        if let Some(dir) = &self.chart_dir {
            output.chart_dir = dir.clone();
        }
    }
}

impl InputArgs {
    fn resolve(&self) -> Result<Scenario> {
        let mut scenario = match &self.scenario {
            Some(path) => ScenarioLoader::new(".").load(path)?,
            None => Scenario::from_parts(
                SpeciesInput {
                    name: required(&self.species, "--species")?,
                    avg_litter_size: required(&self.litter_size, "--litter-size")?,
                    avg_litters_per_year: required(&self.litters_per_year, "--litters-per-year")?,
                    survival_rate: required(&self.survival_rate, "--survival-rate")?,
                    reproduction_age: required(&self.reproduction_age, "--reproduction-age")?,
                },
                required(&self.initial_population, "--initial-population")?,
                required(&self.years, "--years")?,
            ),
        };

        if let Some(name) = &self.species {
            scenario.species.name = name.clone();
        }
        if let Some(value) = self.litter_size {
            scenario.species.avg_litter_size = value;
        }
        if let Some(value) = self.litters_per_year {
            scenario.species.avg_litters_per_year = value;
        }
        if let Some(value) = self.survival_rate {
            scenario.species.survival_rate = value;
        }
        if let Some(value) = self.reproduction_age {
            scenario.species.reproduction_age = value;
        }
        if let Some(value) = self.initial_population {
            scenario.initial_population = value;
        }
        if let Some(value) = self.years {
            scenario.years = value;
        }
        if self.seed.is_some() {
            scenario.seed = self.seed;
        }
        self.chart.apply(&mut scenario.chart, &mut scenario.output);
        Ok(scenario)
    }
}

fn required<T: Clone>(value: &Option<T>, flag: &str) -> Result<T> {
    match value {
        Some(value) => Ok(value.clone()),
        None => bail!("{flag} is required when no --scenario file is given"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args),
        Command::Replicate { input, count } => replicate(input, count),
        Command::Saved {
            action,
            snapshot_dir,
        } => {
            init_tracing(&LoggingConfig::default());
            let dir = snapshot_dir.unwrap_or_else(|| OutputConfig::default().snapshot_dir);
            saved(action, dir)
        }
        Command::Serve {
            input,
            host,
            port,
            save_as,
        } => {
            let scenario = input.resolve()?;
            init_tracing(&scenario.logging);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(web::run(WebServerConfig {
                scenario,
                host,
                port,
                save_as,
            }))
        }
    }
}

fn run(args: RunArgs) -> Result<()> {
    let scenario = args.input.resolve()?;
    init_tracing(&scenario.logging);
    let (profile, params) = scenario.prepare()?;
    println!("{profile}");

    let seeded = SeededRng::new(scenario.seed);
    let mut engine = SimulationEngine::new(profile, params, seeded.rng).with_seed(seeded.seed);
    let outcome = engine.run_with_hook(|summary| {
        if args.yearly {
            println!(
                "Year {}: breeding females = {}, new offspring = {}, survivors = {}, total population = {}{}",
                summary.year,
                summary.breeding_females,
                summary.offspring,
                summary.survivors,
                summary.total,
                if summary.extinction_guarded { " (reseeded)" } else { "" }
            );
        }
    })?;

    print!("{}", outcome.report());
    println!("Seed: {}", seeded.seed);
    let summary = GrowthSummary::from_history(&outcome.history);
    println!("Peak Population: {} (year {})", summary.peak, summary.peak_year);
    if !args.no_chart {
        print!(
            "{}",
            console::render(&outcome.history, outcome.profile.name(), &scenario.chart)
        );
    }

    if args.html {
        if let Some(path) =
            html::write_outcome_chart(&scenario.output.chart_dir, &outcome, &scenario.chart)?
        {
            println!("Chart saved as: {}", path.display());
        }
    }
    if let Some(path) = &args.csv {
        csv::write(path, &outcome.history)
            .with_context(|| format!("Failed to export {}", path.display()))?;
        println!("Exported successfully to {}", path.display());
    }
    if let Some(name) = &args.save {
        let store = SnapshotStore::open(&scenario.output.snapshot_dir)?;
        store.save(name, &outcome)?;
        println!("Simulation saved successfully as: {name}");
    }
    Ok(())
}

fn replicate(input: InputArgs, count: usize) -> Result<()> {
    let scenario = input.resolve()?;
    init_tracing(&scenario.logging);
    let (profile, params) = scenario.prepare()?;
    let master = SeededRng::new(scenario.seed).seed;

    let outcomes = run_replicates(profile.clone(), params, master, count)?;
    let summary = ReplicateSummary::from_outcomes(&outcomes);
    println!("{profile}");
    println!("Replicates: {} (master seed {master})", summary.runs);
    println!(
        "Final population: mean {:.1}, min {}, max {}",
        summary.mean_final_population, summary.min_final_population, summary.max_final_population
    );
    println!("Mean growth rate: {:.2}%", summary.mean_growth_rate);
    Ok(())
}

fn saved(action: SavedCommand, dir: PathBuf) -> Result<()> {
    let store = SnapshotStore::open(&dir)?;
    match action {
        SavedCommand::List => {
            let names = store.list()?;
            if names.is_empty() {
                println!("No saved simulations found");
            } else {
                println!("Saved Simulations:");
                for (index, name) in names.iter().enumerate() {
                    println!("{}. {name}", index + 1);
                }
            }
        }
        SavedCommand::Show {
            name,
            html: write_html,
            chart: chart_args,
        } => {
            let snapshot = store.load(&name)?;
            let outcome = &snapshot.outcome;
            println!("{}", outcome.profile);
            println!(
                "Saved at {} | initial population {} | {} years",
                snapshot.saved_at.format("%Y-%m-%d %H:%M:%S"),
                outcome.initial_population,
                outcome.simulation_years
            );
            print!("{}", outcome.report());
            let mut output = OutputConfig::default();
            let mut chart = ChartConfig::default();
            chart_args.apply(&mut chart, &mut output);
            print!(
                "{}",
                console::render(&outcome.history, outcome.profile.name(), &chart)
            );
            if write_html {
                if let Some(path) = html::write_outcome_chart(&output.chart_dir, outcome, &chart)? {
                    println!("Chart saved as: {}", path.display());
                }
            }
        }
        SavedCommand::Delete { name } => {
            if store.delete(&name)? {
                println!("Deleted {name}");
            } else {
                println!("simulation not found: {name}");
            }
        }
    }
    Ok(())
}
