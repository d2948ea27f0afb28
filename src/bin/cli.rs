//! meetup CLI - generate size-balanced meetup groups from a user location file
//!
//! Usage:
//!   meetup-cli run <user_locations.csv> <run_name> [--min-occupancy N] [--max-occupancy N]
//!   meetup-cli clear <run_name> [--all]
//!
//! Results are written to `<run_name>/results.csv`; `--visualize-results`
//! also writes `<run_name>/report.json`. The initial grouping is cached per
//! run name, so re-running with different occupancy bounds is fast.

use clap::{Parser, Subcommand};
use log::{LevelFilter, error, info};
use meetup::cache::DEFAULT_CACHE_DIR;
use meetup::meeting_points::{CachedNetworkProvider, DEFAULT_NETWORK_MODE};
use meetup::{
    AffinityPropagation, CapacitatedKMeans, ClusterReport, FileNetworkProvider, InputColumns,
    MeetingPointMethod, MeetingPointResolver, Pipeline, RefinementConfig, Result, RunCache,
    format_results, load_user_locations, write_results_csv,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "meetup-cli")]
#[command(about = "Group users into balanced meetups and pick a meeting point for each group", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Folder holding the per-run cache
    #[arg(long, global = true, default_value = DEFAULT_CACHE_DIR)]
    cache_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate groups and meeting points for a user location file
    Run {
        /// CSV file with a user id, latitude and longitude column per user
        user_locations: PathBuf,

        /// Name of this run. Results are written to <run_name>/results.csv
        run_name: String,

        /// Split/merge rounds before giving up on the occupancy range
        #[arg(long)]
        max_optimization_iterations: Option<usize>,

        /// Minimum group occupancy to target. Not guaranteed
        #[arg(long)]
        min_occupancy: Option<usize>,

        /// Maximum group occupancy to target. Not guaranteed
        #[arg(long)]
        max_occupancy: Option<usize>,

        /// Name of the user id column
        #[arg(long, default_value = "user_id")]
        user_id_col: String,

        /// Name of the latitude column
        #[arg(long, default_value = "latitude")]
        lat_col: String,

        /// Name of the longitude column
        #[arg(long, default_value = "longitude")]
        lng_col: String,

        /// One of: centroid, centroid_snapped_to_street, landmark
        #[arg(long, default_value = "centroid")]
        meeting_point_method: MeetingPointMethod,

        /// Street network node export (JSON) used for centroid_snapped_to_street
        #[arg(long)]
        network: Option<PathBuf>,

        /// Travel mode of the street network
        #[arg(long, default_value = DEFAULT_NETWORK_MODE)]
        network_mode: String,

        /// Also write a per-group report for visualisation
        #[arg(long)]
        visualize_results: bool,
    },

    /// Remove the cached results of a run
    Clear {
        /// Name of the run to clear
        run_name: String,

        /// Clear the cache of every run instead
        #[arg(long)]
        all: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let outcome = match cli.command {
        Commands::Run {
            user_locations,
            run_name,
            max_optimization_iterations,
            min_occupancy,
            max_occupancy,
            user_id_col,
            lat_col,
            lng_col,
            meeting_point_method,
            network,
            network_mode,
            visualize_results,
        } => {
            let columns = InputColumns {
                user_id: user_id_col,
                latitude: lat_col,
                longitude: lng_col,
            };
            let config = RefinementConfig {
                min_occupancy,
                max_occupancy,
                max_iters: max_optimization_iterations,
            };
            run(RunArgs {
                user_locations,
                run_name,
                cache_dir: cli.cache_dir,
                columns,
                config,
                method: meeting_point_method,
                network,
                network_mode,
                visualize_results,
            })
        }
        Commands::Clear { run_name, all } => clear(&cli.cache_dir, &run_name, all),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

struct RunArgs {
    user_locations: PathBuf,
    run_name: String,
    cache_dir: PathBuf,
    columns: InputColumns,
    config: RefinementConfig,
    method: MeetingPointMethod,
    network: Option<PathBuf>,
    network_mode: String,
    visualize_results: bool,
}

fn run(args: RunArgs) -> Result<()> {
    info!(
        "Generating groups for input file {}",
        args.user_locations.display()
    );

    let cache = RunCache::open(&args.cache_dir, &args.run_name)?;
    let output_dir = PathBuf::from(&args.run_name);
    fs::create_dir_all(&output_dir)?;

    if let Some(min) = args.config.min_occupancy {
        info!("Will try to ensure that every group has at least {} users", min);
    }
    if let Some(max) = args.config.max_occupancy {
        info!("Will try to ensure that no group has more than {} users", max);
    }

    let users = load_user_locations(&args.user_locations, &args.columns)?;

    let initial = AffinityPropagation::default();
    let capacitated = CapacitatedKMeans::default();
    let labeling = Pipeline::new(&initial, &capacitated)
        .with_cache(&cache)
        .run_clustering(&users, &args.config)?;

    let provider = args
        .network
        .as_ref()
        .map(|path| CachedNetworkProvider::new(FileNetworkProvider::new(path), &cache));
    let mut resolver = MeetingPointResolver::new().with_network_mode(args.network_mode.as_str());
    if let Some(provider) = provider.as_ref() {
        resolver = resolver.with_network(provider);
    }
    let meeting_points = resolver.resolve(&labeling, Some(args.method))?;

    let rows = format_results(&labeling, &meeting_points);
    let results_path = output_dir.join("results.csv");
    write_results_csv(&results_path, &rows)?;
    info!(
        "Wrote {} users in {} groups to {}",
        rows.len(),
        labeling.group_count(),
        results_path.display()
    );

    if args.visualize_results {
        let report_path = output_dir.join("report.json");
        ClusterReport::build(&args.run_name, &labeling, &meeting_points).write_json(&report_path)?;
        info!("Wrote group report to {}", report_path.display());
    }

    Ok(())
}

fn clear(cache_dir: &Path, run_name: &str, all: bool) -> Result<()> {
    if all {
        RunCache::clear_all(cache_dir)
    } else {
        RunCache::new(cache_dir, run_name).clear()
    }
}
