//! bandit-lab — multi-armed bandit simulation harness
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the arms and strategies, runs the simulation, and reports the
//! aggregated payout curves.

use anyhow::{Context, Result};
use tracing::{info, warn};

use bandit_lab::config;
use bandit_lab::engine::{aggregate, rank, Runner};
use bandit_lab::report::{self, PlotSpec};
use bandit_lab::storage::{self, SimulationRecord};

const DEFAULT_CONFIG: &str = "config.toml";

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = config::AppConfig::load(&config_path)?;
    let sim = &cfg.simulation;

    info!(
        config = %config_path,
        runs = sim.runs,
        epochs = sim.epochs,
        recommendation_size = sim.recommendation_size,
        arms = cfg.arms.len(),
        strategies = cfg.strategies.len(),
        seed = ?sim.seed,
        "bandit-lab starting up"
    );

    // -- Build engine inputs ---------------------------------------------

    let arms = cfg.build_arms()?;
    let strategies = cfg.build_strategies();
    let mut runner = Runner::new(arms, strategies).context("Failed to build runner")?;

    // -- Simulate and aggregate ------------------------------------------

    let results = runner
        .simulate(sim.runs, sim.epochs, sim.recommendation_size)
        .context("Simulation aborted")?;

    let aggregated = aggregate(&results, sim.runs, sim.epochs, sim.mode)?;
    report::print_aggregated_results(&aggregated);

    if let Some((best, value)) = rank(&aggregated).first() {
        info!(strategy = %best, final_value = format!("{value:.4}"), mode = %sim.mode, "Best strategy");
    }

    // -- Outputs ---------------------------------------------------------

    if let Some(path) = sim.results_path.as_deref() {
        let record = SimulationRecord::new(sim.runs, sim.epochs, sim.recommendation_size, results);
        storage::save_record(&record, Some(path))?;
        info!(path, id = %record.id, "Trial results saved");
    }

    if let Some(path) = sim.plot_path.as_deref() {
        if !PlotSpec::new(&aggregated, sim.scale).is_drawable() {
            warn!(scale = %sim.scale, "Some values cannot be shown on a log axis");
        }
        report::write_plot(path, &aggregated, sim.scale)?;
    }

    info!("bandit-lab finished.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bandit_lab=info"));

    let json_logging = std::env::var("BANDIT_LAB_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
