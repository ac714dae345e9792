//! ev-mpc entry point: CLI wiring and config-driven plan construction.

mod cli;

use std::process;

use tracing::error;

use ev_mpc::config::FleetConfig;
use ev_mpc::error::PlanError;
use ev_mpc::io::export::export_csv;
use ev_mpc::planner::{ChargingPlan, ChargingPlanner};
use ev_mpc::report::PlanReport;
use ev_mpc::telemetry::init_tracing;

/// Exit code for configuration problems (bad file, preset, or values).
const EXIT_CONFIG: i32 = 1;
/// Exit code for a problem the solver could not solve to optimality.
const EXIT_SOLVE: i32 = 2;

fn load_config(opts: &cli::CliOptions) -> FleetConfig {
    let loaded = match (&opts.scenario, &opts.preset) {
        (Some(path), _) => FleetConfig::from_toml_file(path),
        (None, Some(name)) => FleetConfig::from_preset(name),
        (None, None) => Ok(FleetConfig::baseline()),
    };
    match loaded {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(EXIT_CONFIG);
        }
    }
}

fn print_plan(plan: &ChargingPlan, dt_hours: f64) {
    for t in 0..=plan.steps() {
        let soc: Vec<String> = plan
            .soc
            .column(t)
            .iter()
            .map(|x| format!("{:5.1}%", x * 100.0))
            .collect();
        let fleet = if t < plan.steps() {
            format!("{:.4}", plan.fleet_power(t))
        } else {
            "-".to_string()
        };
        println!(
            "t={t:>3} ({:>5.2}h) | price={:>6.2} | fleet={fleet:>6} | soc=[{}]",
            t as f64 * dt_hours,
            plan.prices.at(t),
            soc.join(", ")
        );
    }
}

fn main() {
    init_tracing();

    let opts = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(EXIT_CONFIG);
        }
    };

    let cfg = load_config(&opts);

    let planner = match ChargingPlanner::from_config(&cfg) {
        Ok(p) => p,
        Err(e) => {
            for ce in e.config_errors() {
                eprintln!("{ce}");
            }
            process::exit(EXIT_CONFIG);
        }
    };

    let initial_soc = opts.initial_soc.clone().unwrap_or_else(|| cfg.initial_soc());
    let plan = match planner.plan(&initial_soc) {
        Ok(plan) => plan,
        Err(PlanError::Configuration(errors)) => {
            for ce in &errors {
                eprintln!("{ce}");
            }
            process::exit(EXIT_CONFIG);
        }
        Err(e) => {
            error!(error = %e, "planning failed");
            eprintln!("error: {e}");
            process::exit(EXIT_SOLVE);
        }
    };

    let dt_hours = cfg.horizon.dt_hours();
    print_plan(&plan, dt_hours);

    let report = PlanReport::from_plan(&plan, cfg.grid.fleet_max_power);
    println!("\n{report}");

    if let Some(ref path) = opts.trajectory_out {
        if let Err(e) = export_csv(&plan, dt_hours, path) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(EXIT_CONFIG);
        }
        eprintln!("Trajectory written to {}", path.display());
    }
}
