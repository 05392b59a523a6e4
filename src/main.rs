//! Storage simulator entry point — CLI wiring and config-driven engine construction.

use std::path::Path;
use std::process;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use storage_sim::config::ScenarioConfig;
use storage_sim::io::export::export_csv;
use storage_sim::sim::engine::Engine;
use storage_sim::sim::report::RunReport;
use storage_sim::sim::source::{CsvSetpointSource, CycleSchedule, SetpointSource};
use storage_sim::sim::types::{EpochResult, SimConfig};
use storage_sim::storage::StorageState;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    epochs_override: Option<usize>,
    telemetry_out: Option<String>,
}

fn print_help() {
    eprintln!("storage-sim — epoch-driven battery storage simulator");
    eprintln!();
    eprintln!("Usage: storage-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (baseline, undersized)");
    eprintln!("  --epochs <n>             Override the number of epochs");
    eprintln!("  --telemetry-out <path>   Export epoch results to CSV");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        epochs_override: None,
        telemetry_out: None,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --scenario requires a path argument");
                    process::exit(1);
                }
                cli.scenario_path = Some(args[i].clone());
            }
            "--preset" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --preset requires a name argument");
                    process::exit(1);
                }
                cli.preset = Some(args[i].clone());
            }
            "--epochs" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --epochs requires a number argument");
                    process::exit(1);
                }
                if let Ok(n) = args[i].parse::<usize>() {
                    cli.epochs_override = Some(n);
                } else {
                    eprintln!("error: --epochs value \"{}\" is not a valid number", args[i]);
                    process::exit(1);
                }
            }
            "--telemetry-out" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("error: --telemetry-out requires a path argument");
                    process::exit(1);
                }
                cli.telemetry_out = Some(args[i].clone());
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    if cli.scenario_path.is_some() && cli.preset.is_some() {
        eprintln!("error: --scenario and --preset are mutually exclusive; choose one source");
        process::exit(1);
    }

    cli
}

fn init_tracing() {
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer());
    subscriber.init();
}

/// Runs the engine to completion, exiting the process on a failed epoch.
fn run_to_completion<S: SetpointSource>(mut engine: Engine<S>) -> Vec<EpochResult> {
    match engine.run() {
        Ok(results) => results,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn main() {
    init_tracing();
    let cli = parse_args();

    // Load config: --scenario takes priority, then --preset, then baseline
    let mut scenario = if let Some(ref path) = cli.scenario_path {
        match ScenarioConfig::from_toml_file(Path::new(path)) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = cli.preset {
        match ScenarioConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        ScenarioConfig::baseline()
    };

    // Apply epoch override
    if let Some(epochs) = cli.epochs_override {
        scenario.simulation.epochs = epochs;
    }

    // Validate scenario-level fields
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    // A storage configuration the model rejects is a startup failure.
    let storage = match StorageState::new(&scenario.storage) {
        Ok(storage) => storage,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    let kwh_rated = storage.kwh_rated();

    let sim_config = SimConfig::new(scenario.simulation.epochs, scenario.simulation.epoch_seconds);
    tracing::info!(
        epochs = sim_config.epochs,
        epoch_seconds = sim_config.epoch_seconds,
        "starting storage simulation"
    );

    // The two source kinds give the engine different types; run each arm.
    let results = if let Some(ref path) = scenario.control.csv {
        let source = match CsvSetpointSource::from_path(path) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        };
        run_to_completion(Engine::new(sim_config.clone(), storage, source))
    } else {
        let setpoints = scenario.control.setpoints.clone().unwrap_or_default();
        let source = match CycleSchedule::new(setpoints) {
            Ok(source) => source,
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        };
        run_to_completion(Engine::new(sim_config.clone(), storage, source))
    };

    // Print per-epoch results
    for r in &results {
        println!("{r}");
    }

    // Print the run report
    let report = RunReport::from_results(&results, sim_config.epoch_hours, kwh_rated);
    println!("\n{report}");

    // Export CSV if requested
    if let Some(ref path) = cli.telemetry_out {
        if let Err(e) = export_csv(&results, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        tracing::info!("telemetry written to {path}");
    }
}
