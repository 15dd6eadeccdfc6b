mod types;
mod error;
mod utils;
mod position;
mod mechanism;
mod gsp;
mod vcg;
mod history;
mod agent;
mod agents;
mod balanced_bidder;
mod simulation;
mod scenarios;
mod logger;

use logger::{Logger, LogEvent, ConsoleReceiver, FileReceiver, ReceiverId, sanitize_filename};
use std::path::PathBuf;

use scenarios::get_scenario_catalog;

/// Scenario run when no arguments are given
const DEFAULT_SCENARIO: &str = "balanced_gsp";

fn parse_number(arg: &str, what: &str) -> u64 {
    match arg.parse::<u64>() {
        Ok(n) => n,
        Err(_) => {
            eprintln!("Error: Invalid {} parameter '{}'. Expected a number.", what, arg);
            std::process::exit(1);
        }
    }
}

fn add_file_receiver(logger: &mut Logger, path: &str, events: Vec<LogEvent>) -> ReceiverId {
    match FileReceiver::new(&PathBuf::from(path), events) {
        Ok(receiver) => logger.add_receiver(receiver),
        Err(e) => {
            eprintln!("Error: Cannot open log file '{}': {}", path, e);
            std::process::exit(1);
        }
    }
}

fn main() {
    let raw_args: Vec<String> = std::env::args().collect();

    // Parse and filter out --verbose and --fastbreak arguments
    let mut args = Vec::new();
    let mut skip_next = false;
    let mut fastbreak = false;
    let mut verbose_auction = false;
    for (i, arg) in raw_args.iter().enumerate() {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--verbose" {
            if i + 1 < raw_args.len() && raw_args[i + 1] == "auction" {
                verbose_auction = true;
                skip_next = true;
            }
            continue;
        }
        if arg == "--fastbreak" {
            fastbreak = true;
            continue;
        }
        args.push(arg.clone());
    }

    if args.len() <= 1 {
        // Default behavior: run one scenario with per-agent statistics on the console
        let mut logger = Logger::new();
        logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Simulation, LogEvent::Scenario, LogEvent::Validation]));
        let run = scenarios::balanced_gsp::run;
        if let Err(e) = run(DEFAULT_SCENARIO, 0, &mut logger) {
            eprintln!("Error running scenario: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let scenario_arg = &args[1];
    let iterations = if args.len() > 2 { parse_number(&args[2], "iterations") } else { 1 };
    let start_iteration = if args.len() > 3 { parse_number(&args[3], "start iteration") } else { 0 };

    // Filter scenarios: if "all", use all scenarios; otherwise filter to the named scenario
    let all_scenarios = get_scenario_catalog();
    let scenarios: Vec<_> = if scenario_arg == "all" {
        all_scenarios.clone()
    } else {
        match all_scenarios.iter().find(|s| s.short_name == scenario_arg) {
            Some(scenario) => vec![scenario.clone()],
            None => {
                eprintln!("Error: Scenario '{}' not found.", scenario_arg);
                eprintln!("Available scenarios:");
                for s in &all_scenarios {
                    eprintln!("  - {}", s.short_name);
                }
                std::process::exit(1);
            }
        }
    };

    // Show individual checks on the console only for a single named scenario run once
    let mut logger = Logger::new();
    if scenario_arg != "all" && iterations == 1 {
        logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Validation, LogEvent::Scenario]));
    } else {
        logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Validation]));
    }
    let summary_receiver_id = add_file_receiver(&mut logger, "log/summary.log", vec![LogEvent::Validation]);

    if iterations > 1 {
        logln!(&mut logger, LogEvent::Validation, "Running {} {} times...\n", scenario_arg, iterations);
    } else {
        logln!(&mut logger, LogEvent::Validation, "Running {}...\n", scenario_arg);
    }

    let mut failures = 0;
    'scenarios: for scenario in &scenarios {
        log!(&mut logger, LogEvent::Validation, "{}: ", scenario.short_name);

        let scenario_dir = format!("log/{}", sanitize_filename(scenario.short_name));
        let scenario_receiver_id = add_file_receiver(&mut logger, &format!("{}/scenario.log", scenario_dir), vec![LogEvent::Scenario, LogEvent::Simulation]);
        let auction_receiver_id = if verbose_auction {
            Some(add_file_receiver(&mut logger, &format!("{}/auctions.log", scenario_dir), vec![LogEvent::Auction, LogEvent::Round]))
        } else {
            None
        };

        for seed in start_iteration..(start_iteration + iterations) {
            if iterations > 1 {
                log!(&mut logger, LogEvent::Validation, "[{}/{}] ", seed - start_iteration + 1, iterations);
            }

            match (scenario.run)(scenario.short_name, seed, &mut logger) {
                Ok(()) => {
                    if iterations > 1 {
                        logln!(&mut logger, LogEvent::Validation, "✓");
                    } else {
                        logln!(&mut logger, LogEvent::Validation, "✓ PASSED");
                    }
                }
                Err(e) => {
                    failures += 1;
                    if iterations > 1 {
                        logln!(&mut logger, LogEvent::Validation, "✗");
                    } else {
                        logln!(&mut logger, LogEvent::Validation, "✗ FAILED: {}", e);
                    }

                    // If fastbreak is enabled, stop immediately on first failure
                    if fastbreak {
                        logger.remove_receiver(scenario_receiver_id);
                        if let Some(id) = auction_receiver_id {
                            logger.remove_receiver(id);
                        }
                        logln!(&mut logger, LogEvent::Validation, "\nStopping scenario execution due to failure (--fastbreak enabled)");
                        logln!(&mut logger, LogEvent::Validation, "Error with seed {}: {}", seed, e);
                        break 'scenarios;
                    }
                }
            }

            // Flush to ensure validation is written to summary.log
            let _ = logger.flush();
        }

        logger.remove_receiver(scenario_receiver_id);
        if let Some(id) = auction_receiver_id {
            logger.remove_receiver(id);
        }
    }

    logln!(&mut logger, LogEvent::Validation, "\nFailed runs: {}", failures);
    logger.remove_receiver(summary_receiver_id);
    if failures > 0 {
        std::process::exit(1);
    }
}
