//! Self-play training binary.
//!
//! Usage:
//!   cargo run --release --bin train -- [OPTIONS]
//!
//! Options:
//!   --config <FILE>      Configuration JSON file (optional)
//!   --kuhn               Use the Kuhn-poker preset
//!   --leduc              Use the Leduc preset (default)
//!   --iterations <N>     Override iteration count
//!   --seed <N>           Random seed (optional)
//!   --output <DIR>       Output directory (default: blueprints)
//!   --fixed-a <FILE>     Freeze seat A to a blueprint
//!   --fixed-b <FILE>     Freeze seat B to a blueprint

use std::env;
use std::path::PathBuf;
use std::process;

use indicatif::{ProgressBar, ProgressStyle};

use leduc_solver::cfr::{Trainer, TrainerConfig};

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    let mut config_file: Option<String> = None;
    let mut preset = "leduc";
    let mut iterations: Option<u64> = None;
    let mut seed: Option<u64> = None;
    let mut output_dir: Option<PathBuf> = None;
    let mut fixed_a: Option<PathBuf> = None;
    let mut fixed_b: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i < args.len() {
                    config_file = Some(args[i].clone());
                }
            }
            "--kuhn" => preset = "kuhn",
            "--leduc" => preset = "leduc",
            "--iterations" | "-i" => {
                i += 1;
                if i < args.len() {
                    iterations = args[i].parse().ok();
                }
            }
            "--seed" | "-s" => {
                i += 1;
                if i < args.len() {
                    seed = args[i].parse().ok();
                }
            }
            "--output" | "-o" => {
                i += 1;
                if i < args.len() {
                    output_dir = Some(PathBuf::from(&args[i]));
                }
            }
            "--fixed-a" => {
                i += 1;
                if i < args.len() {
                    fixed_a = Some(PathBuf::from(&args[i]));
                }
            }
            "--fixed-b" => {
                i += 1;
                if i < args.len() {
                    fixed_b = Some(PathBuf::from(&args[i]));
                }
            }
            "--help" | "-h" => {
                print_help();
                return;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = if let Some(path) = &config_file {
        match TrainerConfig::from_json_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                process::exit(1);
            }
        }
    } else if preset == "kuhn" {
        TrainerConfig::kuhn()
    } else {
        TrainerConfig::leduc()
    };

    if let Some(n) = iterations {
        config = config.with_iterations(n);
    }
    if let Some(s) = seed {
        config = config.with_seed(s);
    }
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if fixed_a.is_some() {
        config.fixed_strategy_a = fixed_a;
    }
    if fixed_b.is_some() {
        config.fixed_strategy_b = fixed_b;
    }

    println!("=================================================");
    println!("  CFR Self-Play Trainer");
    println!("=================================================");
    println!();
    println!("Model: {}", config.model_name());
    println!("Iterations: {}", config.iterations);
    println!("Deck: {:?} ({} round(s))", config.deck, config.rounds);
    if let Some(s) = config.seed {
        println!("Seed: {}", s);
    }
    if let Some(path) = &config.fixed_strategy_a {
        println!("Fixed seat A: {}", path.display());
    }
    if let Some(path) = &config.fixed_strategy_b {
        println!("Fixed seat B: {}", path.display());
    }
    println!("Output: {}", config.output_dir.display());
    println!();

    let total = config.iterations;
    let mut trainer = match Trainer::new(config) {
        Ok(trainer) => trainer,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap()
        .progress_chars("#>-"),
    );

    let result = trainer.run_with_callback(|stats| {
        bar.set_position(stats.iteration);
        bar.set_message(format!(
            "info sets: {} | avg regret: {:.5}",
            stats.info_sets, stats.avg_regret
        ));
    });
    bar.finish_and_clear();

    match result {
        Ok(report) => {
            println!("Training complete!");
            println!("Total iterations: {}", report.iterations);
            println!("Information sets: {}", report.info_sets);
            println!(
                "Average game value (A, B): {:.5}, {:.5}",
                report.avg_game_value[0], report.avg_game_value[1]
            );
            println!("Average regret: {:.6}", report.avg_regret);
            println!("Total time: {:.2}s", report.elapsed_seconds);
            println!(
                "Average speed: {:.0} iterations/second",
                report.iterations as f64 / report.elapsed_seconds.max(f64::EPSILON)
            );
            if let Some(path) = &report.blueprint_path {
                println!("Blueprint: {}", path.display());
            }
        }
        Err(e) => {
            eprintln!("Training failed: {}", e);
            process::exit(1);
        }
    }
}

fn print_help() {
    println!("CFR Self-Play Trainer");
    println!();
    println!("Usage: train [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <FILE>      Configuration JSON file");
    println!("      --kuhn               Kuhn-poker preset (3 cards, 1 round)");
    println!("      --leduc              Leduc preset (6 cards, 2 rounds, default)");
    println!("  -i, --iterations <N>     Override iteration count");
    println!("  -s, --seed <N>           Random seed");
    println!("  -o, --output <DIR>       Output directory (default: blueprints)");
    println!("      --fixed-a <FILE>     Freeze seat A to a blueprint");
    println!("      --fixed-b <FILE>     Freeze seat B to a blueprint");
    println!("  -h, --help               Show this help");
    println!();
    println!("Examples:");
    println!("  # Solve Kuhn poker with full CFR");
    println!("  train --kuhn --iterations 100000 --seed 42");
    println!();
    println!("  # Train a Leduc MCCFR blueprint");
    println!("  train --leduc --iterations 1000000");
    println!();
    println!("  # Evaluate a learner against a frozen opponent");
    println!("  train --fixed-b blueprints/opponent.json --iterations 200000");
}
