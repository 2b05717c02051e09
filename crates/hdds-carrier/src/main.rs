// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HDDS Carrier CLI
//!
//! Inspect carrier specifications and replay priority scenarios offline.
//!
//! # Usage
//!
//! ```bash
//! # Show how a carrier specification is parsed
//! hdds-carrier parse "tcp+recv.priority+level.15+time.2"
//!
//! # Print the decay curve of a source
//! hdds-carrier curve --level 10 --time 2
//!
//! # Replay a scenario
//! hdds-carrier gen-config -o scenario.toml
//! hdds-carrier simulate -c scenario.toml
//! ```

use clap::{Parser, Subcommand};
use hdds_carrier::{
    simulator, CarrierFactory, Direction, ModifierConfig, PriorityElection, ScenarioConfig,
    SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// HDDS Carrier Tool
#[derive(Parser, Debug)]
#[command(name = "hdds-carrier")]
#[command(about = "HDDS carrier tool - modifier chains and priority scenarios")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a carrier specification and show the resulting chain
    Parse {
        /// Carrier specification, e.g. "tcp+recv.priority+level.15"
        spec: String,
    },

    /// Print the decay curve of a source seen at t=0
    Curve {
        /// Peak priority
        #[arg(long, default_value = "10")]
        level: f64,

        /// Time constant (seconds)
        #[arg(long, default_value = "2")]
        time: f64,

        /// Number of intervals
        #[arg(long, default_value = "24")]
        steps: usize,
    },

    /// Replay a scenario file
    Simulate {
        /// Scenario file path (built-in example if omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate example scenario file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "scenario.toml")]
        output: PathBuf,
    },

    /// Validate a scenario file
    Validate {
        /// Scenario file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match args.command {
        Commands::Parse { spec } => cmd_parse(&spec),
        Commands::Curve { level, time, steps } => {
            cmd_curve(level, time, steps);
            Ok(())
        }
        Commands::Simulate { config } => cmd_simulate(config),
        Commands::GenConfig { output } => cmd_gen_config(output),
        Commands::Validate { config } => cmd_validate(config),
    }
}

fn cmd_parse(spec: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = ModifierConfig::parse(spec);

    println!("Carrier: {}", config.base());
    println!("Parameters:");
    for (key, value) in config.iter() {
        match value {
            Some(value) => println!("  {} = {}", key, value),
            None => println!("  {} (flag)", key),
        }
    }

    let peers = Arc::new(PriorityElection::new());
    let factory = CarrierFactory::with_defaults(peers, Arc::new(SystemClock));
    for direction in [Direction::Recv, Direction::Send] {
        let carrier = factory.build(spec, direction)?;
        let flags = carrier.flags();
        println!(
            "{} chain: {} (companion={}, connectionless={}, reply={})",
            direction,
            carrier.describe(),
            flags.requires_companion,
            flags.connectionless,
            flags.supports_reply
        );
    }
    Ok(())
}

fn cmd_curve(level: f64, time: f64, steps: usize) {
    println!("Decay curve: level={} time={}", level, time);
    for (t, priority) in simulator::decay_curve(level, time, steps) {
        let bar = if level > 0.0 {
            "#".repeat((priority / level * 40.0).round() as usize)
        } else {
            String::new()
        };
        println!("  t={:>7.3}  {:>9.4}  {}", t, priority, bar);
    }
}

fn cmd_simulate(config: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => ScenarioConfig::from_file(path)?,
        None => ScenarioConfig::example(),
    };

    let report = simulator::run(&config)?;
    print!("{}", report);
    println!();
    for source in &config.sources {
        println!(
            "  {}: {} delivered",
            source.name,
            report.delivered_from(&source.name)
        );
    }
    Ok(())
}

fn cmd_gen_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let toml_str = ScenarioConfig::example().to_toml()?;

    // Add comments
    let content = format!(
        r#"# HDDS Carrier Scenario
# Generated by hdds-carrier gen-config

{}
"#,
        toml_str
    );

    std::fs::write(&output, content)?;
    println!("Generated scenario file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    match ScenarioConfig::from_file(&config_path) {
        Ok(config) => {
            println!("Scenario valid!");
            println!();
            println!("Scenario: {}", config.name);
            println!("Endpoint: {}", config.endpoint);
            println!("Sources: {}", config.sources.len());
            for source in &config.sources {
                println!("  {} -> {}", source.name, config.carrier_spec(source));
            }
            println!("Events: {}", config.events.len());
            Ok(())
        }
        Err(e) => {
            eprintln!("Scenario invalid: {}", e);
            std::process::exit(1);
        }
    }
}
