use clap::{ArgGroup, Parser};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::{info, warn};
use std::path::PathBuf;

use flocksim::analysis::{generate_json_report, generate_text_report, print_summary, render_text_report};
use flocksim::config::{Config, GeneralConfig, TopologyConfig};
use flocksim::config_loader;
use flocksim::orchestrator::{run_scenario, Scenario};
use flocksim::topology::{formation, formation_names, random_graph};

/// Decentralized routing and graph-center leader election simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("source")
        .required(true)
        .args(["config", "formation", "random", "list_formations"])
))]
struct Args {
    /// Path to a scenario YAML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name of a built-in formation
    #[arg(short, long)]
    formation: Option<String>,

    /// Print the built-in formations and exit
    #[arg(long)]
    list_formations: bool,

    /// Generate a random connected topology with this many nodes
    #[arg(long, value_name = "SIZE")]
    random: Option<usize>,

    /// Seed for the random topology
    #[arg(long, default_value_t = 12)]
    seed: u64,

    /// Probability of an extra edge between two nodes of a random topology
    #[arg(long, default_value_t = 0.2)]
    density: f64,

    /// Largest edge weight of a random topology
    #[arg(long, default_value_t = 5)]
    max_weight: u64,

    /// Write the JSON report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the text report to stdout
    #[arg(long)]
    text: bool,

    /// Write the text report to this file
    #[arg(long)]
    text_output: Option<PathBuf>,

    /// Save the resolved scenario as YAML
    #[arg(long)]
    save_scenario: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

fn resolve_config(args: &Args) -> Result<Config> {
    if let Some(path) = &args.config {
        return config_loader::load_config(path);
    }

    if let Some(name) = &args.formation {
        let preset = formation(name).ok_or_else(|| {
            eyre!(
                "Unknown formation '{}', expected one of: {}",
                name,
                formation_names().join(", ")
            )
        })?;
        return Ok(preset.into_config());
    }

    if let Some(size) = args.random {
        if size == 0 {
            return Err(eyre!("A random topology needs at least one node"));
        }
        let matrix = random_graph(size, args.density, args.max_weight, args.seed);
        return Ok(Config {
            general: GeneralConfig {
                name: format!("random-{}-seed-{}", size, args.seed),
                ..GeneralConfig::default()
            },
            topology: TopologyConfig {
                matrix: matrix.rows().to_vec(),
            },
            timeline: Vec::new(),
        });
    }

    Err(eyre!("No scenario source given"))
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    if args.list_formations {
        for name in formation_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = resolve_config(&args)?;

    // CLI level wins over the scenario's, "info" otherwise
    let level = args
        .log_level
        .clone()
        .or_else(|| config.general.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("Starting flocksim scenario '{}'", config.general.name);

    if let Some(path) = &args.save_scenario {
        config_loader::save_config(&config, path)?;
    }

    let scenario = Scenario::from_config(&config)?;
    let report = run_scenario(&scenario)
        .wrap_err_with(|| format!("Scenario '{}' failed", scenario.name))?;

    if let Some(path) = &args.output {
        generate_json_report(&report, path)?;
    }
    if let Some(path) = &args.text_output {
        generate_text_report(&report, path)?;
    }
    if args.text {
        println!("{}", render_text_report(&report));
    } else {
        print_summary(&report);
    }

    if report.converged() {
        info!("All {} steps converged", report.steps.len());
    } else {
        warn!("Some steps did not converge, see the report for details");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["flocksim", "--config", "test.yaml"]);

        assert_eq!(args.config, Some(PathBuf::from("test.yaml")));
        assert_eq!(args.seed, 12);
        assert!(args.output.is_none());
        assert!(!args.text);
    }

    #[test]
    fn test_random_args() {
        let args = Args::parse_from([
            "flocksim",
            "--random",
            "9",
            "--seed",
            "4",
            "--output",
            "report.json",
        ]);

        assert_eq!(args.random, Some(9));
        assert_eq!(args.seed, 4);
        assert_eq!(args.output, Some(PathBuf::from("report.json")));

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.topology.matrix.len(), 9);
        config.validate().unwrap();
    }

    #[test]
    fn test_source_is_required_and_exclusive() {
        assert!(Args::try_parse_from(["flocksim"]).is_err());
        assert!(Args::try_parse_from(["flocksim", "--config", "a.yaml", "--formation", "line"]).is_err());
    }

    #[test]
    fn test_unknown_formation() {
        let args = Args::parse_from(["flocksim", "--formation", "pentagon"]);
        assert!(resolve_config(&args).is_err());
    }
}
