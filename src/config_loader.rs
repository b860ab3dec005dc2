use crate::config::Config;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info};
use std::fs::File;
use std::path::Path;

/// Load and parse a scenario from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading scenario from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open scenario file {:?}", config_path))?;

    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse scenario file {:?}", config_path))?;

    config.validate()?;

    debug!(
        "Scenario '{}' has {} nodes and {} timeline steps",
        config.general.name,
        config.topology.matrix.len(),
        config.timeline.len()
    );

    Ok(config)
}

/// Serialize a scenario back to YAML, e.g. to save a generated topology
pub fn save_config(config: &Config, config_path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(config).wrap_err("Failed to serialize scenario")?;
    std::fs::write(config_path, yaml)
        .wrap_err_with(|| format!("Failed to write scenario file {:?}", config_path))?;
    info!("Saved scenario to: {:?}", config_path);
    Ok(())
}
