use std::path::Path;

use anyhow::Result;
use gamecal_core::config::GameCalConfig;

pub fn run(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        anyhow::bail!("Config already exists at {}", config_path.display());
    }

    GameCalConfig::create_default_config(config_path)?;
    println!("Created {}", config_path.display());

    Ok(())
}
