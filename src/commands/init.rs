use anyhow::{Context, Result};
use std::path::PathBuf;
use wikiredirects::config::{Config, DEFAULT_CONFIG_FILE};

pub fn init_config(path: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))?;

    let config_path = path.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("Configuration file already exists: {}", config_path.display());
    }

    let toml_content = format!(
        "# wikiredirects configuration\n\n{}",
        Config::default().to_toml()?
    );

    std::fs::write(&config_path, toml_content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created configuration file: {}", config_path.display());

    Ok(())
}
