use std::path::Path;

use anyhow::{Context, Result};

use flashdrill_lib::AppConfig;

use crate::app::resolve_data_dir;
use crate::OutputFormat;

pub fn run_show(data_dir: Option<&Path>, format: &OutputFormat) -> Result<()> {
    let data_dir = resolve_data_dir(data_dir)?;
    let mut config = AppConfig::load(&data_dir).context("Failed to load config")?;
    if let Some(remote) = config.remote.as_mut() {
        if !remote.password.is_empty() {
            remote.password = "***".to_string();
        }
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Plain => {
            println!("# {}", AppConfig::path_in(&data_dir).display());
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

pub fn run_init(data_dir: Option<&Path>) -> Result<()> {
    let data_dir = resolve_data_dir(data_dir)?;
    let path = AppConfig::init(&data_dir).context("Failed to write config")?;
    println!("Config at {}", path.display());
    Ok(())
}
