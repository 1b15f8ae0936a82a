use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use flashdrill_lib::catalog::Account;
use flashdrill_lib::{AppConfig, StudyContext};

/// Shared application state for CLI commands
pub struct App {
    pub data_dir: PathBuf,
    pub ctx: StudyContext,
}

impl App {
    /// Open the data directory and pull the shared buckets once
    pub async fn open(data_dir: Option<&Path>) -> Result<Self> {
        let app = Self::open_without_pull(data_dir)?;
        app.ctx.load().await;
        Ok(app)
    }

    /// Open the data directory using only what is stored locally
    pub fn open_without_pull(data_dir: Option<&Path>) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir)?;
        let config = AppConfig::load(&data_dir)
            .with_context(|| format!("Failed to load config from {}", data_dir.display()))?;
        let ctx = StudyContext::open(config, &data_dir)
            .with_context(|| format!("Failed to open data directory {}", data_dir.display()))?;

        Ok(Self { data_dir, ctx })
    }

    pub fn account_or_current(&self, account: Option<Account>) -> Account {
        account.unwrap_or_else(|| self.ctx.account())
    }
}

pub fn resolve_data_dir(data_dir: Option<&Path>) -> Result<PathBuf> {
    match data_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => AppConfig::data_dir().context("Failed to get data directory"),
    }
}
