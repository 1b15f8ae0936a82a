use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};

use flashdrill_lib::catalog::Account;
use flashdrill_lib::stats::export_csv;

use crate::app::App;

pub fn run(app: &App, account: Option<Account>, output: Option<&Path>) -> Result<()> {
    let account = app.account_or_current(account);
    let records = app.ctx.records(account);

    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            export_csv(&records, file).context("Failed to write CSV")?;
            eprintln!("Wrote {} records to {}", records.len(), path.display());
        }
        None => {
            export_csv(&records, std::io::stdout().lock()).context("Failed to write CSV")?;
        }
    }

    Ok(())
}
