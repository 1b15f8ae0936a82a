use anyhow::{Context, Result};

use flashdrill_lib::catalog::Account;
use flashdrill_lib::flashcards::SessionFilters;

use crate::app::App;
use crate::render::terminal::{bold, sync_badge};
use crate::OutputFormat;

pub fn run_show(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let account = app.ctx.account();
    let sync = app.ctx.sync();
    let stats = app.ctx.pool_stats(&SessionFilters::default());

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "account": account,
                "remote": sync.has_remote(),
                "status": sync.status(),
                "due": stats.due,
                "unseen": stats.unseen,
                "reviewed": sync.review_states().len(),
                "records": sync.records().len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", bold(&format!("Account: {}", account), use_color));
            if sync.has_remote() {
                println!("Sync: {}", sync_badge(sync.status(), use_color));
            } else {
                println!("Sync: local only");
            }
            println!("Due: {} · unseen: {}", stats.due, stats.unseen);
            println!(
                "Reviewed sets: {} · records: {}",
                sync.review_states().len(),
                sync.records().len()
            );
        }
    }

    Ok(())
}

pub fn run_switch(app: &App, account: Account) -> Result<()> {
    app.ctx.switch_account(account);
    println!("Switched to {}", account);
    Ok(())
}

pub async fn run_reset_review(app: &App) -> Result<()> {
    app.ctx
        .reset_review_states()
        .await
        .context("Failed to reset review state")?;
    println!("Review state of {} cleared", app.ctx.account());
    Ok(())
}

pub async fn run_reset_records(app: &App, account: Account) -> Result<()> {
    app.ctx
        .reset_records(account)
        .await
        .context("Failed to reset records")?;
    println!("Records of {} cleared", account);
    Ok(())
}
