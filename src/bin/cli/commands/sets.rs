use anyhow::{Context, Result};

use flashdrill_lib::catalog::{Mode, NewWordSet};

use crate::app::App;
use crate::render::terminal::{dim, mode_color, paint, stars, sync_badge, Color};
use crate::OutputFormat;

pub fn run_list(app: &App, mode: Option<Mode>, format: &OutputFormat, use_color: bool) -> Result<()> {
    let sets: Vec<_> = app
        .ctx
        .all_sets()
        .into_iter()
        .filter(|s| mode.map_or(true, |m| s.mode == m))
        .collect();
    let states = app.ctx.sync().review_states();

    match format {
        OutputFormat::Json => {
            let output: Vec<_> = sets
                .iter()
                .map(|set| {
                    serde_json::json!({
                        "set": set,
                        "review": states.get(&set.id),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            for set in &sets {
                let review = match states.get(&set.id) {
                    Some(state) => match state.due {
                        Some(due) => format!("Lv{} next {}", state.level, due),
                        None => format!("Lv{}", state.level),
                    },
                    None => String::new(),
                };
                println!(
                    "{:<20} {:<12} {:<7} {}  {:<28} {}",
                    set.id,
                    paint(set.mode.label(), mode_color(set.mode), use_color),
                    set.owner,
                    paint(&stars(set.priority), Color::YELLOW, use_color),
                    set.display_label(),
                    dim(&review, use_color)
                );
            }
            println!("{} sets", sets.len());
        }
    }

    Ok(())
}

pub async fn run_add(app: &App, input: NewWordSet, format: &OutputFormat) -> Result<()> {
    let set = app.ctx.add_custom_set(input).await.context("Failed to add set")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&set)?),
        OutputFormat::Plain => println!("Added {} ({} items)", set.id, set.items.len()),
    }
    report_sync(app);
    Ok(())
}

pub async fn run_delete(app: &App, id: &str) -> Result<()> {
    app.ctx
        .delete_set(id)
        .await
        .with_context(|| format!("Failed to delete '{}'", id))?;
    println!("Deleted {}", id);
    report_sync(app);
    Ok(())
}

pub async fn run_priority(app: &App, id: &str, priority: u8) -> Result<()> {
    app.ctx
        .update_priority(id, priority)
        .await
        .with_context(|| format!("Failed to change priority of '{}'", id))?;
    println!("{} is now {}", id, stars(priority));
    report_sync(app);
    Ok(())
}

pub async fn run_reset_priorities(app: &App) -> Result<()> {
    app.ctx.reset_priorities().await.context("Failed to reset priorities")?;
    println!("Seed priorities restored; custom sets kept");
    report_sync(app);
    Ok(())
}

fn report_sync(app: &App) {
    if app.ctx.sync().has_remote() {
        eprintln!("sync {}", sync_badge(app.ctx.sync().status(), false));
    }
}
