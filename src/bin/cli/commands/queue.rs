use anyhow::Result;

use flashdrill_lib::flashcards::SessionFilters;

use crate::app::App;
use crate::render::terminal::{dim, mode_color, paint, stars, Color};
use crate::OutputFormat;

pub fn run(app: &App, filters: &SessionFilters, format: &OutputFormat, use_color: bool) -> Result<()> {
    let queue = app.ctx.build_session_queue(filters);
    let stats = app.ctx.pool_stats(filters);
    let states = app.ctx.sync().review_states();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "policy": app.ctx.policy().kind().to_string(),
                "due": stats.due,
                "unseen": stats.unseen,
                "queue": queue,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!(
                "{} policy · {} due · {} unseen",
                app.ctx.policy().kind(),
                stats.due,
                stats.unseen
            );
            if queue.is_empty() {
                println!("  (no sets match the filters)");
            }
            for (i, set) in queue.iter().enumerate() {
                let review = match states.get(&set.id) {
                    Some(state) => format!("Lv{}", state.level),
                    None => "new".to_string(),
                };
                println!(
                    "{:>3}. {:<28} {:<12} {}  {}",
                    i + 1,
                    set.display_label(),
                    paint(set.mode.label(), mode_color(set.mode), use_color),
                    paint(&stars(set.priority), Color::YELLOW, use_color),
                    dim(&review, use_color)
                );
            }
        }
    }

    Ok(())
}
