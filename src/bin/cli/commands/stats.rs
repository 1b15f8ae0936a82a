use anyhow::Result;

use flashdrill_lib::catalog::{Account, Mode};

use crate::app::App;
use crate::render::terminal::{bar, bold, dim, paint, Color};
use crate::OutputFormat;

const BAR_WIDTH: usize = 30;

pub fn run(app: &App, account: Option<Account>, mode: Option<Mode>, format: &OutputFormat, use_color: bool) -> Result<()> {
    let account = app.account_or_current(account);
    let series = app.ctx.dashboard_series(account, mode);
    let totals = app.ctx.total_stats(account, mode);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "account": account,
                "mode": mode,
                "series": series,
                "totals": totals,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let scope = mode.map_or("all modes", |m| m.label());
            println!("{}", bold(&format!("{} · {}", account, scope), use_color));

            if series.is_empty() {
                println!("  (no records yet)");
                return Ok(());
            }

            let max_words = series.iter().map(|d| d.words).max().unwrap_or(0);
            for day in &series {
                println!(
                    "{}  {:>3} sets {:>4}/{:<4} {:>3}%  {}",
                    day.date,
                    day.sets,
                    day.correct,
                    day.words,
                    day.percentage(),
                    paint(&bar(day.words, max_words, BAR_WIDTH), Color::GREEN, use_color)
                );
            }
            println!(
                "{}",
                dim(
                    &format!(
                        "total: {} sets, {}/{} words ({}%)",
                        totals.sets,
                        totals.correct,
                        totals.words,
                        totals.percentage()
                    ),
                    use_color
                )
            );
        }
    }

    Ok(())
}
