use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;

use flashdrill_lib::flashcards::algorithm::format_next_due;
use flashdrill_lib::flashcards::{ReviewState, SessionFilters};
use flashdrill_lib::session::{Advance, SessionRunner, SessionSummary};

use crate::app::App;
use crate::render::terminal::{bold, dim, grade_color, mode_color, paint, stars, Color, CLEAR_LINE};

type Input = Lines<BufReader<Stdin>>;

/// Read one trimmed line; `None` on EOF or when the session is cancelled
async fn prompt(input: &mut Input, token: &CancellationToken, text: &str) -> Result<Option<String>> {
    print!("{}", text);
    std::io::stdout().flush()?;
    tokio::select! {
        _ = token.cancelled() => Ok(None),
        line = input.next_line() => Ok(line?.map(|l| l.trim().to_lowercase())),
    }
}

fn exit_session(runner: &mut SessionRunner) {
    runner.exit();
    println!();
    println!("Session exited. Graded sets are kept.");
}

fn describe_review(state: &ReviewState, app: &App) -> String {
    match (state.next_due, state.due) {
        (Some(next_due), _) => format!("next review {}", format_next_due(Some(next_due), app.ctx.clock().now())),
        (None, Some(due)) => format!("level {} · due {}", state.level, due),
        (None, None) => format!("level {}", state.level),
    }
}

pub async fn run(app: &App, filters: &SessionFilters, flash_time: Option<u32>, use_color: bool) -> Result<()> {
    let ctx = &app.ctx;
    let mut runner = ctx.start_session(filters)?;
    if let Some(seconds) = flash_time {
        runner = runner.with_flash_seconds(seconds);
    }

    let token = runner.cancellation();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    while let Some(set) = runner.current().cloned() {
        let (position, length) = runner.position();
        println!();
        println!(
            "{} {}  {}  {}",
            dim(&format!("[{}/{}]", position, length), use_color),
            bold(&set.display_label(), use_color),
            paint(set.mode.label(), mode_color(set.mode), use_color),
            paint(&stars(set.priority), Color::YELLOW, use_color),
        );

        match prompt(&mut input, &token, "Press Enter to flash, q to quit: ").await? {
            Some(answer) if answer != "q" => {}
            _ => {
                exit_session(&mut runner);
                return Ok(());
            }
        }

        let items_line = set.items.join("  /  ");
        let flashed = runner
            .run_flash(|left| {
                if left > 0 {
                    print!(
                        "{}{}  {}",
                        CLEAR_LINE,
                        bold(&items_line, use_color),
                        dim(&format!("{}s", left), use_color)
                    );
                } else {
                    print!("{}", CLEAR_LINE);
                }
                let _ = std::io::stdout().flush();
            })
            .await;
        if flashed.is_err() {
            exit_session(&mut runner);
            return Ok(());
        }

        let total = set.items.len();
        let count = loop {
            let question = format!("How many of {} did you recall? ", total);
            let Some(answer) = prompt(&mut input, &token, &question).await? else {
                exit_session(&mut runner);
                return Ok(());
            };
            if answer == "q" {
                exit_session(&mut runner);
                return Ok(());
            }
            match answer.parse::<u32>() {
                Ok(n) if n as usize <= total => break n,
                _ => println!("Enter a number from 0 to {}", total),
            }
        };

        let outcome = ctx.grade_current_set(&mut runner, count).await?;
        println!(
            "{}  {}",
            bold(&format!("{}%", outcome.percentage), use_color),
            dim(&describe_review(&outcome.review_state, app), use_color)
        );
        println!("  {}", set.items.join(", "));

        let text = if position == length {
            "Enter to finish, q to quit: "
        } else {
            "Enter for next, f to finish, q to quit: "
        };
        let summary = match prompt(&mut input, &token, text).await?.as_deref() {
            None | Some("q") => {
                exit_session(&mut runner);
                return Ok(());
            }
            Some("f") => Some(ctx.finish_session(&mut runner).await?),
            Some(_) => match ctx.advance_queue(&mut runner).await? {
                Advance::Next(_) => None,
                Advance::Complete(summary) => Some(summary),
            },
        };

        if let Some(summary) = summary {
            print_summary(&summary, use_color);
            break;
        }
    }

    Ok(())
}

fn print_summary(summary: &SessionSummary, use_color: bool) {
    println!();
    println!(
        "{}  {}/{} ({}%)",
        paint(summary.grade.message(), grade_color(summary.grade), use_color),
        summary.correct,
        summary.total,
        summary.percentage
    );
    for record in &summary.records {
        println!(
            "  {:<12} {} sets  {}/{}",
            record.mode.label(),
            record.sets,
            record.correct,
            record.words
        );
    }
}
