//! Read-only reporting over session records
//!
//! Daily series for charting, cumulative totals and CSV export.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::Mode;
use crate::flashcards::SessionRecord;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StatsError>;

/// Sums of every record on one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub sets: u32,
    pub correct: u32,
    pub words: u32,
}

impl DailyTotals {
    pub fn percentage(&self) -> u32 {
        percentage(self.correct, self.words)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TotalStats {
    pub sets: u32,
    pub correct: u32,
    pub words: u32,
}

impl TotalStats {
    pub fn percentage(&self) -> u32 {
        percentage(self.correct, self.words)
    }
}

fn percentage(correct: u32, words: u32) -> u32 {
    if words == 0 {
        0
    } else {
        (f64::from(correct) / f64::from(words) * 100.0).round() as u32
    }
}

/// Per-date sums in ascending date order; `None` keeps every mode
pub fn dashboard_series(records: &[SessionRecord], mode: Option<Mode>) -> Vec<DailyTotals> {
    let mut by_date: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();

    for record in records.iter().filter(|r| mode.map_or(true, |m| r.mode == m)) {
        let day = by_date.entry(record.date).or_insert_with(|| DailyTotals {
            date: record.date,
            sets: 0,
            correct: 0,
            words: 0,
        });
        day.sets += record.sets;
        day.correct += record.correct;
        day.words += record.words;
    }

    by_date.into_values().collect()
}

pub fn total_stats(records: &[SessionRecord], mode: Option<Mode>) -> TotalStats {
    dashboard_series(records, mode)
        .iter()
        .fold(TotalStats::default(), |acc, day| TotalStats {
            sets: acc.sets + day.sets,
            correct: acc.correct + day.correct,
            words: acc.words + day.words,
        })
}

/// Write `date,mode,sets,correct,words` rows in stored order
pub fn export_csv<W: Write>(records: &[SessionRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["date", "mode", "sets", "correct", "words"])?;

    for record in records {
        csv_writer.write_record([
            record.date.format("%Y-%m-%d").to_string(),
            record.mode.as_str().to_string(),
            record.sets.to_string(),
            record.correct.to_string(),
            record.words.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, mode: Mode, sets: u32, correct: u32, words: u32) -> SessionRecord {
        SessionRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            mode,
            sets,
            correct,
            words,
        }
    }

    fn sample() -> Vec<SessionRecord> {
        vec![
            record("2024-06-02", Mode::Chunk, 2, 8, 10),
            record("2024-06-01", Mode::Cvc, 1, 3, 4),
            record("2024-06-02", Mode::Cvc, 1, 4, 4),
        ]
    }

    #[test]
    fn test_series_groups_and_sorts_by_date() {
        let series = dashboard_series(&sample(), None);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date.to_string(), "2024-06-01");
        assert_eq!(series[1].sets, 3);
        assert_eq!(series[1].correct, 12);
        assert_eq!(series[1].words, 14);
    }

    #[test]
    fn test_series_mode_filter() {
        let series = dashboard_series(&sample(), Some(Mode::Chunk));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].percentage(), 80);
        assert!(dashboard_series(&sample(), Some(Mode::Sentence)).is_empty());
    }

    #[test]
    fn test_total_stats() {
        let totals = total_stats(&sample(), None);
        assert_eq!(totals, TotalStats { sets: 4, correct: 15, words: 18 });
        assert_eq!(totals.percentage(), 83);
        assert_eq!(total_stats(&[], None).percentage(), 0);
    }

    #[test]
    fn test_export_csv_keeps_stored_order() {
        let mut out = Vec::new();
        export_csv(&sample(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,mode,sets,correct,words");
        assert_eq!(lines[1], "2024-06-02,chunk,2,8,10");
        assert_eq!(lines[2], "2024-06-01,cvc,1,3,4");
        assert_eq!(lines.len(), 4);
    }
}
