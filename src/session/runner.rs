use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::catalog::{Mode, WordSet};
use crate::flashcards::{ReviewState, SchedulingPolicy, SessionRecord};

use super::timer::{FlashCountdown, DEFAULT_FLASH_GRACE};
use super::{Result, SessionError};

/// Minimum number of items a set needs to be drilled
pub const MIN_SET_ITEMS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Upcoming set is shown, waiting for the user to start
    Ready,
    /// Set is on screen for the flash duration
    Flash,
    /// Waiting for the self-reported count
    Recall,
    /// Round graded, waiting for next/finish
    Result,
    Summary,
    Exited,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Ready => "ready",
            Phase::Flash => "flash",
            Phase::Recall => "recall",
            Phase::Result => "result",
            Phase::Summary => "summary",
            Phase::Exited => "exited",
        };
        f.write_str(label)
    }
}

/// Outcome of one graded round
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub set_id: String,
    pub mode: Mode,
    pub correct: u32,
    pub total: u32,
}

/// What grading the current set produced
#[derive(Debug, Clone, PartialEq)]
pub struct GradeOutcome {
    pub set_id: String,
    pub review_state: ReviewState,
    pub percentage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeBand {
    Perfect,
    Great,
    Good,
    Retry,
}

impl GradeBand {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            100.. => GradeBand::Perfect,
            80..=99 => GradeBand::Great,
            60..=79 => GradeBand::Good,
            _ => GradeBand::Retry,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            GradeBand::Perfect => "Perfect!",
            GradeBand::Great => "Great job!",
            GradeBand::Good => "Good effort!",
            GradeBand::Retry => "Let's try again!",
        }
    }
}

/// Totals of a finished session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub results: Vec<RoundResult>,
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
    pub grade: GradeBand,
    /// One record per mode, in first-studied order
    pub records: Vec<SessionRecord>,
}

impl SessionSummary {
    pub fn from_results(results: Vec<RoundResult>, today: NaiveDate) -> Self {
        let correct = results.iter().map(|r| r.correct).sum();
        let total = results.iter().map(|r| r.total).sum();
        let percentage = percentage(correct, total);

        let mut records: Vec<SessionRecord> = Vec::new();
        for result in &results {
            match records.iter_mut().find(|r| r.mode == result.mode) {
                Some(record) => {
                    record.sets += 1;
                    record.correct += result.correct;
                    record.words += result.total;
                }
                None => records.push(SessionRecord {
                    date: today,
                    mode: result.mode,
                    sets: 1,
                    correct: result.correct,
                    words: result.total,
                }),
            }
        }

        Self {
            results,
            correct,
            total,
            percentage,
            grade: GradeBand::from_percentage(percentage),
            records,
        }
    }
}

/// Result of moving past a graded round
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Next(WordSet),
    Complete(SessionSummary),
}

fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(correct) / f64::from(total) * 100.0).round() as u32
}

/// Walks a queue of sets through ready, flash, recall and result.
///
/// The runner owns the flash countdown; exiting or dropping it cancels a
/// countdown that is still running.
pub struct SessionRunner {
    queue: Vec<WordSet>,
    index: usize,
    phase: Phase,
    results: Vec<RoundResult>,
    flash_seconds: u32,
    grace: Duration,
    token: CancellationToken,
}

impl SessionRunner {
    /// Start a session, refusing an empty queue or a set that is too small
    pub fn start(queue: Vec<WordSet>, flash_seconds: u32) -> Result<Self> {
        if queue.is_empty() {
            return Err(SessionError::EmptyPool);
        }
        if let Some(set) = queue.iter().find(|s| s.items.len() < MIN_SET_ITEMS) {
            return Err(SessionError::SetTooSmall {
                id: set.id.clone(),
                items: set.items.len(),
            });
        }

        log::info!("Session: started with {} sets", queue.len());
        Ok(Self {
            queue,
            index: 0,
            phase: Phase::Ready,
            results: Vec::new(),
            flash_seconds: flash_seconds.max(1),
            grace: DEFAULT_FLASH_GRACE,
            token: CancellationToken::new(),
        })
    }

    pub fn with_flash_seconds(mut self, seconds: u32) -> Self {
        self.flash_seconds = seconds.max(1);
        self
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current(&self) -> Option<&WordSet> {
        match self.phase {
            Phase::Summary | Phase::Exited => None,
            _ => self.queue.get(self.index),
        }
    }

    /// 1-based position of the current set and the queue length
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, self.queue.len())
    }

    pub fn results(&self) -> &[RoundResult] {
        &self.results
    }

    pub fn flash_seconds(&self) -> u32 {
        self.flash_seconds
    }

    /// Token that aborts the running countdown and ends the session
    pub fn cancellation(&self) -> CancellationToken {
        self.token.clone()
    }

    fn expect_phase(&self, expected: Phase) -> Result<()> {
        if self.phase != expected {
            return Err(SessionError::InvalidPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    /// Show the current set for the flash duration, then move to recall
    pub async fn run_flash<F: FnMut(u32)>(&mut self, on_tick: F) -> Result<()> {
        self.expect_phase(Phase::Ready)?;
        self.phase = Phase::Flash;

        let countdown = FlashCountdown::new(self.flash_seconds, self.grace, self.token.child_token());
        match countdown.run(on_tick).await {
            Ok(()) => {
                self.phase = Phase::Recall;
                Ok(())
            }
            Err(e) => {
                self.phase = Phase::Exited;
                log::info!("Session: flash cancelled, session exited");
                Err(e)
            }
        }
    }

    /// Grade the current set with the self-reported recall count
    pub fn submit_score(
        &mut self,
        count: u32,
        policy: &dyn SchedulingPolicy,
        prev: Option<&ReviewState>,
        now: DateTime<Utc>,
    ) -> Result<GradeOutcome> {
        self.expect_phase(Phase::Recall)?;
        let set = self
            .queue
            .get(self.index)
            .ok_or(SessionError::InvalidPhase {
                expected: Phase::Recall,
                actual: Phase::Summary,
            })?;

        let total = set.items.len() as u32;
        if count > total {
            return Err(SessionError::ScoreOutOfRange { count, max: total });
        }

        let review_state = policy.grade(prev, count, total, now);
        self.results.push(RoundResult {
            set_id: set.id.clone(),
            mode: set.mode,
            correct: count,
            total,
        });
        self.phase = Phase::Result;
        log::debug!("Session: graded {} with {}/{}", set.id, count, total);

        Ok(GradeOutcome {
            set_id: set.id.clone(),
            review_state,
            percentage: percentage(count, total),
        })
    }

    /// Move to the next set, or finish and summarise the session
    pub fn advance(&mut self, today: NaiveDate) -> Result<Advance> {
        self.expect_phase(Phase::Result)?;

        if self.index + 1 < self.queue.len() {
            self.index += 1;
            self.phase = Phase::Ready;
            return Ok(Advance::Next(self.queue[self.index].clone()));
        }
        Ok(Advance::Complete(self.finish(today)))
    }

    /// End the session after the current round; remaining sets are skipped
    pub fn finish_early(&mut self, today: NaiveDate) -> Result<SessionSummary> {
        self.expect_phase(Phase::Result)?;
        Ok(self.finish(today))
    }

    fn finish(&mut self, today: NaiveDate) -> SessionSummary {
        self.phase = Phase::Summary;
        self.token.cancel();
        let summary = SessionSummary::from_results(self.results.clone(), today);
        log::info!(
            "Session: finished {}/{} ({}%)",
            summary.correct,
            summary.total,
            summary.percentage
        );
        summary
    }

    /// Abandon the session; rounds already graded stay graded
    pub fn exit(&mut self) {
        self.token.cancel();
        if self.phase != Phase::Summary {
            self.phase = Phase::Exited;
        }
    }
}

impl Drop for SessionRunner {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Owner;
    use crate::flashcards::LevelPolicy;
    use chrono::TimeZone;

    fn set(id: &str, mode: Mode, items: usize) -> WordSet {
        WordSet::new(
            id.to_string(),
            mode,
            Owner::Shared,
            id.to_string(),
            2,
            (0..items).map(|i| format!("w{}", i)).collect(),
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

    #[test]
    fn test_start_refuses_invalid_queues() {
        assert!(matches!(SessionRunner::start(Vec::new(), 3), Err(SessionError::EmptyPool)));
        let result = SessionRunner::start(vec![set("a", Mode::Chunk, 5), set("b", Mode::Chunk, 1)], 3);
        assert!(matches!(result, Err(SessionError::SetTooSmall { items: 1, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_session_flow() {
        let mut runner = SessionRunner::start(vec![set("a", Mode::Chunk, 5), set("b", Mode::Cvc, 4)], 1).unwrap();
        let policy = LevelPolicy;

        runner.run_flash(|_| {}).await.unwrap();
        assert_eq!(runner.phase(), Phase::Recall);
        let outcome = runner.submit_score(5, &policy, None, now()).unwrap();
        assert_eq!(outcome.percentage, 100);
        assert_eq!(outcome.review_state.level, 1);

        let next = runner.advance(today()).unwrap();
        assert!(matches!(next, Advance::Next(ref s) if s.id == "b"));

        runner.run_flash(|_| {}).await.unwrap();
        let outcome = runner.submit_score(2, &policy, None, now()).unwrap();
        assert_eq!(outcome.percentage, 50);

        let Advance::Complete(summary) = runner.advance(today()).unwrap() else {
            panic!("expected the session to complete");
        };
        assert_eq!(runner.phase(), Phase::Summary);
        assert_eq!(summary.correct, 7);
        assert_eq!(summary.total, 9);
        assert_eq!(summary.percentage, 78);
        assert_eq!(summary.grade, GradeBand::Good);
        assert_eq!(summary.records.len(), 2);
        assert_eq!(summary.records[0].mode, Mode::Chunk);
        assert_eq!(summary.records[0].date, today());
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_order_is_enforced() {
        let mut runner = SessionRunner::start(vec![set("a", Mode::Chunk, 3)], 1).unwrap();
        let err = runner.submit_score(1, &LevelPolicy, None, now()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidPhase {
                expected: Phase::Recall,
                actual: Phase::Ready
            }
        ));

        runner.run_flash(|_| {}).await.unwrap();
        assert!(matches!(
            runner.submit_score(4, &LevelPolicy, None, now()),
            Err(SessionError::ScoreOutOfRange { count: 4, max: 3 })
        ));
    }

    #[test]
    fn test_summary_aggregates_per_mode() {
        let results = vec![
            RoundResult { set_id: "a".into(), mode: Mode::Chunk, correct: 5, total: 5 },
            RoundResult { set_id: "b".into(), mode: Mode::Sentence, correct: 1, total: 4 },
            RoundResult { set_id: "c".into(), mode: Mode::Chunk, correct: 3, total: 5 },
        ];
        let summary = SessionSummary::from_results(results, today());

        assert_eq!(summary.records.len(), 2);
        assert_eq!(summary.records[0].sets, 2);
        assert_eq!(summary.records[0].correct, 8);
        assert_eq!(summary.records[0].words, 10);
        assert_eq!(summary.records[1].mode, Mode::Sentence);
    }

    #[test]
    fn test_grade_bands() {
        assert_eq!(GradeBand::from_percentage(100), GradeBand::Perfect);
        assert_eq!(GradeBand::from_percentage(80), GradeBand::Great);
        assert_eq!(GradeBand::from_percentage(60), GradeBand::Good);
        assert_eq!(GradeBand::from_percentage(59), GradeBand::Retry);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_cancels_flash() {
        let mut runner = SessionRunner::start(vec![set("a", Mode::Chunk, 3)], 3).unwrap();
        let token = runner.cancellation();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            token.cancel();
        });

        let mut ticks = Vec::new();
        let result = runner.run_flash(|left| ticks.push(left)).await;
        assert!(matches!(result, Err(SessionError::Cancelled)));
        assert_eq!(runner.phase(), Phase::Exited);
        assert_eq!(ticks, vec![3]);
        assert!(runner.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_keeps_graded_rounds() {
        let mut runner = SessionRunner::start(vec![set("a", Mode::Chunk, 3), set("b", Mode::Chunk, 3)], 1).unwrap();
        runner.run_flash(|_| {}).await.unwrap();
        runner.submit_score(3, &LevelPolicy, None, now()).unwrap();

        runner.exit();
        assert_eq!(runner.phase(), Phase::Exited);
        assert_eq!(runner.results().len(), 1);
        assert!(runner.advance(today()).is_err());
    }
}
