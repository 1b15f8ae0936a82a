use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::SessionError;

/// Pause between hiding the set and asking for recall
pub const DEFAULT_FLASH_GRACE: Duration = Duration::from_millis(300);

/// One-second countdown for the flash phase, followed by the grace delay
pub struct FlashCountdown {
    seconds: u32,
    grace: Duration,
    token: CancellationToken,
}

impl FlashCountdown {
    pub fn new(seconds: u32, grace: Duration, token: CancellationToken) -> Self {
        Self { seconds, grace, token }
    }

    /// Run to completion, calling `on_tick` with the seconds left (last call is 0).
    ///
    /// Returns `SessionError::Cancelled` as soon as the token fires, without
    /// any further tick.
    pub async fn run<F: FnMut(u32)>(&self, mut on_tick: F) -> Result<(), SessionError> {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        // The first tick completes immediately
        interval.tick().await;

        for remaining in (1..=self.seconds).rev() {
            on_tick(remaining);
            tokio::select! {
                _ = self.token.cancelled() => return Err(SessionError::Cancelled),
                _ = interval.tick() => {}
            }
        }
        on_tick(0);

        tokio::select! {
            _ = self.token.cancelled() => Err(SessionError::Cancelled),
            _ = tokio::time::sleep(self.grace) => Ok(()),
        }
    }
}
