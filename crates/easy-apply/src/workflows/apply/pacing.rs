use std::time::Duration;

use rand::Rng;
use tokio::time::{sleep, Instant};

use super::operator::{OperatorConsole, OperatorSignal};

/// Inclusive range a randomized delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange::fixed(Duration::ZERO);

    pub const fn fixed(delay: Duration) -> Self {
        Self {
            min: delay,
            max: delay,
        }
    }

    pub const fn between(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub const fn millis(min: u64, max: u64) -> Self {
        Self::between(Duration::from_millis(min), Duration::from_millis(max))
    }

    pub fn sample<R>(&self, rng: &mut R) -> Duration
    where
        R: Rng + ?Sized,
    {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

/// Every wait, poll, and jittered pause the session uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    pub element_timeout: Duration,
    pub results_timeout: Duration,
    pub form_timeout: Duration,
    pub poll_interval: Duration,
    pub after_navigation: DelayRange,
    pub premium_return: Duration,
    pub reload_settle: DelayRange,
    pub retry_backoff: DelayRange,
    pub page_settle: DelayRange,
    pub scroll_settle: Duration,
    pub scroll_step_pause: DelayRange,
    pub step_pause: DelayRange,
    pub after_next: DelayRange,
    pub discard_pause: DelayRange,
    pub description_expand: Duration,
    pub page_wait: DelayRange,
    pub operator_prompt_window: Duration,
    pub login_check: Duration,
    pub login_timeout: Duration,
    pub security_check: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            element_timeout: Duration::from_secs(10),
            results_timeout: Duration::from_secs(20),
            form_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
            after_navigation: DelayRange::millis(3_000, 5_000),
            premium_return: Duration::from_secs(2),
            reload_settle: DelayRange::millis(3_000, 5_000),
            retry_backoff: DelayRange::millis(2_000, 5_000),
            page_settle: DelayRange::millis(2_000, 4_000),
            scroll_settle: Duration::from_secs(2),
            scroll_step_pause: DelayRange::millis(600, 1_500),
            step_pause: DelayRange::millis(1_500, 2_500),
            after_next: DelayRange::millis(3_000, 5_000),
            discard_pause: DelayRange::millis(3_000, 5_000),
            description_expand: Duration::from_secs(2),
            page_wait: DelayRange::millis(15_000, 60_000),
            operator_prompt_window: Duration::from_secs(60),
            login_check: Duration::from_secs(3),
            login_timeout: Duration::from_secs(60),
            security_check: Duration::from_secs(300),
        }
    }
}

impl Timings {
    /// No sleeping and single-shot polling.
    pub fn instant() -> Self {
        Self {
            element_timeout: Duration::ZERO,
            results_timeout: Duration::ZERO,
            form_timeout: Duration::ZERO,
            poll_interval: Duration::ZERO,
            after_navigation: DelayRange::ZERO,
            premium_return: Duration::ZERO,
            reload_settle: DelayRange::ZERO,
            retry_backoff: DelayRange::ZERO,
            page_settle: DelayRange::ZERO,
            scroll_settle: Duration::ZERO,
            scroll_step_pause: DelayRange::ZERO,
            step_pause: DelayRange::ZERO,
            after_next: DelayRange::ZERO,
            discard_pause: DelayRange::ZERO,
            description_expand: Duration::ZERO,
            page_wait: DelayRange::ZERO,
            operator_prompt_window: Duration::ZERO,
            login_check: Duration::ZERO,
            login_timeout: Duration::ZERO,
            security_check: Duration::ZERO,
        }
    }
}

pub async fn pause<R>(range: DelayRange, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let delay = range.sample(rng);
    settle(delay).await;
}

pub async fn settle(delay: Duration) {
    if !delay.is_zero() {
        sleep(delay).await;
    }
}

/// Random wait between result pages; the operator may skip it by answering
/// `y` within the prompt window. Returns whether the wait was skipped.
pub async fn wait_between_pages<O, R>(operator: &O, timings: &Timings, rng: &mut R) -> bool
where
    O: OperatorConsole + ?Sized,
    R: Rng + ?Sized,
{
    let wait = timings.page_wait.sample(rng);
    if wait.is_zero() {
        return false;
    }

    let window = wait.min(timings.operator_prompt_window);
    let started = Instant::now();
    let prompt = format!(
        "Sleeping for {:.0} seconds. Press 'y' to skip waiting (prompt closes in {} seconds): ",
        wait.as_secs_f64(),
        window.as_secs()
    );

    match operator.await_signal(&prompt, Some(window)).await {
        Some(OperatorSignal::Skip) => {
            tracing::info!("operator skipped the wait between pages");
            true
        }
        _ => {
            let remaining = wait.saturating_sub(started.elapsed());
            tracing::debug!(?remaining, "waiting before the next page");
            settle(remaining).await;
            false
        }
    }
}
