/// Client-side progress estimate for a running search
///
/// The server gives no progress reports, so the bar advances linearly
/// towards 95% over `limit × 1.5s` and waits there until the response
/// arrives. Only a real success takes it to 100%.
use std::time::Duration;

/// Assumed server time per requested image
pub const MS_PER_IMAGE: u64 = 1500;

/// How often the estimate advances
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// The estimate never goes past this on its own
pub const ESTIMATE_CEILING: f32 = 95.0;

/// Handle for the repeating tick
///
/// The tick subscription only exists while the estimator holds one of
/// these; dropping it is how the timer is stopped.
#[derive(Debug)]
pub struct Ticker {
    _private: (),
}

impl Drop for Ticker {
    fn drop(&mut self) {
        tracing::debug!("progress timer stopped");
    }
}

#[derive(Debug, Default)]
pub struct ProgressEstimator {
    value: f32,
    increment: f32,
    visible: bool,
    ticker: Option<Ticker>,
}

impl ProgressEstimator {
    /// Reset to 0%, show the bar and start ticking for `limit` images
    ///
    /// Any previous timer is replaced.
    pub fn start(&mut self, limit: u32) {
        self.value = 0.0;
        self.increment = increment_for(limit);
        self.visible = true;
        self.ticker = Some(Ticker { _private: () });
        tracing::debug!(limit, increment = self.increment, "progress timer started");
    }

    /// Advance by one step; ignored once the timer is gone
    pub fn tick(&mut self) {
        if self.ticker.is_none() {
            return;
        }
        if self.value < ESTIMATE_CEILING {
            self.value = (self.value + self.increment).min(ESTIMATE_CEILING);
        }
    }

    /// The search succeeded: stop the timer and jump to 100%
    pub fn complete(&mut self) {
        self.ticker = None;
        self.value = 100.0;
    }

    /// The search failed: stop the timer, drop to 0% and hide the bar
    pub fn fail(&mut self) {
        self.ticker = None;
        self.value = 0.0;
        self.visible = false;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Rounded value shown next to the bar
    pub fn percent(&self) -> u8 {
        self.value.round().clamp(0.0, 100.0) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.percent() == 100
    }
}

/// Per-tick step so that 95% is reached exactly at the estimated duration
pub fn increment_for(limit: u32) -> f32 {
    let estimated_ms = u64::from(limit.max(1)) * MS_PER_IMAGE;
    let ticks = estimated_ms as f64 / TICK_INTERVAL.as_millis() as f64;
    (f64::from(ESTIMATE_CEILING) / ticks) as f32
}
