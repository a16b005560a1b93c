//! Push-to-talk gesture timer.
//!
//! A radio needs a moment after the button goes down before it transmits.
//! The trainee presses, waits for the hold threshold, then releases to
//! "speak". Releasing early cuts the message off and counts as a mistake.
//!
//! Only one gesture is ever live; pressing again restarts it.

use chrono::{DateTime, Duration, Utc};

/// Default hold threshold before the line is open.
pub const DEFAULT_HOLD_MS: i64 = 1_200;

/// Reason reported when the button is released before the line opened.
pub const SPOKE_TOO_SOON: &str = "You spoke too soon! The start of the message was cut off.";

/// Result of one press-and-release, fed to the quiz scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureOutcome {
    Success,
    Failure { reason: String },
}

impl GestureOutcome {
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Holding,
    Ready,
}

#[derive(Debug, Clone)]
pub struct PttGesture {
    hold: Duration,
    pressed_at: Option<DateTime<Utc>>,
}

impl Default for PttGesture {
    fn default() -> Self {
        Self::new()
    }
}

impl PttGesture {
    #[must_use]
    pub fn new() -> Self {
        Self::with_hold(Duration::milliseconds(DEFAULT_HOLD_MS))
    }

    /// Negative thresholds are treated as zero.
    #[must_use]
    pub fn with_hold(hold: Duration) -> Self {
        Self {
            hold: hold.max(Duration::zero()),
            pressed_at: None,
        }
    }

    #[must_use]
    pub fn hold(&self) -> Duration {
        self.hold
    }

    /// Button down. Restarts the countdown if already held.
    pub fn press(&mut self, at: DateTime<Utc>) {
        self.pressed_at = Some(at);
    }

    #[must_use]
    pub fn phase(&self, now: DateTime<Utc>) -> GesturePhase {
        match self.pressed_at {
            None => GesturePhase::Idle,
            Some(start) if now - start >= self.hold => GesturePhase::Ready,
            Some(_) => GesturePhase::Holding,
        }
    }

    #[must_use]
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.phase(now) == GesturePhase::Ready
    }

    /// Countdown progress in `[0, 100]`; 0 while idle.
    #[must_use]
    pub fn progress_percent(&self, now: DateTime<Utc>) -> f64 {
        let Some(start) = self.pressed_at else {
            return 0.0;
        };
        let hold_ms = self.hold.num_milliseconds();
        if hold_ms <= 0 {
            return 100.0;
        }
        let elapsed = (now - start).num_milliseconds().max(0);
        #[allow(clippy::cast_precision_loss)]
        let pct = elapsed as f64 / hold_ms as f64 * 100.0;
        pct.min(100.0)
    }

    /// Button up. Resolves the gesture; `None` if nothing was held.
    pub fn release(&mut self, at: DateTime<Utc>) -> Option<GestureOutcome> {
        let ready = self.is_ready(at);
        self.pressed_at.take()?;
        Some(if ready {
            GestureOutcome::Success
        } else {
            GestureOutcome::failure(SPOKE_TOO_SOON)
        })
    }

    /// Pointer slid off the button. Resolves exactly like a release.
    pub fn abort(&mut self, at: DateTime<Utc>) -> Option<GestureOutcome> {
        self.release(at)
    }

    /// Drop a live gesture without resolving it (the question went away).
    pub fn cancel(&mut self) {
        self.pressed_at = None;
    }
}
