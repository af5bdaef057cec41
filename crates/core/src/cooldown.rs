//! Client-side re-enable timer for OTP resend buttons.

use std::time::{Duration, Instant};

/// How long the resend button stays disabled after a send.
pub const OTP_RESEND_COOLDOWN: Duration = Duration::from_secs(60);

/// A fixed cooldown started by each send. Callers pass the current instant so
/// the timer is deterministic under test.
#[derive(Debug, Clone)]
pub struct ResendCooldown {
    duration: Duration,
    started_at: Option<Instant>,
}

impl Default for ResendCooldown {
    fn default() -> Self {
        Self::new(OTP_RESEND_COOLDOWN)
    }
}

impl ResendCooldown {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started_at: None,
        }
    }

    /// Record a send at `now`.
    pub fn trigger(&mut self, now: Instant) {
        self.started_at = Some(now);
    }

    /// Time left before another send is allowed.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.started_at {
            Some(start) => self.duration.saturating_sub(now.saturating_duration_since(start)),
            None => Duration::ZERO,
        }
    }

    pub fn can_resend(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }
}
