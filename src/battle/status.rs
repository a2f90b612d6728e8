//! Transient status effects (stun, slow)
//!
//! Each condition has its own countdown. A stun and a slow can overlap and
//! expire independently.

use serde::Serialize;

/// What changed while decaying status timers this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusExpiry {
    pub stun_expired: bool,
    pub slow_expired: bool,
}

/// Per-unit transient conditions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusState {
    pub stunned: bool,
    pub stun_timer: f32,
    /// Movement speed multiplier; 1.0 when not slowed.
    pub slow_factor: f32,
    pub slow_timer: f32,
}

impl Default for StatusState {
    fn default() -> Self {
        Self {
            stunned: false,
            stun_timer: 0.0,
            slow_factor: 1.0,
            slow_timer: 0.0,
        }
    }
}

impl StatusState {
    /// Stun for `duration` seconds. Re-stunning refreshes the timer to the longer value.
    pub fn apply_stun(&mut self, duration: f32) {
        self.stunned = true;
        self.stun_timer = self.stun_timer.max(duration);
    }

    /// Slow to `factor` of normal speed for `duration` seconds.
    /// The newest slow replaces any previous one.
    pub fn apply_slow(&mut self, factor: f32, duration: f32) {
        self.slow_factor = factor.clamp(0.0, 1.0);
        self.slow_timer = duration;
    }

    pub fn is_slowed(&self) -> bool {
        self.slow_factor < 1.0
    }

    /// Count down both timers by `dt`, clearing whichever reaches zero.
    pub fn decay(&mut self, dt: f32) -> StatusExpiry {
        let mut expiry = StatusExpiry::default();

        if self.stunned {
            self.stun_timer -= dt;
            if self.stun_timer <= 0.0 {
                self.stun_timer = 0.0;
                self.stunned = false;
                expiry.stun_expired = true;
            }
        }

        if self.is_slowed() {
            self.slow_timer -= dt;
            if self.slow_timer <= 0.0 {
                self.slow_timer = 0.0;
                self.slow_factor = 1.0;
                expiry.slow_expired = true;
            }
        }

        expiry
    }
}
