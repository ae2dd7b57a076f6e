use crate::model::{SleepState, MAX_STAT};
use serde::{Deserialize, Serialize};

/// Stat model: how fast each stat moves in each sleep state.
///
/// Every rate is written as the wall-clock period of a full 0..100 swing so
/// the numbers in `settings.json` read as "hours to empty" rather than tiny
/// per-second fractions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rates {
    pub fullness_drain_secs: f64,      // awake, 100 -> 0
    pub energy_drain_secs: f64,        // awake, 100 -> 0
    pub sleep_restore_secs: f64,       // asleep, 0 -> 100
    pub sleep_fullness_multiplier: f64, // fullness decay factor while asleep
    pub auto_wake_energy: f64,
    pub manual_wake_energy: f64,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            fullness_drain_secs: 6.0 * 3600.0,
            energy_drain_secs: 16.0 * 3600.0,
            sleep_restore_secs: 8.0 * 3600.0,
            sleep_fullness_multiplier: 0.3,
            // Below full so an exhausted pet is playable again before a whole night.
            auto_wake_energy: 10.0,
            manual_wake_energy: MAX_STAT,
        }
    }
}

impl Rates {
    /// Same model running `factor` times faster. Non-positive factors are ignored.
    pub fn scaled(self, factor: f64) -> Self {
        if !(factor.is_finite() && factor > 0.0) {
            return self;
        }
        Self {
            fullness_drain_secs: self.fullness_drain_secs / factor,
            energy_drain_secs: self.energy_drain_secs / factor,
            sleep_restore_secs: self.sleep_restore_secs / factor,
            ..self
        }
    }

    /// Signed fullness change per second.
    pub fn fullness_per_sec(&self, sleep: &SleepState) -> f64 {
        let base = -per_sec(self.fullness_drain_secs);
        if sleep.is_asleep() {
            base * self.sleep_fullness_multiplier
        } else {
            base
        }
    }

    /// Signed energy change per second.
    pub fn energy_per_sec(&self, sleep: &SleepState) -> f64 {
        if sleep.is_asleep() {
            per_sec(self.sleep_restore_secs)
        } else {
            -per_sec(self.energy_drain_secs)
        }
    }

    /// Energy at which the engine wakes a sleeping pet on its own.
    pub fn wake_threshold(&self, sleep: &SleepState) -> Option<f64> {
        match sleep {
            SleepState::Awake => None,
            SleepState::ManualSleep { .. } => Some(self.manual_wake_energy),
            SleepState::AutoSleep { .. } => Some(self.auto_wake_energy),
        }
    }
}

fn per_sec(period_secs: f64) -> f64 {
    if period_secs > 0.0 {
        MAX_STAT / period_secs
    } else {
        0.0
    }
}
