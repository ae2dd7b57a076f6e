//! "Stat has been at 0% since T" markers, derived while the engine integrates.

use crate::model::{clamp_stat, PetState, MIN_STAT};
use crate::sim::{plus_micros, secs_to_micros};
use chrono::{DateTime, Utc};

/// Moves fullness across one constant-rate segment and records the instant it
/// first touches the floor. Returns the new (clamped) fullness.
pub(crate) fn step_fullness(
    marker: &mut Option<DateTime<Utc>>,
    value: f64,
    rate_per_sec: f64,
    seg_start: DateTime<Utc>,
    seg_us: i64,
) -> f64 {
    if value > MIN_STAT && rate_per_sec < 0.0 {
        let hit_us = secs_to_micros(value / -rate_per_sec);
        if hit_us <= seg_us {
            if marker.is_none() {
                *marker = Some(plus_micros(seg_start, hit_us));
            }
            return MIN_STAT;
        }
    }
    clamp_stat(value + rate_per_sec * seg_us as f64 / 1e6)
}

/// Reconciles both markers with the final stats once integration is done.
pub(crate) fn settle(state: &mut PetState, at: DateTime<Utc>) {
    if state.fullness > MIN_STAT {
        state.fullness_zero_since = None;
    } else if state.fullness_zero_since.is_none() {
        state.fullness_zero_since = Some(at);
    }

    // Energy markers only mean something while awake; sleep keeps the one
    // set when the pet collapsed until it wakes.
    if !state.sleep.is_asleep() {
        if state.energy > MIN_STAT {
            state.energy_zero_since = None;
        } else if state.energy_zero_since.is_none() {
            state.energy_zero_since = Some(at);
        }
    }
}
