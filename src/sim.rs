//! Time-integration engine.
//!
//! Stats move linearly inside a sleep state, so instead of ticking through an
//! absence second by second the engine splits the elapsed window at the
//! instants where the sleep state changes (exhaustion, or recovering enough
//! energy to wake) and integrates each piece in closed form.
//!
//! Time is carried as whole microseconds so a crossing instant computed from
//! the rates compares exactly against the window it falls in.

use crate::model::{clamp_stat, PetState, SleepState, MIN_STAT};
use crate::rules::Rates;
use crate::zero_floor;
use chrono::{DateTime, Duration, Utc};

/// Only the most recent events are kept for the recap.
const MAX_EVENTS: usize = 16;

/// Crossings handled one by one per call. Whole exhausted/rested cycles are
/// folded in closed form, so a window needs a handful of crossings at most.
const MAX_SEGMENTS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimEvent {
    FellAsleep { at: DateTime<Utc> },
    WokeUp { at: DateTime<Utc> },
    Starving { since: DateTime<Utc> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Advanced {
    pub state: PetState,
    pub events: Vec<SimEvent>,
}

#[derive(Clone, Copy, Debug)]
enum Boundary {
    Exhausted,
    Rested { threshold: f64 },
}

/// Brings `state` forward to `now`. A `now` earlier than the last update is
/// treated as no time passing.
pub fn advance(state: &PetState, now: DateTime<Utc>, rates: &Rates) -> PetState {
    advance_with_events(state, now, rates).state
}

pub fn advance_with_events(state: &PetState, now: DateTime<Utc>, rates: &Rates) -> Advanced {
    let mut st = state.clone();
    let mut events = Vec::new();

    let elapsed = micros_between(st.last_update_at, now);
    if elapsed <= 0 {
        return Advanced { state: st, events };
    }

    let mut cursor = st.last_update_at;
    let mut remaining = elapsed;
    let mut segments = 0;

    while remaining > 0 {
        if let Some(cycle) = Cycle::at(&st, rates) {
            let skipped = cycle.fold(&mut st, cursor, remaining, &mut events);
            cursor = plus_micros(cursor, skipped);
            remaining -= skipped;
        }

        segments += 1;
        let crossing = next_boundary(&st, rates).filter(|&(dt, _)| dt <= remaining);

        match crossing {
            Some((dt, boundary)) if segments < MAX_SEGMENTS => {
                integrate(&mut st, rates, cursor, dt, &mut events);
                cursor = plus_micros(cursor, dt);
                remaining -= dt;
                cross(&mut st, boundary, cursor, &mut events);
            }
            _ => {
                if crossing.is_some() {
                    tracing::warn!(
                        segments,
                        remaining,
                        "segment cap reached, finishing window flat"
                    );
                }
                integrate(&mut st, rates, cursor, remaining, &mut events);
                cursor = plus_micros(cursor, remaining);
                remaining = 0;
            }
        }
    }

    zero_floor::settle(&mut st, cursor);
    st.last_update_at = now;

    Advanced { state: st, events }
}

/// One exhausted/rested round trip: awake from the auto-wake energy down to
/// 0, then auto-asleep back up to it. Every round trip from that point takes
/// the same microseconds and costs the same fullness.
#[derive(Clone, Copy, Debug)]
struct Cycle {
    awake_us: i64,
    asleep_us: i64,
    awake_fullness_rate: f64,
    asleep_fullness_rate: f64,
}

impl Cycle {
    /// Only an awake pet sitting exactly on the auto-wake energy starts a
    /// cycle; that is where every rested crossing leaves it.
    fn at(st: &PetState, rates: &Rates) -> Option<Self> {
        let threshold = clamp_stat(rates.auto_wake_energy);
        if st.sleep != SleepState::Awake || st.energy != threshold || threshold <= MIN_STAT {
            return None;
        }
        let asleep = SleepState::AutoSleep {
            since: st.last_update_at,
        };
        let drain = -rates.energy_per_sec(&SleepState::Awake);
        let restore = rates.energy_per_sec(&asleep);
        if drain <= 0.0 || restore <= 0.0 {
            return None;
        }
        // must match the arithmetic in next_boundary
        let awake_us = secs_to_micros(threshold / drain);
        let asleep_us = secs_to_micros((threshold - MIN_STAT) / restore);
        if awake_us.saturating_add(asleep_us) <= 0 {
            return None;
        }
        Some(Self {
            awake_us,
            asleep_us,
            awake_fullness_rate: rates.fullness_per_sec(&SleepState::Awake),
            asleep_fullness_rate: rates.fullness_per_sec(&asleep),
        })
    }

    fn len_us(&self) -> i64 {
        self.awake_us + self.asleep_us
    }

    fn fullness_cost(&self) -> f64 {
        -(self.awake_fullness_rate * self.awake_us as f64
            + self.asleep_fullness_rate * self.asleep_us as f64)
            / 1e6
    }

    /// Applies as many whole cycles as fit in `remaining` without fullness
    /// reaching the floor inside them, and returns the microseconds consumed.
    /// The state ends where it started, awake on the auto-wake energy.
    fn fold(
        &self,
        st: &mut PetState,
        start: DateTime<Utc>,
        remaining: i64,
        events: &mut Vec<SimEvent>,
    ) -> i64 {
        let mut cycles = remaining / self.len_us();
        let cost = self.fullness_cost();
        if st.fullness > MIN_STAT && cost > 0.0 {
            // the cycle where fullness runs out goes through the crossing loop
            let safe = ((st.fullness / cost).ceil() - 2.0).max(0.0);
            cycles = cycles.min(safe as i64);
        }
        if cycles == 0 {
            return 0;
        }

        if st.fullness > MIN_STAT {
            st.fullness = clamp_stat(st.fullness - cost * cycles as f64);
        }
        let first_recorded = cycles.saturating_sub((MAX_EVENTS / 2) as i64);
        for i in first_recorded..cycles {
            let begin = plus_micros(start, i * self.len_us());
            record(
                events,
                SimEvent::FellAsleep {
                    at: plus_micros(begin, self.awake_us),
                },
            );
            record(
                events,
                SimEvent::WokeUp {
                    at: plus_micros(begin, self.len_us()),
                },
            );
        }
        tracing::debug!(cycles, fullness = st.fullness, "folded whole sleep cycles");
        cycles * self.len_us()
    }
}

fn record(events: &mut Vec<SimEvent>, ev: SimEvent) {
    if events.len() == MAX_EVENTS {
        events.remove(0);
    }
    events.push(ev);
}

/// Microseconds until the current sleep state ends on its own, if it does.
/// Only strict crossings count: a stat already sitting on the threshold
/// never triggers.
fn next_boundary(st: &PetState, rates: &Rates) -> Option<(i64, Boundary)> {
    let energy_rate = rates.energy_per_sec(&st.sleep);
    match st.sleep {
        SleepState::Awake => {
            if st.energy > MIN_STAT && energy_rate < 0.0 {
                Some((secs_to_micros(st.energy / -energy_rate), Boundary::Exhausted))
            } else {
                None
            }
        }
        SleepState::ManualSleep { .. } | SleepState::AutoSleep { .. } => {
            let threshold = clamp_stat(rates.wake_threshold(&st.sleep)?);
            if st.energy < threshold && energy_rate > 0.0 {
                let dt = secs_to_micros((threshold - st.energy) / energy_rate);
                Some((dt, Boundary::Rested { threshold }))
            } else {
                None
            }
        }
    }
}

fn integrate(
    st: &mut PetState,
    rates: &Rates,
    seg_start: DateTime<Utc>,
    dt: i64,
    events: &mut Vec<SimEvent>,
) {
    let had_marker = st.fullness_zero_since.is_some();
    st.fullness = zero_floor::step_fullness(
        &mut st.fullness_zero_since,
        st.fullness,
        rates.fullness_per_sec(&st.sleep),
        seg_start,
        dt,
    );
    if let (false, Some(since)) = (had_marker, st.fullness_zero_since) {
        record(events, SimEvent::Starving { since });
    }

    let secs = dt as f64 / 1e6;
    st.energy = clamp_stat(st.energy + rates.energy_per_sec(&st.sleep) * secs);
}

fn cross(st: &mut PetState, boundary: Boundary, at: DateTime<Utc>, events: &mut Vec<SimEvent>) {
    match boundary {
        Boundary::Exhausted => {
            st.energy = MIN_STAT;
            st.energy_zero_since = Some(at);
            st.sleep = SleepState::AutoSleep { since: at };
            tracing::debug!(%at, fullness = st.fullness, "energy exhausted, auto sleep");
            record(events, SimEvent::FellAsleep { at });
        }
        Boundary::Rested { threshold } => {
            st.energy = threshold;
            st.energy_zero_since = None;
            st.sleep = SleepState::Awake;
            tracing::debug!(%at, energy = threshold, "rested, waking");
            record(events, SimEvent::WokeUp { at });
        }
    }
}

pub(crate) fn micros_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from)
        .num_microseconds()
        .unwrap_or(if to > from { i64::MAX } else { i64::MIN })
}

/// Rounds to whole microseconds; negative and NaN inputs become 0.
pub(crate) fn secs_to_micros(secs: f64) -> i64 {
    (secs * 1e6).round().max(0.0) as i64
}

pub(crate) fn plus_micros(t: DateTime<Utc>, us: i64) -> DateTime<Utc> {
    t.checked_add_signed(Duration::microseconds(us))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
