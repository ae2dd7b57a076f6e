use chrono::{DateTime, NaiveDate, Utc};

pub const MIN_STAT: f64 = 0.0;
pub const MAX_STAT: f64 = 100.0;

pub const DEFAULT_FULLNESS: f64 = 20.0;
pub const DEFAULT_ENERGY: f64 = 20.0;

pub const NAME_MAX: usize = 50;

#[derive(Clone, Copy, Debug)]
pub struct Food {
    pub name: &'static str,
    pub fill: f64,
}

pub const FOODS: [Food; 3] = [
    Food {
        name: "Rice ball",
        fill: 20.0,
    },
    Food {
        name: "Tomato",
        fill: 15.0,
    },
    Food {
        name: "Candy",
        fill: 5.0,
    },
];

/// Sleep state machine. The sleeping variants carry the instant the sleep began.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SleepState {
    Awake,
    /// Put to bed by the owner.
    ManualSleep { since: DateTime<Utc> },
    /// Collapsed from exhaustion.
    AutoSleep { since: DateTime<Utc> },
}

impl SleepState {
    pub fn is_asleep(&self) -> bool {
        !matches!(self, SleepState::Awake)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match *self {
            SleepState::Awake => None,
            SleepState::ManualSleep { since } | SleepState::AutoSleep { since } => Some(since),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SleepState::Awake => "Awake",
            SleepState::ManualSleep { .. } => "Sleeping",
            SleepState::AutoSleep { .. } => "Sleeping (exhausted)",
        }
    }
}

/// Everything the time-integration engine reads and writes.
#[derive(Clone, Debug, PartialEq)]
pub struct PetState {
    pub fullness: f64,
    pub energy: f64,
    pub sleep: SleepState,
    pub last_update_at: DateTime<Utc>,
    pub fullness_zero_since: Option<DateTime<Utc>>,
    pub energy_zero_since: Option<DateTime<Utc>>,
}

impl PetState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            fullness: DEFAULT_FULLNESS,
            energy: DEFAULT_ENERGY,
            sleep: SleepState::Awake,
            last_update_at: now,
            fullness_zero_since: None,
            energy_zero_since: None,
        }
    }

    pub fn sleep_started_at(&self) -> Option<DateTime<Utc>> {
        self.sleep.started_at()
    }
}

/// The pet aggregate: identity plus simulated state.
#[derive(Clone, Debug, PartialEq)]
pub struct Pet {
    pub name: String,
    pub owner: Option<String>,
    pub birthday: NaiveDate,
    pub age_days: u32,
    pub state: PetState,
}

pub fn clamp_stat(v: f64) -> f64 {
    if v.is_nan() {
        return MIN_STAT;
    }
    v.clamp(MIN_STAT, MAX_STAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn new_state_uses_defaults() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let st = PetState::new(now);
        assert_eq!(st.fullness, 20.0);
        assert_eq!(st.energy, 20.0);
        assert_eq!(st.sleep, SleepState::Awake);
        assert_eq!(st.sleep_started_at(), None);
        assert_eq!(st.last_update_at, now);
    }

    #[test]
    fn sleep_start_lives_in_sleeping_variants() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();
        assert_eq!(SleepState::AutoSleep { since: t }.started_at(), Some(t));
        assert!(SleepState::ManualSleep { since: t }.is_asleep());
        assert!(!SleepState::Awake.is_asleep());
    }

    #[test]
    fn clamp_stat_pins_range_and_nan() {
        assert_eq!(clamp_stat(-0.5), 0.0);
        assert_eq!(clamp_stat(101.0), 100.0);
        assert_eq!(clamp_stat(f64::NAN), 0.0);
        assert_eq!(clamp_stat(42.0), 42.0);
    }
}
