use crate::error::{NoOp, PetError, PetResult};
use crate::model::{clamp_stat, Pet, PetState, SleepState, MAX_STAT, MIN_STAT, NAME_MAX};
use crate::rules::Rates;
use crate::sim::{advance_with_events, micros_between, SimEvent};
use crate::zero_floor::step_fullness;
use chrono::{DateTime, Local, NaiveDate, Utc};

impl PetState {
    pub fn feed(&mut self, amount: f64) -> PetResult<()> {
        // NaN fails both comparisons
        if !(amount > 0.0 && amount <= MAX_STAT) {
            return Err(PetError::InvalidAmount(amount));
        }
        self.fullness = clamp_stat(self.fullness + amount);
        if self.fullness > MIN_STAT {
            self.fullness_zero_since = None;
        }
        Ok(())
    }

    /// Only an awake pet can be put to bed.
    pub fn go_to_bed(&mut self, now: DateTime<Utc>) -> PetResult<()> {
        if self.sleep.is_asleep() {
            return Err(PetError::NoOpTransition(NoOp::AlreadySleeping));
        }
        self.sleep = SleepState::ManualSleep { since: now };
        Ok(())
    }

    /// Wakes the pet immediately, crediting the sleep not yet integrated as a
    /// single stretch at sleeping rates. Thresholds are not consulted.
    pub fn wake_up(&mut self, now: DateTime<Utc>, rates: &Rates) -> PetResult<()> {
        let since = self
            .sleep
            .started_at()
            .ok_or(PetError::NoOpTransition(NoOp::NotSleeping))?;
        let from = since.max(self.last_update_at);
        let slept = micros_between(from, now).max(0);

        self.fullness = step_fullness(
            &mut self.fullness_zero_since,
            self.fullness,
            rates.fullness_per_sec(&self.sleep),
            from,
            slept,
        );
        let secs = slept as f64 / 1e6;
        self.energy = clamp_stat(self.energy + rates.energy_per_sec(&self.sleep) * secs);
        if self.energy > MIN_STAT {
            self.energy_zero_since = None;
        }

        tracing::debug!(%since, %now, energy = self.energy, "woken up");
        self.sleep = SleepState::Awake;
        if now > self.last_update_at {
            self.last_update_at = now;
        }
        Ok(())
    }
}

impl Pet {
    pub fn new(name: &str, owner: Option<String>, now: DateTime<Utc>) -> PetResult<Self> {
        Ok(Self {
            name: validate_name(name)?,
            owner,
            birthday: local_date(now),
            age_days: 0,
            state: PetState::new(now),
        })
    }

    /// Catches the pet up to `now` and recomputes its age.
    pub fn refresh(&mut self, now: DateTime<Utc>, rates: &Rates) -> Vec<SimEvent> {
        let advanced = advance_with_events(&self.state, now, rates);
        self.state = advanced.state;
        self.age_days = age_on(self.birthday, local_date(now));
        advanced.events
    }

    pub fn feed(&mut self, amount: f64, now: DateTime<Utc>, rates: &Rates) -> PetResult<()> {
        self.refresh(now, rates);
        self.state.feed(amount)
    }

    pub fn go_to_bed(&mut self, now: DateTime<Utc>, rates: &Rates) -> PetResult<()> {
        self.refresh(now, rates);
        self.state.go_to_bed(now)
    }

    pub fn wake_up(&mut self, now: DateTime<Utc>, rates: &Rates) -> PetResult<()> {
        self.refresh(now, rates);
        self.state.wake_up(now, rates)
    }

    pub fn is_full(&self) -> bool {
        self.state.fullness >= MAX_STAT
    }

    pub fn is_asleep(&self) -> bool {
        self.state.sleep.is_asleep()
    }
}

pub fn validate_name(name: &str) -> PetResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PetError::InvalidName("name cannot be empty".to_string()));
    }
    if trimmed.chars().count() > NAME_MAX {
        return Err(PetError::InvalidName(format!(
            "name cannot exceed {NAME_MAX} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Calendar date on the owner's clock.
pub fn local_date(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

pub fn age_on(birthday: NaiveDate, today: NaiveDate) -> u32 {
    let days = (today - birthday).num_days().max(0);
    u32::try_from(days).unwrap_or(u32::MAX)
}
