//! End-to-end runs of the engine and commands through the public API.

use chrono::{DateTime, Duration, TimeZone, Utc};
use termipet::{
    advance, advance_with_events, NoOp, Pet, PetError, PetState, Rates, SimEvent, SleepState,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 14, 8, 0, 0).unwrap()
}

// 20 energy at 100 points per 16h
const EXHAUSTED_AFTER: i64 = 57_600 * 20 / 100;
// 10 energy at 100 points per 8h
const RESTED_AFTER: i64 = 28_800 * 10 / 100;

#[test]
fn fresh_pet_collapses_exactly_when_energy_runs_out() {
    let rates = Rates::default();
    let at = t0() + Duration::seconds(EXHAUSTED_AFTER);
    let st = advance(&PetState::new(t0()), at, &rates);

    assert_eq!(st.sleep, SleepState::AutoSleep { since: at });
    assert_eq!(st.energy, 0.0);
    assert_eq!(st.energy_zero_since, Some(at));
    assert_eq!(st.last_update_at, at);
}

#[test]
fn exhausted_pet_wakes_itself_at_ten_energy() {
    let rates = Rates::default();
    let slept = t0() + Duration::seconds(EXHAUSTED_AFTER);
    let asleep = advance(&PetState::new(t0()), slept, &rates);

    let woke = slept + Duration::seconds(RESTED_AFTER);
    let out = advance_with_events(&asleep, woke + Duration::seconds(1), &rates);

    assert_eq!(out.state.sleep, SleepState::Awake);
    assert_eq!(out.state.sleep_started_at(), None);
    assert_eq!(out.state.energy_zero_since, None);
    assert!((out.state.energy - (10.0 - 1.0 / 576.0)).abs() < 1e-9);
    assert_eq!(out.events, vec![SimEvent::WokeUp { at: woke }]);
}

#[test]
fn waking_instant_lands_on_threshold() {
    let rates = Rates::default();
    let slept = t0() + Duration::seconds(EXHAUSTED_AFTER);
    let asleep = advance(&PetState::new(t0()), slept, &rates);
    let st = advance(&asleep, slept + Duration::seconds(RESTED_AFTER), &rates);
    assert_eq!(st.sleep, SleepState::Awake);
    assert_eq!(st.energy, 10.0);
}

#[test]
fn overfeeding_is_rejected_and_feeding_clamps() {
    let rates = Rates::default();
    let mut pet = Pet::new("Pudding", None, t0()).unwrap();
    assert_eq!(pet.feed(150.0, t0(), &rates), Err(PetError::InvalidAmount(150.0)));
    assert_eq!(pet.state.fullness, 20.0);

    pet.state.fullness = 95.0;
    pet.feed(20.0, t0(), &rates).unwrap();
    assert_eq!(pet.state.fullness, 100.0);
    assert!(pet.is_full());
}

#[test]
fn going_to_bed_twice_leaves_state_alone() {
    let rates = Rates::default();
    let mut pet = Pet::new("Pudding", None, t0()).unwrap();
    pet.go_to_bed(t0(), &rates).unwrap();
    let before = pet.clone();

    let err = pet.go_to_bed(t0(), &rates).unwrap_err();
    assert_eq!(err, PetError::NoOpTransition(NoOp::AlreadySleeping));
    assert_eq!(err.to_string(), "already sleeping");
    assert_eq!(pet, before);
}

#[test]
fn one_long_call_matches_many_short_ones() {
    let rates = Rates::default();
    let start = PetState::new(t0());
    let end = t0() + Duration::hours(9);

    let once = advance(&start, end, &rates);
    let mut stepped = start;
    let mut now = t0();
    while now < end {
        now += Duration::minutes(7);
        stepped = advance(&stepped, now.min(end), &rates);
    }

    assert_eq!(once.sleep, stepped.sleep);
    assert!((once.energy - stepped.energy).abs() < 1e-6);
    assert!((once.fullness - stepped.fullness).abs() < 1e-6);
    assert_eq!(once.fullness_zero_since, stepped.fullness_zero_since);
}

#[test]
fn starving_marker_survives_later_calls() {
    let rates = Rates::default();
    let st = PetState::new(t0());
    // 20 fullness awake lasts 72 minutes
    let hit = t0() + Duration::minutes(72);

    let first = advance_with_events(&st, t0() + Duration::hours(2), &rates);
    assert_eq!(first.state.fullness_zero_since, Some(hit));
    assert!(first.events.contains(&SimEvent::Starving { since: hit }));

    let second = advance_with_events(&first.state, t0() + Duration::hours(5), &rates);
    assert_eq!(second.state.fullness_zero_since, Some(hit));
    assert!(!second.events.iter().any(|e| matches!(e, SimEvent::Starving { .. })));
}

#[test]
fn bedtime_then_manual_wake_credits_the_night() {
    let rates = Rates::default();
    let mut pet = Pet::new("Pudding", Some("kim".into()), t0()).unwrap();
    pet.state.fullness = 100.0;
    pet.go_to_bed(t0(), &rates).unwrap();

    // 4h asleep restores 50 and costs 100 * 0.3 / 6 * 4 fullness
    let morning = t0() + Duration::hours(4);
    pet.wake_up(morning, &rates).unwrap();

    assert!(!pet.is_asleep());
    assert!((pet.state.energy - 70.0).abs() < 1e-9);
    assert!((pet.state.fullness - 80.0).abs() < 1e-9);
    assert_eq!(pet.state.last_update_at, morning);
}

#[test]
fn sped_up_clock_runs_the_same_story_faster() {
    let rates = Rates::default().scaled(60.0);
    let at = t0() + Duration::seconds(EXHAUSTED_AFTER / 60);
    let st = advance(&PetState::new(t0()), at, &rates);
    assert_eq!(st.sleep, SleepState::AutoSleep { since: at });
}

#[test]
fn food_given_after_an_absence_is_not_eaten_by_the_catch_up() {
    let rates = Rates::default();
    let mut pet = Pet::new("Pudding", None, t0()).unwrap();
    let back = t0() + Duration::hours(5);

    pet.feed(20.0, back, &rates).unwrap();
    pet.refresh(back, &rates);
    assert_eq!(pet.state.fullness, 20.0);

    // half an hour later only that half hour is taken off the meal
    pet.refresh(back + Duration::minutes(30), &rates);
    assert!((pet.state.fullness - (20.0 - 1_800.0 / 216.0)).abs() < 1e-9);
}
