//! Pet save files.
//!
//! Documents are read into a loose [`RawSave`] that admits every shape ever
//! written (legacy `hunger`, naive local timestamps, missing optional
//! fields), then [`normalize`] turns that into the one canonical [`Pet`].

use crate::commands::validate_name;
use crate::config::atomic_rename;
use crate::error::{PetError, PetResult};
use crate::model::{Pet, PetState, SleepState, MAX_STAT, MIN_STAT};
use crate::zero_floor;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

#[derive(Serialize)]
struct SaveDoc<'a> {
    name: &'a str,
    owner: Option<&'a str>,
    birthday: NaiveDate,
    age: u32,
    sleep: bool,
    auto_sleep: bool,
    sleep_start: Option<DateTime<Utc>>,
    last_update: DateTime<Utc>,
    fullness: f64,
    energy: f64,
    fullness_zero_since: Option<DateTime<Utc>>,
    energy_zero_since: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawSave {
    name: String,
    owner: Option<String>,
    birthday: String,
    age: i64,
    sleep: bool,
    #[serde(default)]
    auto_sleep: bool,
    sleep_start: Option<String>,
    last_update: Option<String>,
    fullness: Option<f64>,
    // inverted fullness, written by the first versions
    hunger: Option<f64>,
    energy: f64,
    fullness_zero_since: Option<String>,
    energy_zero_since: Option<String>,
}

/// Result of looking for a save file.
#[derive(Debug)]
pub enum Loaded {
    Pet(Pet),
    Missing,
    /// The file exists but cannot be used; callers start a fresh pet.
    Discarded(PetError),
}

pub fn encode_pet(pet: &Pet) -> serde_json::Result<String> {
    let st = &pet.state;
    let doc = SaveDoc {
        name: &pet.name,
        owner: pet.owner.as_deref(),
        birthday: pet.birthday,
        age: pet.age_days,
        sleep: st.sleep.is_asleep(),
        auto_sleep: matches!(st.sleep, SleepState::AutoSleep { .. }),
        sleep_start: st.sleep_started_at(),
        last_update: st.last_update_at,
        fullness: st.fullness,
        energy: st.energy,
        fullness_zero_since: st.fullness_zero_since,
        energy_zero_since: st.energy_zero_since,
    };
    serde_json::to_string_pretty(&doc)
}

/// `now` stands in for a missing `last_update`.
pub fn decode_pet(json: &str, now: DateTime<Utc>) -> PetResult<Pet> {
    let raw: RawSave = serde_json::from_str(json).map_err(|e| malformed(e.to_string()))?;
    normalize(raw, now)
}

fn normalize(raw: RawSave, now: DateTime<Utc>) -> PetResult<Pet> {
    let name = validate_name(&raw.name).map_err(|e| malformed(e.to_string()))?;

    let birthday = raw
        .birthday
        .parse::<NaiveDate>()
        .map_err(|e| malformed(format!("birthday {:?}: {e}", raw.birthday)))?;

    if raw.age < 0 {
        return Err(malformed(format!("age cannot be negative, got {}", raw.age)));
    }
    let age_days =
        u32::try_from(raw.age).map_err(|_| malformed(format!("age {} too large", raw.age)))?;

    let last_update_at = match raw.last_update.as_deref() {
        Some(s) => parse_instant("last_update", s)?,
        None => now,
    };

    let fullness = match (raw.fullness, raw.hunger) {
        (Some(f), _) => f,
        (None, Some(h)) => MAX_STAT - h,
        (None, None) => {
            return Err(malformed(
                "missing field `fullness` (or legacy `hunger`)".to_string(),
            ))
        }
    };
    let fullness = check_stat("fullness", fullness)?;
    let energy = check_stat("energy", raw.energy)?;

    let sleep = if raw.sleep {
        let since = match raw.sleep_start.as_deref() {
            Some(s) => parse_instant("sleep_start", s)?,
            None => last_update_at,
        };
        if raw.auto_sleep {
            SleepState::AutoSleep { since }
        } else {
            SleepState::ManualSleep { since }
        }
    } else {
        SleepState::Awake
    };

    let mut state = PetState {
        fullness,
        energy,
        sleep,
        last_update_at,
        fullness_zero_since: parse_opt_instant("fullness_zero_since", raw.fullness_zero_since)?,
        energy_zero_since: parse_opt_instant("energy_zero_since", raw.energy_zero_since)?,
    };
    zero_floor::settle(&mut state, last_update_at);

    Ok(Pet {
        name,
        owner: raw.owner,
        birthday,
        age_days,
        state,
    })
}

pub fn load_pet(path: &Path, now: DateTime<Utc>) -> Loaded {
    let json = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Loaded::Missing,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "save file unreadable");
            return Loaded::Discarded(malformed(format!("unreadable: {e}")));
        }
    };
    match decode_pet(&json, now) {
        Ok(pet) => {
            tracing::info!(path = %path.display(), name = %pet.name, "pet loaded");
            Loaded::Pet(pet)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "discarding save file");
            Loaded::Discarded(e)
        }
    }
}

pub fn save_pet_atomic(path: &Path, pet: &Pet) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("could not create {}", dir.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    let data = encode_pet(pet)?;
    fs::write(&tmp, data).with_context(|| format!("could not write {}", tmp.display()))?;
    atomic_rename(&tmp, path)?;
    tracing::info!(path = %path.display(), name = %pet.name, "pet saved");
    Ok(())
}

fn check_stat(field: &str, v: f64) -> PetResult<f64> {
    if v.is_finite() && (MIN_STAT..=MAX_STAT).contains(&v) {
        Ok(v)
    } else {
        Err(malformed(format!(
            "{field} must be between {MIN_STAT} and {MAX_STAT}, got {v}"
        )))
    }
}

/// RFC 3339, or a naive timestamp in local time as older saves wrote them.
fn parse_instant(field: &str, s: &str) -> PetResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = s
        .parse::<NaiveDateTime>()
        .map_err(|e| malformed(format!("{field} {s:?}: {e}")))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| malformed(format!("{field} {s:?} does not exist in local time")))
}

fn parse_opt_instant(field: &str, s: Option<String>) -> PetResult<Option<DateTime<Utc>>> {
    s.map(|s| parse_instant(field, &s)).transpose()
}

fn malformed(msg: String) -> PetError {
    PetError::MalformedSave(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 18, 0, 0).unwrap()
    }

    const CURRENT: &str = r#"{
        "name": "Fluffy",
        "owner": "sam",
        "birthday": "2024-08-20",
        "age": 12,
        "sleep": true,
        "auto_sleep": true,
        "sleep_start": "2024-09-01T15:00:00Z",
        "last_update": "2024-09-01T16:00:00Z",
        "fullness": 42.5,
        "energy": 3.0,
        "fullness_zero_since": null,
        "energy_zero_since": "2024-09-01T15:00:00Z"
    }"#;

    #[test]
    fn decodes_current_format() {
        let pet = decode_pet(CURRENT, now()).unwrap();
        assert_eq!(pet.name, "Fluffy");
        assert_eq!(pet.owner.as_deref(), Some("sam"));
        assert_eq!(pet.age_days, 12);
        let since = Utc.with_ymd_and_hms(2024, 9, 1, 15, 0, 0).unwrap();
        assert_eq!(pet.state.sleep, SleepState::AutoSleep { since });
        assert_eq!(pet.state.energy_zero_since, Some(since));
        assert_eq!(pet.state.fullness, 42.5);
    }

    #[test]
    fn legacy_hunger_becomes_fullness() {
        let json = r#"{"name":"Old","birthday":"2023-01-01","age":5,"sleep":false,
                       "last_update":"2024-09-01T16:00:00Z","hunger":70,"energy":50}"#;
        let pet = decode_pet(json, now()).unwrap();
        assert_eq!(pet.state.fullness, 30.0);
        assert_eq!(pet.owner, None);
        assert_eq!(pet.state.sleep, SleepState::Awake);
    }

    #[test]
    fn fullness_wins_over_hunger() {
        let json = r#"{"name":"Both","birthday":"2023-01-01","age":5,"sleep":false,
                       "fullness":80,"hunger":70,"energy":50}"#;
        let pet = decode_pet(json, now()).unwrap();
        assert_eq!(pet.state.fullness, 80.0);
        assert_eq!(pet.state.last_update_at, now());
    }

    #[test]
    fn naive_timestamps_are_accepted() {
        let json = r#"{"name":"Py","birthday":"2024-01-01","age":0,"sleep":true,
                       "sleep_start":"2024-08-31T22:15:00.123456",
                       "last_update":"2024-08-31T22:15:00.123456",
                       "fullness":50,"energy":50}"#;
        let pet = decode_pet(json, now()).unwrap();
        assert!(matches!(pet.state.sleep, SleepState::ManualSleep { .. }));
        assert_eq!(pet.state.sleep_started_at(), Some(pet.state.last_update_at));
    }

    #[test]
    fn sleeping_without_start_uses_last_update() {
        let json = r#"{"name":"Nap","birthday":"2024-01-01","age":0,"sleep":true,
                       "last_update":"2024-09-01T16:00:00Z","fullness":50,"energy":50}"#;
        let pet = decode_pet(json, now()).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 9, 1, 16, 0, 0).unwrap();
        assert_eq!(pet.state.sleep, SleepState::ManualSleep { since: at });
    }

    #[test]
    fn rejects_malformed_documents() {
        let cases = [
            r#"{"birthday":"2024-01-01","age":0,"sleep":false,"fullness":1,"energy":1}"#,
            r#"{"name":"A","age":0,"sleep":false,"fullness":1,"energy":1}"#,
            r#"{"name":"A","birthday":"2024-01-01","sleep":false,"fullness":1,"energy":1}"#,
            r#"{"name":"A","birthday":"2024-01-01","age":0,"fullness":1,"energy":1}"#,
            r#"{"name":"A","birthday":"2024-01-01","age":0,"sleep":false,"fullness":1}"#,
            r#"{"name":"A","birthday":"2024-01-01","age":0,"sleep":false,"energy":1}"#,
            r#"{"name":7,"birthday":"2024-01-01","age":0,"sleep":false,"fullness":1,"energy":1}"#,
            r#"{"name":" ","birthday":"2024-01-01","age":0,"sleep":false,"fullness":1,"energy":1}"#,
            r#"{"name":"A","birthday":"someday","age":0,"sleep":false,"fullness":1,"energy":1}"#,
            r#"{"name":"A","birthday":"2024-01-01",
                "age":-1,"sleep":false,"fullness":1,"energy":1}"#,
            r#"{"name":"A","birthday":"2024-01-01","age":0,"sleep":"no","fullness":1,"energy":1}"#,
            r#"{"name":"A","birthday":"2024-01-01",
                "age":0,"sleep":false,"fullness":101,"energy":1}"#,
            r#"{"name":"A","birthday":"2024-01-01","age":0,"sleep":false,"hunger":-5,"energy":1}"#,
            r#"{"name":"A","birthday":"2024-01-01",
                "age":0,"sleep":false,"fullness":1,"energy":-0.1}"#,
            r#"{"name":"A","birthday":"2024-01-01","age":0,"sleep":false,"fullness":1,"energy":1,
                "last_update":"yesterday"}"#,
            r#"{"name":"A","birthday":"2024-01-01","age":0,"sleep":false,"fullness":1,"energy":1,
                "fullness_zero_since":12}"#,
            "not json",
        ];
        for json in cases {
            let err = decode_pet(json, now()).unwrap_err();
            assert!(
                matches!(err, PetError::MalformedSave(_)),
                "expected MalformedSave for {json}, got {err:?}"
            );
        }
    }

    #[test]
    fn stale_markers_are_dropped_on_load() {
        let json = r#"{"name":"A","birthday":"2024-01-01","age":0,"sleep":false,
                       "last_update":"2024-09-01T16:00:00Z","fullness":10,"energy":0,
                       "fullness_zero_since":"2024-09-01T12:00:00Z"}"#;
        let pet = decode_pet(json, now()).unwrap();
        assert_eq!(pet.state.fullness_zero_since, None);
        // awake at zero energy gets a marker from the last known instant
        let at = Utc.with_ymd_and_hms(2024, 9, 1, 16, 0, 0).unwrap();
        assert_eq!(pet.state.energy_zero_since, Some(at));
    }

    #[test]
    fn encoded_document_uses_persisted_field_names() {
        let pet = decode_pet(CURRENT, now()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&encode_pet(&pet).unwrap()).unwrap();
        assert_eq!(v["name"], "Fluffy");
        assert_eq!(v["age"], 12);
        assert_eq!(v["sleep"], true);
        assert_eq!(v["auto_sleep"], true);
        assert_eq!(v["birthday"], "2024-08-20");
        assert_eq!(v["fullness_zero_since"], serde_json::Value::Null);
        assert!(v.get("hunger").is_none());
    }
}
