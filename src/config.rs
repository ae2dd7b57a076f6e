use crate::rules::Rates;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pet_file: String,
    pub owner: Option<String>,
    pub speed: f64, // 1.0 = real time
    pub enable_color: bool,
    pub rates: Rates,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pet_file: "pet_data.json".to_string(),
            owner: None,
            speed: 1.0,
            enable_color: true,
            rates: Rates::default(),
        }
    }
}

/// One simulated hour per real second.
pub const MAX_SPEED: f64 = 3_600.0;

/// Non-positive or NaN speeds fall back to real time; fast ones are capped.
pub fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() || speed <= 0.0 {
        1.0
    } else {
        speed.min(MAX_SPEED)
    }
}

impl Settings {
    pub fn session_rates(&self, speed: Option<f64>) -> Rates {
        self.rates.scaled(clamp_speed(speed.unwrap_or(self.speed)))
    }
}

pub struct Paths {
    pub data_dir: PathBuf,
    pub pets_dir: PathBuf,
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
}

impl Paths {
    pub fn under(dir: PathBuf) -> Self {
        Self {
            pets_dir: dir.join("pets"),
            settings_path: dir.join("settings.json"),
            log_path: dir.join("termipet.log"),
            data_dir: dir,
        }
    }

    pub fn pet_path(&self, file: &str) -> PathBuf {
        self.pets_dir.join(file)
    }
}

/// Resolves the data directory (platform default unless overridden) and makes sure it exists.
pub fn project_paths(data_dir: Option<PathBuf>) -> Result<Paths> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => ProjectDirs::from("com", "termipet", "Termipet")
            .context("could not resolve project directories")?
            .data_local_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir).with_context(|| format!("could not create {}", dir.display()))?;
    Ok(Paths::under(dir))
}

pub fn load_settings(path: &Path) -> Settings {
    let Ok(s) = fs::read_to_string(path) else {
        return Settings::default();
    };
    match serde_json::from_str::<Settings>(&s) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
            Settings::default()
        }
    }
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

pub fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename() cannot replace an existing file on Windows
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)
        .with_context(|| format!("could not move {} to {}", from.display(), to.display()))?;
    Ok(())
}
