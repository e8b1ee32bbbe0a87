//! # Settings Module
//!
//! Persistent form values and the parsing of the raw text the user types.
//!
//! Settings are stored as pretty-printed JSON. Every field is optional in
//! the file; anything missing falls back to the defaults below.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::link::DEFAULT_BAUD_RATE;
use crate::melody::MelodyParams;

/// Default settings file, relative to the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = "melody_settings.json";

/// Everything the user can configure, in typed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Serial device address of the HC-06 (e.g. `COM5`).
    pub address: String,
    pub baud_rate: u32,
    /// Number of notes per melody.
    pub length: u32,
    /// Tempo in BPM.
    pub tempo: u32,
    pub delay_ms: u64,
    pub speed_factor: f64,
}

impl Default for Settings {
    fn default() -> Self {
        let params = MelodyParams::default();
        Self {
            address: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            length: params.length,
            tempo: params.tempo,
            delay_ms: params.delay_ms,
            speed_factor: params.speed_factor,
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())?;
        let settings = serde_json::from_str(&data)?;
        tracing::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Saves settings to a JSON file, replacing any existing one.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        tracing::info!("Saved settings to {}", path.as_ref().display());
        Ok(())
    }

    pub fn params(&self) -> MelodyParams {
        MelodyParams {
            length: self.length,
            tempo: self.tempo,
            delay_ms: self.delay_ms,
            speed_factor: self.speed_factor,
        }
    }
}

/// The melody fields exactly as typed into the form.
#[derive(Debug, Clone, PartialEq)]
pub struct MelodyForm {
    pub length: String,
    pub tempo: String,
    pub delay: String,
    pub speed_factor: String,
}

impl Default for MelodyForm {
    fn default() -> Self {
        Self::from_params(&MelodyParams::default())
    }
}

impl MelodyForm {
    pub fn from_params(params: &MelodyParams) -> Self {
        Self {
            length: params.length.to_string(),
            tempo: params.tempo.to_string(),
            delay: params.delay_ms.to_string(),
            speed_factor: format!("{:?}", params.speed_factor),
        }
    }

    /// Parses the text fields into melody parameters.
    ///
    /// Length, tempo and delay are whole numbers; the speed factor is a
    /// decimal. Surrounding whitespace is ignored. Range checks on tempo
    /// and speed factor happen when the melody is generated.
    pub fn parse(&self) -> Result<MelodyParams> {
        Ok(MelodyParams {
            length: parse_field("length", &self.length)?,
            tempo: parse_field("tempo", &self.tempo)?,
            delay_ms: parse_field("delay", &self.delay)?,
            speed_factor: parse_field("speed factor", &self.speed_factor)?,
        })
    }
}

fn parse_field<T>(field: &'static str, text: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text.trim()
        .parse()
        .map_err(|e: T::Err| Error::invalid(field, text, e.to_string()))
}
