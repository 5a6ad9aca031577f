//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/falling-blocks/settings.toml (or platform equivalent)

use crate::board::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::tetromino::ShapeKind;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Game settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Keybindings
    pub keys: KeyBindings,
    /// Board size, timing and seed
    pub gameplay: GameplaySettings,
    /// Gap-filling spawn policy
    pub gap_fill: GapFillSettings,
    /// Visual settings
    pub visual: VisualSettings,
}

/// Key bindings (stored as strings for easy editing)
/// Each action can have one or more keys bound to it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_left: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_right: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub soft_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate_cw: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate_ccw: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub quit: Vec<String>,
}

/// Deserialize keys as either a single string or array of strings
fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeysVisitor;

    impl<'de> Visitor<'de> for KeysVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut keys = Vec::new();
            while let Some(key) = seq.next_element::<String>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_any(KeysVisitor)
}

/// Serialize keys: single key as string, multiple as array
fn serialize_keys<S>(keys: &Vec<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;

    if keys.len() == 1 {
        serializer.serialize_str(&keys[0])
    } else {
        let mut seq = serializer.serialize_seq(Some(keys.len()))?;
        for key in keys {
            seq.serialize_element(key)?;
        }
        seq.end()
    }
}

/// Gameplay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    pub grid_width: usize,
    pub grid_height: usize,
    /// Column new pieces are anchored on
    pub spawn_column: i32,
    /// Initial gravity period in milliseconds
    pub tick_interval_ms: u64,
    /// Gravity period multiplier applied after each line clear
    pub speedup_factor: f64,
    /// Delayed Auto Shift in milliseconds
    pub das_ms: u64,
    /// Auto Repeat Rate in milliseconds
    pub arr_ms: u64,
    /// Fixed seed for the piece sequence
    pub seed: Option<u64>,
}

/// Gap-filling spawn policy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GapFillSettings {
    /// Chance (0-1) that a new piece is synthesized to fill a gap
    pub probability: f64,
    pub width_mean: f64,
    pub width_std: f64,
    pub height_mean: f64,
    pub height_std: f64,
}

/// Visual settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    /// Block style: "solid", "bracket", "round"
    pub block_style: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_left: vec!["Left".to_string()],
            move_right: vec!["Right".to_string()],
            soft_drop: vec!["Down".to_string()],
            rotate_cw: vec!["Up".to_string(), "x".to_string()],
            rotate_ccw: vec!["z".to_string()],
            quit: vec!["q".to_string(), "Esc".to_string()],
        }
    }
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            grid_width: DEFAULT_WIDTH,
            grid_height: DEFAULT_HEIGHT,
            spawn_column: 6,
            tick_interval_ms: 300,
            speedup_factor: 0.95,
            das_ms: 200,
            arr_ms: 55,
            seed: None,
        }
    }
}

impl Default for GapFillSettings {
    fn default() -> Self {
        Self {
            probability: 0.0,
            width_mean: 3.0,
            width_std: 2.0,
            height_mean: 3.0,
            height_std: 2.0,
        }
    }
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            block_style: "solid".to_string(),
        }
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "falling-blocks", "falling-blocks")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from file, or fall back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) => {
                tracing::debug!("no settings at {}, using defaults", path.display());
                return Self::default();
            }
        };

        match Self::parse(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("ignoring {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse and validate settings from TOML text
    pub fn parse(contents: &str) -> Result<Self, SettingsError> {
        let settings: Settings =
            toml::from_str(contents).map_err(|e| SettingsError::Invalid(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that a round can actually be played with these settings
    pub fn validate(&self) -> Result<(), SettingsError> {
        let gameplay = &self.gameplay;
        if gameplay.grid_width == 0 || gameplay.grid_height == 0 {
            return Err(SettingsError::Invalid("grid must not be empty".into()));
        }

        // Every canonical shape must fit horizontally at the spawn column
        let width = gameplay.grid_width as i32;
        for kind in ShapeKind::ALL {
            let (left, right) = kind.column_extent();
            let (left, right) = (gameplay.spawn_column + left, gameplay.spawn_column + right);
            if left < 0 || right >= width {
                return Err(SettingsError::Invalid(format!(
                    "spawn column {} leaves {:?} outside a {}-wide grid",
                    gameplay.spawn_column, kind, width
                )));
            }
        }
        // The tallest shape (I) needs four rows
        if gameplay.grid_height < 4 {
            return Err(SettingsError::Invalid("grid must be at least 4 rows tall".into()));
        }

        if !(gameplay.speedup_factor > 0.0 && gameplay.speedup_factor <= 1.0) {
            return Err(SettingsError::Invalid(format!(
                "speedup_factor {} outside (0, 1]",
                gameplay.speedup_factor
            )));
        }

        let gap_fill = &self.gap_fill;
        if !(0.0..=1.0).contains(&gap_fill.probability) {
            return Err(SettingsError::Invalid(format!(
                "gap_fill.probability {} outside [0, 1]",
                gap_fill.probability
            )));
        }
        for (name, value) in [
            ("width_mean", gap_fill.width_mean),
            ("width_std", gap_fill.width_std),
            ("height_mean", gap_fill.height_mean),
            ("height_std", gap_fill.height_std),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SettingsError::Invalid(format!("gap_fill.{name} must be >= 0")));
            }
        }
        Ok(())
    }

    /// Save settings to file
    pub fn save(&self) -> Result<(), SettingsError> {
        let dir = Self::config_dir().ok_or(SettingsError::NoConfigDir)?;
        let path = dir.join("settings.toml");

        fs::create_dir_all(&dir)?;
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;

        Ok(())
    }
}

impl VisualSettings {
    /// Get the block characters based on style
    pub fn block_chars(&self) -> (&'static str, &'static str) {
        match self.block_style.as_str() {
            "bracket" => ("[]", " ."),
            "round" => ("()", " ."),
            _ => ("██", "  "), // "solid" or default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.gameplay.grid_width, 11);
        assert_eq!(settings.gameplay.grid_height, 19);
        assert_eq!(settings.gap_fill.probability, 0.0);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::parse(
            r#"
            [gameplay]
            tick_interval_ms = 500

            [keys]
            rotate_ccw = ["z", "q"]
            quit = "Esc"
            "#,
        )
        .unwrap();
        assert_eq!(settings.gameplay.tick_interval_ms, 500);
        assert_eq!(settings.gameplay.spawn_column, 6);
        assert_eq!(settings.keys.rotate_ccw, vec!["z", "q"]);
        assert_eq!(settings.keys.quit, vec!["Esc"]);
        assert_eq!(settings.keys.move_left, vec!["Left"]);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut settings = Settings::default();
        settings.gameplay.seed = Some(1234);
        settings.gap_fill.probability = 0.25;
        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed = Settings::parse(&text).unwrap();
        assert_eq!(parsed.gameplay.seed, Some(1234));
        assert_eq!(parsed.gap_fill.probability, 0.25);
        assert_eq!(parsed.keys.rotate_cw, vec!["Up", "x"]);
    }

    #[test]
    fn test_rejects_spawn_column_at_edge() {
        let mut settings = Settings::default();
        settings.gameplay.spawn_column = 0;
        // Z reaches one column left of the anchor
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));

        settings.gameplay.spawn_column = 9;
        // S reaches two columns right of the anchor
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_probability_and_speedup() {
        let mut settings = Settings::default();
        settings.gap_fill.probability = 1.5;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.gameplay.speedup_factor = 1.2;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_or_infinite_gap_fill_sizes() {
        let settings = Settings::parse(
            r#"
            [gap_fill]
            probability = 0.5
            width_mean = -1e12
            "#,
        );
        assert!(matches!(settings, Err(SettingsError::Invalid(_))));

        let mut settings = Settings::default();
        settings.gap_fill.height_mean = f64::INFINITY;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_invalid() {
        assert!(matches!(
            Settings::parse("gameplay = 3"),
            Err(SettingsError::Invalid(_))
        ));
    }

    #[test]
    fn test_block_chars() {
        let mut visual = VisualSettings::default();
        assert_eq!(visual.block_chars().0, "██");
        visual.block_style = "bracket".to_string();
        assert_eq!(visual.block_chars().0, "[]");
    }
}
