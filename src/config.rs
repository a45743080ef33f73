use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mapping::Scale;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown key name '{name}' bound to {action}")]
    UnknownKey { action: &'static str, name: String },
    #[error("key '{name}' is bound to both {first} and {second}")]
    DuplicateKey {
        name: String,
        first: &'static str,
        second: &'static str,
    },
    #[error("poll interval must be at least 1 ms")]
    ZeroPollInterval,
}

/// How a click is recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Every click appends a new point.
    #[default]
    Multi,
    /// A click replaces the previous point.
    Single,
}

/// Everything that parameterises one annotation session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub scale: Scale,
    #[serde(default)]
    pub mode: SelectionMode,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub keys: KeyBindings,
    #[serde(default)]
    pub marker: MarkerStyle,
}

/// Logical action to key name. Names follow `egui::Key::from_name`
/// (`"U"`, `"Escape"`, `"Backspace"`, ...).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_undo_key")]
    pub undo: String,
    #[serde(default = "default_redo_key")]
    pub redo: String,
    #[serde(default = "default_clear_key")]
    pub clear: String,
    #[serde(default = "default_quit_key")]
    pub quit: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarkerStyle {
    #[serde(default = "default_radius")]
    pub radius: i32,
    #[serde(default = "default_marker_color")]
    pub color: [u8; 4],
    #[serde(default = "default_true")]
    pub labels: bool,
    #[serde(default = "default_label_color")]
    pub label_color: [u8; 4],
    #[serde(default = "default_label_scale")]
    pub label_scale: f32,
    /// TrueType/OpenType font for labels; system fonts are tried otherwise.
    #[serde(default)]
    pub font: Option<PathBuf>,
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_undo_key() -> String {
    "U".to_string()
}

fn default_redo_key() -> String {
    "R".to_string()
}

fn default_clear_key() -> String {
    "C".to_string()
}

fn default_quit_key() -> String {
    "Q".to_string()
}

fn default_radius() -> i32 {
    5
}

fn default_marker_color() -> [u8; 4] {
    [255, 0, 0, 255]
}

fn default_true() -> bool {
    true
}

fn default_label_color() -> [u8; 4] {
    [0, 255, 0, 255]
}

fn default_label_scale() -> f32 {
    13.0
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scale: Scale::IDENTITY,
            mode: SelectionMode::Multi,
            poll_interval_ms: default_poll_interval_ms(),
            keys: KeyBindings::default(),
            marker: MarkerStyle::default(),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            undo: default_undo_key(),
            redo: default_redo_key(),
            clear: default_clear_key(),
            quit: default_quit_key(),
        }
    }
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            color: default_marker_color(),
            labels: true,
            label_color: default_label_color(),
            label_scale: default_label_scale(),
            font: None,
        }
    }
}

impl SessionConfig {
    /// Reads a TOML config file. Missing fields fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Checks everything serde cannot: key names and the poll interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        self.keys.resolve().map(|_| ())
    }
}

impl KeyBindings {
    /// Resolves the key names, rejecting unknown names and keys bound twice.
    pub fn resolve(&self) -> Result<ResolvedKeys, ConfigError> {
        let pairs = [
            ("undo", &self.undo),
            ("redo", &self.redo),
            ("clear", &self.clear),
            ("quit", &self.quit),
        ];

        let mut keys = Vec::with_capacity(pairs.len());
        for (action, name) in pairs {
            let key = egui::Key::from_name(name).ok_or_else(|| ConfigError::UnknownKey {
                action,
                name: name.clone(),
            })?;
            if let Some(&(first, _)) = keys.iter().find(|(_, bound)| *bound == key) {
                return Err(ConfigError::DuplicateKey {
                    name: name.clone(),
                    first,
                    second: action,
                });
            }
            keys.push((action, key));
        }

        Ok(ResolvedKeys {
            undo: keys[0].1,
            redo: keys[1].1,
            clear: keys[2].1,
            quit: keys[3].1,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedKeys {
    pub undo: egui::Key,
    pub redo: egui::Key,
    pub clear: egui::Key,
    pub quit: egui::Key,
}
