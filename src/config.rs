//! Settings record read at startup and on "Reload Settings".
//!
//! Stored as camelCase JSON in `<config dir>/clip-snap/settings.json`.
//! The app only reads it; editing the file is up to the user.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::hotkey::{KeyCode, Modifier, ModifierSet};
use crate::output::OutputDescriptor;

const APP_DIR: &str = "clip-snap";
const SETTINGS_FILE: &str = "settings.json";
const SCREENSHOTS_DIR: &str = "ClipSnap Screenshots";

/// Number of configurable hotkey slots. Slot `n` registers as id `n + 1`.
pub const HOTKEY_SLOTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotkeySlotConfig {
    pub enabled: bool,
    pub modifiers: Vec<Modifier>,
    pub key: KeyCode,
}

impl HotkeySlotConfig {
    pub fn modifier_set(&self) -> ModifierSet {
        self.modifiers.iter().copied().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConfig {
    #[serde(default = "default_save_folder")]
    pub save_folder_path: PathBuf,
    #[serde(default = "default_file_name_pattern")]
    pub file_name_pattern: String,
    #[serde(default = "default_image_format")]
    pub image_format: String,
    #[serde(default = "default_true")]
    pub copy_to_clipboard: bool,
    #[serde(default = "default_hotkeys", deserialize_with = "deserialize_slots")]
    pub hotkeys: [HotkeySlotConfig; HOTKEY_SLOTS],
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            save_folder_path: default_save_folder(),
            file_name_pattern: default_file_name_pattern(),
            image_format: default_image_format(),
            copy_to_clipboard: true,
            hotkeys: default_hotkeys(),
        }
    }
}

impl CaptureConfig {
    pub fn output_descriptor(&self) -> OutputDescriptor {
        OutputDescriptor {
            directory: self.save_folder_path.clone(),
            pattern: self.file_name_pattern.clone(),
            format: self.image_format.clone(),
        }
    }

    /// Enabled slots as `(registry id, slot)`.
    pub fn enabled_hotkeys(&self) -> impl Iterator<Item = (u32, &HotkeySlotConfig)> {
        self.hotkeys
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.enabled)
            .map(|(i, slot)| (i as u32 + 1, slot))
    }

    /// Create the save folder if missing. Failures are logged only; the
    /// file sink retries creation on every save.
    pub fn ensure_save_folder(&self) {
        if let Err(e) = std::fs::create_dir_all(&self.save_folder_path) {
            log::warn!(
                "[CONFIG] Could not create save folder {}: {}",
                self.save_folder_path.display(),
                e
            );
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_save_folder() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SCREENSHOTS_DIR)
}

fn default_file_name_pattern() -> String {
    "Screenshot_{timestamp}".to_string()
}

fn default_image_format() -> String {
    "png".to_string()
}

fn default_hotkeys() -> [HotkeySlotConfig; HOTKEY_SLOTS] {
    [
        HotkeySlotConfig {
            enabled: true,
            modifiers: vec![Modifier::Meta, Modifier::Shift],
            key: KeyCode::S,
        },
        HotkeySlotConfig {
            enabled: true,
            modifiers: Vec::new(),
            key: KeyCode::PRINT_SCREEN,
        },
    ]
}

/// One `hotkeys` entry as written in the file. Omitted fields fall back to
/// the slot's default.
#[derive(Deserialize)]
struct SlotEntry {
    enabled: Option<bool>,
    modifiers: Option<Vec<Modifier>>,
    key: Option<KeyCode>,
}

impl SlotEntry {
    fn over(self, default: &HotkeySlotConfig) -> HotkeySlotConfig {
        // An explicit key without modifiers means the bare key.
        let (modifiers, key) = match self.key {
            Some(key) => (self.modifiers.unwrap_or_default(), key),
            None => (
                self.modifiers.unwrap_or_else(|| default.modifiers.clone()),
                default.key,
            ),
        };
        HotkeySlotConfig {
            enabled: self.enabled.unwrap_or(true),
            modifiers,
            key,
        }
    }
}

fn deserialize_slots<'de, D>(deserializer: D) -> Result<[HotkeySlotConfig; HOTKEY_SLOTS], D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Vec::<SlotEntry>::deserialize(deserializer)?;
    if entries.len() > HOTKEY_SLOTS {
        log::warn!(
            "[CONFIG] {} hotkey entries, only the first {} are used",
            entries.len(),
            HOTKEY_SLOTS
        );
    }

    let mut slots = default_hotkeys();
    for (slot, entry) in slots.iter_mut().zip(entries) {
        *slot = entry.over(slot);
    }
    Ok(slots)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// `<config dir>/clip-snap/settings.json`, if the platform has a config dir.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
}

/// Read settings from `path`. A missing file is not an error.
pub fn load_from(path: &Path) -> Result<CaptureConfig, ConfigError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("[CONFIG] No settings at {}, using defaults", path.display());
            return Ok(CaptureConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Settings from the default location. Never fails: problems are logged and
/// defaults are used instead.
pub fn load() -> CaptureConfig {
    let Some(path) = config_path() else {
        log::warn!("[CONFIG] No config directory on this platform, using defaults");
        return CaptureConfig::default();
    };

    match load_from(&path) {
        Ok(config) => {
            log::info!("[CONFIG] Loaded settings from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("[CONFIG] {}; using defaults", e);
            CaptureConfig::default()
        }
    }
}
