//! Unified error type for everything that reaches the user.
//!
//! Module-level errors (`HotkeyError`, `CaptureError`, `OutputError`,
//! `ConfigError`) stay precise inside their modules and fold into
//! `AppError` at the command/coordinator boundary. Tauri commands return
//! `Result<T, AppError>`, so it serializes as its display string.

use serde::Serialize;

use crate::capture::CaptureError;
use crate::config::ConfigError;
use crate::hotkey::HotkeyError;
use crate::output::OutputError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The combination is owned by another application.
    #[error("Hotkey {0} is already in use by another application")]
    HotkeyConflict(String),

    #[error("Hotkey registration failed: {0}")]
    HotkeyRegistration(String),

    /// Snapshot, overlay or crop failure. Aborts the session.
    #[error("Screen capture failed: {0}")]
    Capture(String),

    #[error("Failed to copy to clipboard: {0}")]
    Clipboard(String),

    #[error("Failed to save screenshot: {0}")]
    FileWrite(String),

    #[error("Capture region must have a positive width and height")]
    InvalidRegion,

    #[error("A screenshot is already in progress")]
    SessionBusy,

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Window operation failed: {0}")]
    Window(String),
}

impl From<HotkeyError> for AppError {
    fn from(err: HotkeyError) -> Self {
        match err {
            HotkeyError::Conflict { combo } => AppError::HotkeyConflict(combo),
            other => AppError::HotkeyRegistration(other.to_string()),
        }
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::InvalidRegion { .. } => AppError::InvalidRegion,
            other => AppError::Capture(other.to_string()),
        }
    }
}

impl From<OutputError> for AppError {
    fn from(err: OutputError) -> Self {
        if err.is_clipboard() {
            AppError::Clipboard(err.to_string())
        } else {
            AppError::FileWrite(err.to_string())
        }
    }
}

impl From<tauri::Error> for AppError {
    fn from(err: tauri::Error) -> Self {
        AppError::Window(err.to_string())
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_keeps_its_own_variant() {
        let err: AppError = HotkeyError::Conflict {
            combo: "Meta+Shift+S".into(),
        }
        .into();
        assert!(matches!(err, AppError::HotkeyConflict(ref c) if c == "Meta+Shift+S"));
    }

    #[test]
    fn other_hotkey_failures_are_registration_errors() {
        let err: AppError = HotkeyError::Registration("boom".into()).into();
        assert!(matches!(err, AppError::HotkeyRegistration(_)));
    }

    #[test]
    fn degenerate_capture_maps_to_invalid_region() {
        let err: AppError = CaptureError::InvalidRegion {
            width: 0,
            height: 5,
        }
        .into();
        assert!(matches!(err, AppError::InvalidRegion));
    }

    #[test]
    fn serializes_as_display_string() {
        let json = serde_json::to_string(&AppError::SessionBusy).unwrap();
        assert_eq!(json, "\"A screenshot is already in progress\"");
    }
}
