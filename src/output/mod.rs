//! Output sinks for a finished capture: the clipboard and a file on disk.

mod clipboard;
mod file;

pub use clipboard::{to_clipboard, ClipboardTarget, SystemClipboard};
pub use file::{resolve_path, save, save_at, timestamp, TIMESTAMP_FORMAT};

use std::path::PathBuf;

use image::ImageFormat;

/// Where and how to write a capture.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDescriptor {
    pub directory: PathBuf,
    /// File stem; `{timestamp}` is replaced at save time.
    pub pattern: String,
    /// `png`, `jpg`, `jpeg`, `bmp` or `gif`. Anything else means PNG.
    pub format: String,
}

impl OutputDescriptor {
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_tag(&self.format)
    }

    /// Extension for the resolved file name, without the dot.
    pub fn extension(&self) -> String {
        let tag = self.format.trim().to_ascii_lowercase();
        match tag.as_str() {
            "png" | "jpg" | "jpeg" | "bmp" | "gif" => tag,
            _ => "png".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Bmp,
    Gif,
}

impl OutputFormat {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => OutputFormat::Jpeg,
            "bmp" => OutputFormat::Bmp,
            "gif" => OutputFormat::Gif,
            _ => OutputFormat::Png,
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Gif => ImageFormat::Gif,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Clipboard unavailable: {0}")]
    ClipboardUnavailable(String),

    #[error("Clipboard rejected the image: {0}")]
    ClipboardWrite(String),

    #[error("Could not create folder {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

impl OutputError {
    pub fn is_clipboard(&self) -> bool {
        matches!(
            self,
            OutputError::ClipboardUnavailable(_) | OutputError::ClipboardWrite(_)
        )
    }
}
