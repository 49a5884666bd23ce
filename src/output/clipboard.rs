//! Clipboard sink.

use std::borrow::Cow;

use super::OutputError;
use crate::capture::RasterImage;

/// Something that can hold one image.
pub trait ClipboardTarget {
    fn set_image(&self, width: usize, height: usize, rgba: &[u8]) -> Result<(), OutputError>;
}

/// The OS clipboard via `arboard`.
///
/// A handle is opened per copy and dropped before returning, on success and
/// failure alike. Nothing is kept open between captures.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardTarget for SystemClipboard {
    fn set_image(&self, width: usize, height: usize, rgba: &[u8]) -> Result<(), OutputError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| OutputError::ClipboardUnavailable(e.to_string()))?;

        let image_data = arboard::ImageData {
            width,
            height,
            bytes: Cow::Borrowed(rgba),
        };

        clipboard
            .set_image(image_data)
            .map_err(|e| OutputError::ClipboardWrite(e.to_string()))
    }
}

pub fn to_clipboard<C: ClipboardTarget + ?Sized>(
    target: &C,
    image: &RasterImage,
) -> Result<(), OutputError> {
    let start = std::time::Instant::now();
    target.set_image(
        image.width() as usize,
        image.height() as usize,
        image.as_rgba().as_raw(),
    )?;
    log::info!(
        "[OUTPUT] Copied {}x{} to clipboard in {}ms",
        image.width(),
        image.height(),
        start.elapsed().as_millis()
    );
    Ok(())
}
