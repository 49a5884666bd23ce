//! Screen capture domain — public API.
//!
//! `ScreenCapture` snapshots the whole virtual screen (every monitor, in
//! physical pixels, origin possibly negative) or any absolute region of it.
//! Pixels come from a `ScreenSource`; the real one is `xcap`-backed
//! (`screenshot.rs`), the compositing and cropping is pure (`region.rs`).

mod region;
mod screenshot;

pub use region::{compose, CropError};
pub use screenshot::XcapScreen;

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Rectangle of one attached monitor in virtual-screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorRect {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl MonitorRect {
    fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }
}

/// Union of all monitor rectangles, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualScreenBounds {
    pub origin_x: i32,
    pub origin_y: i32,
    pub width: u32,
    pub height: u32,
}

impl VirtualScreenBounds {
    pub fn union(monitors: &[MonitorRect]) -> Option<Self> {
        let left = monitors.iter().map(|m| m.x as i64).min()?;
        let top = monitors.iter().map(|m| m.y as i64).min()?;
        let right = monitors.iter().map(MonitorRect::right).max()?;
        let bottom = monitors.iter().map(MonitorRect::bottom).max()?;

        Some(Self {
            origin_x: left as i32,
            origin_y: top as i32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }
}

/// Unsigned pixel rectangle inside a `RasterImage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// An owned RGBA8 pixel buffer. Moving it into a sink hands it over; it is
/// never shared mutably and is freed when its owner drops it.
#[derive(Debug, PartialEq)]
pub struct RasterImage {
    pixels: RgbaImage,
}

impl RasterImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.pixels
    }

    /// Copy `rect` out into a new image. The rectangle must lie fully inside.
    pub fn crop(&self, rect: PixelRect) -> Result<RasterImage, CaptureError> {
        region::crop(&self.pixels, rect)
            .map(RasterImage::new)
            .map_err(CaptureError::from)
    }
}

/// Where `ScreenCapture` gets pixels from.
pub trait ScreenSource {
    /// Current monitor layout. Queried fresh on every call.
    fn monitors(&self) -> Result<Vec<MonitorRect>, CaptureError>;

    /// Full-resolution pixels of one monitor. Expected to match the rect's
    /// size; `ScreenCapture` resamples frames that don't.
    fn grab(&self, monitor: &MonitorRect) -> Result<RgbaImage, CaptureError>;
}

pub struct ScreenCapture<S: ScreenSource> {
    source: S,
}

impl<S: ScreenSource> ScreenCapture<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Bounds of the virtual screen right now.
    pub fn virtual_bounds(&self) -> Result<VirtualScreenBounds, CaptureError> {
        let monitors = self.source.monitors()?;
        VirtualScreenBounds::union(&monitors).ok_or(CaptureError::NoMonitors)
    }

    /// Snapshot of the entire virtual screen.
    pub fn capture_all(&self) -> Result<RasterImage, CaptureError> {
        let bounds = self.virtual_bounds()?;
        self.capture_bounds(&bounds)
    }

    /// Snapshot of exactly `bounds`, as previously read by `virtual_bounds`.
    pub fn capture_bounds(&self, bounds: &VirtualScreenBounds) -> Result<RasterImage, CaptureError> {
        self.capture_region(
            bounds.origin_x,
            bounds.origin_y,
            bounds.width as i32,
            bounds.height as i32,
        )
    }

    /// Snapshot of an absolute virtual-screen region. Areas no monitor covers
    /// come back transparent.
    pub fn capture_region(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) -> Result<RasterImage, CaptureError> {
        if width <= 0 || height <= 0 {
            return Err(CaptureError::InvalidRegion { width, height });
        }

        let start = std::time::Instant::now();
        let area = MonitorRect {
            id: 0,
            x,
            y,
            width: width as u32,
            height: height as u32,
        };

        let mut frames = Vec::new();
        for monitor in self.source.monitors()? {
            if intersects(&monitor, &area) {
                let pixels = fit_to(&monitor, self.source.grab(&monitor)?);
                frames.push((monitor, pixels));
            }
        }

        let image = compose(&area, &frames);
        log::info!(
            "[CAPTURE] Captured {}x{} at ({},{}) from {} monitor(s) in {}ms",
            width,
            height,
            x,
            y,
            frames.len(),
            start.elapsed().as_millis()
        );
        Ok(RasterImage::new(image))
    }
}

/// Bring a frame to its monitor's reported size so compositing never clips
/// or leaves gaps. Nearest keeps an integer downscale pixel-exact.
fn fit_to(monitor: &MonitorRect, pixels: RgbaImage) -> RgbaImage {
    if pixels.dimensions() == (monitor.width, monitor.height) {
        return pixels;
    }
    log::warn!(
        "[CAPTURE] Monitor {} is {}x{} but its frame is {}x{}, resampling",
        monitor.id,
        monitor.width,
        monitor.height,
        pixels.width(),
        pixels.height()
    );
    imageops::resize(&pixels, monitor.width, monitor.height, FilterType::Nearest)
}

fn intersects(a: &MonitorRect, b: &MonitorRect) -> bool {
    (a.x as i64) < b.right()
        && (b.x as i64) < a.right()
        && (a.y as i64) < b.bottom()
        && (b.y as i64) < a.bottom()
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No monitors attached")]
    NoMonitors,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("Invalid capture region {width}x{height}")]
    InvalidRegion { width: i32, height: i32 },

    #[error("Could not open the selection overlay: {0}")]
    Overlay(String),

    #[error(transparent)]
    Crop(#[from] CropError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(id: u32, x: i32, y: i32, width: u32, height: u32) -> MonitorRect {
        MonitorRect {
            id,
            x,
            y,
            width,
            height,
        }
    }

    #[test]
    fn union_spans_negative_origins() {
        let bounds = VirtualScreenBounds::union(&[
            monitor(1, 0, 0, 1920, 1080),
            monitor(2, -1280, -200, 1280, 1024),
        ])
        .unwrap();
        assert_eq!(
            bounds,
            VirtualScreenBounds {
                origin_x: -1280,
                origin_y: -200,
                width: 3200,
                height: 1280,
            }
        );
    }

    #[test]
    fn union_of_nothing_is_none() {
        assert_eq!(VirtualScreenBounds::union(&[]), None);
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let left = monitor(1, 0, 0, 100, 100);
        let right = monitor(2, 100, 0, 100, 100);
        assert!(!intersects(&left, &right));
        assert!(intersects(&left, &monitor(3, 99, 99, 10, 10)));
    }

    #[test]
    fn mismatched_frame_is_resampled_to_its_rect() {
        let rect = monitor(1, 0, 0, 4, 3);
        let fitted = fit_to(&rect, RgbaImage::new(8, 6));
        assert_eq!(fitted.dimensions(), (4, 3));

        let exact = RgbaImage::from_pixel(4, 3, image::Rgba([9, 9, 9, 255]));
        assert_eq!(fit_to(&rect, exact.clone()), exact);
    }

    #[test]
    fn crop_outside_the_image_fails() {
        let image = RasterImage::new(RgbaImage::new(20, 20));
        let result = image.crop(PixelRect {
            x: 15,
            y: 0,
            width: 10,
            height: 10,
        });
        assert!(matches!(result, Err(CaptureError::Crop(CropError::OutOfBounds { .. }))));
    }
}
