//! Monitor enumeration and capture using the `xcap` crate.
//!
//! This is the infrastructure layer — it talks to the OS. Nothing here is
//! cached: the layout is re-read on every call so monitors attached or
//! removed between sessions are picked up.

use image::RgbaImage;
use xcap::Monitor;

use super::{CaptureError, MonitorRect, ScreenSource};

#[derive(Debug, Default, Clone, Copy)]
pub struct XcapScreen;

impl XcapScreen {
    /// Monitor rectangle in physical pixels.
    fn describe(monitor: &Monitor) -> Result<MonitorRect, CaptureError> {
        let err = |e: xcap::XCapError| CaptureError::MonitorEnumeration(e.to_string());
        let scale = Self::pixels_per_unit(monitor)?;
        let px = |v: f64| (v * scale).round();

        Ok(MonitorRect {
            id: monitor.id().map_err(err)?,
            x: px(monitor.x().map_err(err)? as f64) as i32,
            y: px(monitor.y().map_err(err)? as f64) as i32,
            width: px(monitor.width().map_err(err)? as f64) as u32,
            height: px(monitor.height().map_err(err)? as f64) as u32,
        })
    }

    /// macOS geometry comes back in points while `capture_image` is in
    /// backing pixels.
    #[cfg(target_os = "macos")]
    fn pixels_per_unit(monitor: &Monitor) -> Result<f64, CaptureError> {
        let scale = monitor
            .scale_factor()
            .map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;
        Ok(if scale > 0.0 { scale as f64 } else { 1.0 })
    }

    /// Windows and X11 already report pixels for a DPI-aware process.
    #[cfg(not(target_os = "macos"))]
    fn pixels_per_unit(_monitor: &Monitor) -> Result<f64, CaptureError> {
        Ok(1.0)
    }
}

impl ScreenSource for XcapScreen {
    fn monitors(&self) -> Result<Vec<MonitorRect>, CaptureError> {
        let monitors =
            Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;

        monitors.iter().map(Self::describe).collect()
    }

    fn grab(&self, target: &MonitorRect) -> Result<RgbaImage, CaptureError> {
        let monitors =
            Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;

        let monitor = monitors
            .into_iter()
            .find(|m| m.id().map(|id| id == target.id).unwrap_or(false))
            .ok_or_else(|| {
                CaptureError::CaptureFailed(format!("monitor {} disappeared", target.id))
            })?;

        monitor
            .capture_image()
            .map_err(|e| CaptureError::CaptureFailed(e.to_string()))
    }
}
