//! Tauri-backed selection overlay.
//!
//! One borderless, transparent, always-on-top webview window stretched over
//! the virtual screen in physical pixels. `ui/overlay.html` does the drawing
//! and forwards pointer events back through the `selection_*` commands.

use std::sync::atomic::{AtomicU32, Ordering};

use tauri::{AppHandle, PhysicalPosition, PhysicalSize, Runtime, WebviewUrl, WebviewWindow};

use super::{OverlayFactory, OverlaySurface, ScaleFactor};
use crate::capture::{CaptureError, VirtualScreenBounds};

/// Prefix shared by every overlay window label.
pub const OVERLAY_LABEL_PREFIX: &str = "overlay-";

pub struct WindowOverlays<R: Runtime> {
    app: AppHandle<R>,
    counter: AtomicU32,
}

impl<R: Runtime> WindowOverlays<R> {
    pub fn new(app: AppHandle<R>) -> Self {
        Self {
            app,
            counter: AtomicU32::new(0),
        }
    }

    fn next_label(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}{}", OVERLAY_LABEL_PREFIX, n)
    }
}

fn overlay_err(e: tauri::Error) -> CaptureError {
    CaptureError::Overlay(e.to_string())
}

impl<R: Runtime> OverlayFactory for WindowOverlays<R> {
    type Surface = WindowOverlay<R>;

    fn present(&self, bounds: &VirtualScreenBounds) -> Result<WindowOverlay<R>, CaptureError> {
        let label = self.next_label();
        let window = tauri::WebviewWindowBuilder::new(
            &self.app,
            label.as_str(),
            WebviewUrl::App("overlay.html".into()),
        )
        .title("ClipSnap Selection")
        .decorations(false)
        .transparent(true)
        .always_on_top(true)
        .skip_taskbar(true)
        .resizable(false)
        .shadow(false)
        .visible(false)
        .build()
        .map_err(overlay_err)?;

        let mut overlay = WindowOverlay { window };
        if let Err(e) = overlay.place(bounds) {
            overlay.close();
            return Err(e);
        }

        log::debug!("[SESSION] Presented overlay window {}", label);
        Ok(overlay)
    }
}

pub struct WindowOverlay<R: Runtime> {
    window: WebviewWindow<R>,
}

impl<R: Runtime> WindowOverlay<R> {
    fn place(&self, bounds: &VirtualScreenBounds) -> Result<(), CaptureError> {
        self.window
            .set_position(PhysicalPosition::new(bounds.origin_x, bounds.origin_y))
            .map_err(overlay_err)?;
        self.window
            .set_size(PhysicalSize::new(bounds.width, bounds.height))
            .map_err(overlay_err)?;
        self.window.show().map_err(overlay_err)?;
        self.window.set_focus().map_err(overlay_err)?;
        Ok(())
    }
}

impl<R: Runtime> OverlaySurface for WindowOverlay<R> {
    fn label(&self) -> &str {
        self.window.label()
    }

    fn scale_factor(&self) -> Result<ScaleFactor, CaptureError> {
        self.window
            .scale_factor()
            .map(ScaleFactor::uniform)
            .map_err(overlay_err)
    }

    fn close(&mut self) {
        if let Err(e) = self.window.destroy() {
            log::warn!("[SESSION] Failed to destroy overlay {}: {}", self.window.label(), e);
        }
    }
}
