//! One interactive region selection.
//!
//! A session owns the full-screen snapshot and the overlay surface for its
//! whole life. Pointer callbacks drive an explicit state machine:
//!
//! ```text
//! Capturing → AwaitingFirstPoint → Dragging → Resolved(Committed | Cancelled | TooSmall)
//! ```
//!
//! Entering `Resolved` closes the overlay. Cancelled and TooSmall drop the
//! snapshot on the spot; Committed keeps it only until `crop` consumes the
//! session. `Drop` closes the overlay if nothing else did.

pub mod geometry;
pub mod overlay;

pub use geometry::{LogicalPoint, LogicalRect, PhysicalRect, ScaleFactor};
pub use overlay::{WindowOverlay, WindowOverlays};

use serde::Serialize;

use crate::capture::{CaptureError, PixelRect, RasterImage, ScreenCapture, ScreenSource, VirtualScreenBounds};

/// Selections narrower or shorter than this (physical pixels) are dropped.
pub const MIN_SELECTION_PX: i32 = 10;

/// A presented overlay window.
pub trait OverlaySurface {
    /// Identifies this surface in dismissal notifications.
    fn label(&self) -> &str;

    fn scale_factor(&self) -> Result<ScaleFactor, CaptureError>;

    /// Hide and tear down. Called at most once per surface.
    fn close(&mut self);
}

/// Creates overlay surfaces spanning the virtual screen.
pub trait OverlayFactory {
    type Surface: OverlaySurface;

    fn present(&self, bounds: &VirtualScreenBounds) -> Result<Self::Surface, CaptureError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Capturing,
    AwaitingFirstPoint,
    Dragging {
        anchor: LogicalPoint,
        current: LogicalPoint,
    },
    Resolved(Resolution),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Clamped physical rectangle inside the snapshot.
    Committed(PixelRect),
    Cancelled,
    TooSmall,
}

/// What the overlay should paint while dragging.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionView {
    pub rect: LogicalRect,
    pub readout: String,
}

pub struct SelectionSession<O: OverlaySurface> {
    state: SessionState,
    bounds: VirtualScreenBounds,
    scale: ScaleFactor,
    snapshot: Option<RasterImage>,
    overlay: Option<O>,
}

impl<O: OverlaySurface> SelectionSession<O> {
    /// Read the virtual screen, snapshot it and present the overlay.
    ///
    /// On failure nothing is left behind: the snapshot is dropped and a
    /// half-built overlay is closed before the error is returned.
    pub fn begin<S, F>(screen: &ScreenCapture<S>, overlays: &F) -> Result<Self, CaptureError>
    where
        S: ScreenSource,
        F: OverlayFactory<Surface = O>,
    {
        let bounds = screen.virtual_bounds()?;
        let snapshot = screen.capture_bounds(&bounds)?;

        let mut session = Self {
            state: SessionState::Capturing,
            bounds,
            scale: ScaleFactor::default(),
            snapshot: Some(snapshot),
            overlay: None,
        };

        let overlay = match overlays.present(&bounds) {
            Ok(overlay) => overlay,
            Err(e) => {
                session.resolve(Resolution::Cancelled);
                return Err(e);
            }
        };
        let scale = overlay.scale_factor();
        session.overlay = Some(overlay);

        match scale {
            Ok(scale) => session.scale = scale,
            Err(e) => {
                session.resolve(Resolution::Cancelled);
                return Err(e);
            }
        }

        log::info!(
            "[SESSION] Overlay live over {}x{} at ({},{}), scale {}x{}",
            bounds.width,
            bounds.height,
            bounds.origin_x,
            bounds.origin_y,
            session.scale.x,
            session.scale.y
        );
        session.state = SessionState::AwaitingFirstPoint;
        Ok(session)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn bounds(&self) -> VirtualScreenBounds {
        self.bounds
    }

    pub fn scale(&self) -> ScaleFactor {
        self.scale
    }

    pub fn resolution(&self) -> Option<Resolution> {
        match self.state {
            SessionState::Resolved(resolution) => Some(resolution),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution().is_some()
    }

    pub fn holds_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn overlay_label(&self) -> Option<&str> {
        self.overlay.as_ref().map(|o| o.label())
    }

    pub fn pointer_down(&mut self, point: LogicalPoint) -> Option<SelectionView> {
        if self.state != SessionState::AwaitingFirstPoint {
            return None;
        }
        self.state = SessionState::Dragging {
            anchor: point,
            current: point,
        };
        Some(self.view(point, point))
    }

    /// Track the pointer. Pure arithmetic only; this runs per mouse move.
    pub fn pointer_move(&mut self, point: LogicalPoint) -> Option<SelectionView> {
        let SessionState::Dragging { anchor, .. } = self.state else {
            return None;
        };
        self.state = SessionState::Dragging {
            anchor,
            current: point,
        };
        Some(self.view(anchor, point))
    }

    pub fn pointer_up(&mut self, point: LogicalPoint) -> Option<Resolution> {
        let SessionState::Dragging { anchor, .. } = self.state else {
            return None;
        };

        let logical = LogicalRect::between(anchor, point);
        let physical = logical.to_physical(self.scale);
        log::debug!("[SESSION] Logical {:?} -> physical {:?}", logical, physical);

        if !physical.meets_minimum(MIN_SELECTION_PX) {
            return Some(self.resolve(Resolution::TooSmall));
        }

        let (width, height) = self
            .snapshot
            .as_ref()
            .map(|s| (s.width(), s.height()))
            .unwrap_or((0, 0));
        let clamped = physical.clamp_to(width, height);
        Some(self.resolve(Resolution::Committed(clamped)))
    }

    /// Escape or overlay dismissal. No-op once resolved.
    pub fn cancel(&mut self) -> Option<Resolution> {
        if self.is_resolved() {
            return None;
        }
        Some(self.resolve(Resolution::Cancelled))
    }

    /// Consume a committed session, cropping its rectangle out of the
    /// snapshot. Returns `None` for any other outcome. The snapshot is
    /// released when this returns, success or not.
    pub fn crop(mut self) -> Result<Option<RasterImage>, CaptureError> {
        let Some(Resolution::Committed(rect)) = self.resolution() else {
            return Ok(None);
        };
        let Some(snapshot) = self.snapshot.take() else {
            return Ok(None);
        };

        let start = std::time::Instant::now();
        let cropped = snapshot.crop(rect)?;
        log::info!(
            "[SESSION] Cropped {}x{} at ({},{}) in {}ms",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            start.elapsed().as_millis()
        );
        Ok(Some(cropped))
    }

    fn view(&self, anchor: LogicalPoint, current: LogicalPoint) -> SelectionView {
        let rect = LogicalRect::between(anchor, current);
        SelectionView {
            rect,
            readout: geometry::dimension_readout(&rect, self.scale),
        }
    }

    fn resolve(&mut self, resolution: Resolution) -> Resolution {
        self.state = SessionState::Resolved(resolution);
        self.teardown_overlay();
        if !matches!(resolution, Resolution::Committed(_)) {
            self.snapshot = None;
        }
        log::info!("[SESSION] Resolved: {:?}", resolution);
        resolution
    }

    fn teardown_overlay(&mut self) {
        if let Some(mut overlay) = self.overlay.take() {
            overlay.close();
        }
    }
}

impl<O: OverlaySurface> Drop for SelectionSession<O> {
    fn drop(&mut self) {
        self.teardown_overlay();
    }
}
