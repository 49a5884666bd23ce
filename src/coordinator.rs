//! Capture orchestration.
//!
//! Trigger → `SelectionSession` → crop → clipboard (if enabled) → file.
//! At most one session is live; a second trigger while one is unresolved
//! gets `AppError::SessionBusy`. The coordinator owns the hotkey registry,
//! so dropping it or calling `shutdown` releases every OS binding.

use std::path::PathBuf;

use crate::capture::{RasterImage, ScreenCapture, ScreenSource};
use crate::config::CaptureConfig;
use crate::error::AppError;
use crate::hotkey::{HotkeyBackend, HotkeyError, HotkeyRegistry};
use crate::output::{self, ClipboardTarget, OutputError};
use crate::session::{LogicalPoint, OverlayFactory, Resolution, SelectionSession, SelectionView};

/// What the sinks did with a committed capture.
#[derive(Debug)]
pub struct Delivery {
    /// `None` when clipboard copy is disabled.
    pub clipboard: Option<Result<(), OutputError>>,
    pub saved: Result<PathBuf, OutputError>,
}

impl Delivery {
    /// Sink failures worth telling the user about, clipboard first.
    pub fn into_errors(self) -> Vec<AppError> {
        let mut errors = Vec::new();
        if let Some(Err(e)) = self.clipboard {
            errors.push(AppError::from(e));
        }
        if let Err(e) = self.saved {
            errors.push(AppError::from(e));
        }
        errors
    }
}

#[derive(Debug)]
pub enum CaptureOutcome {
    Delivered(Delivery),
    Cancelled,
    TooSmall,
    /// Cropping failed; nothing was delivered.
    Failed(AppError),
}

impl CaptureOutcome {
    pub fn into_errors(self) -> Vec<AppError> {
        match self {
            CaptureOutcome::Delivered(delivery) => delivery.into_errors(),
            CaptureOutcome::Failed(e) => vec![e],
            CaptureOutcome::Cancelled | CaptureOutcome::TooSmall => Vec::new(),
        }
    }
}

pub struct CaptureCoordinator<H, S, O, C>
where
    H: HotkeyBackend,
    S: ScreenSource,
    O: OverlayFactory,
    C: ClipboardTarget,
{
    hotkeys: HotkeyRegistry<H>,
    screen: ScreenCapture<S>,
    overlays: O,
    clipboard: C,
    config: CaptureConfig,
    active: Option<SelectionSession<O::Surface>>,
}

impl<H, S, O, C> CaptureCoordinator<H, S, O, C>
where
    H: HotkeyBackend,
    S: ScreenSource,
    O: OverlayFactory,
    C: ClipboardTarget,
{
    /// Build an idle coordinator. No hotkeys are registered until
    /// `apply_config` runs.
    pub fn new(hotkeys: H, screen: S, overlays: O, clipboard: C, config: CaptureConfig) -> Self {
        Self {
            hotkeys: HotkeyRegistry::new(hotkeys),
            screen: ScreenCapture::new(screen),
            overlays,
            clipboard,
            config,
            active: None,
        }
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn hotkeys(&self) -> &HotkeyRegistry<H> {
        &self.hotkeys
    }

    /// Adopt `config` and re-register hotkeys from it.
    ///
    /// Every existing binding is released first. Returns the slots that
    /// failed to register; the others stay live.
    pub fn apply_config(&mut self, config: CaptureConfig) -> Vec<(u32, HotkeyError)> {
        self.hotkeys.unregister_all();

        let mut failures = Vec::new();
        for (id, slot) in config.enabled_hotkeys() {
            if let Err(e) = self.hotkeys.register(id, slot.modifier_set(), slot.key) {
                failures.push((id, e));
            }
        }

        self.config = config;
        failures
    }

    /// True while a session is waiting for the user.
    pub fn is_busy(&self) -> bool {
        self.active.as_ref().is_some_and(|s| !s.is_resolved())
    }

    /// Snapshot the screen and open the selection overlay.
    ///
    /// Returns as soon as the overlay is up; the outcome arrives through the
    /// pointer/cancel calls.
    pub fn take_screenshot(&mut self) -> Result<(), AppError> {
        if self.is_busy() {
            log::info!("[SESSION] Trigger ignored, a selection is already open");
            return Err(AppError::SessionBusy);
        }

        let session = SelectionSession::begin(&self.screen, &self.overlays)?;
        self.active = Some(session);
        Ok(())
    }

    pub fn pointer_down(&mut self, point: LogicalPoint) -> Option<SelectionView> {
        self.active.as_mut()?.pointer_down(point)
    }

    pub fn pointer_move(&mut self, point: LogicalPoint) -> Option<SelectionView> {
        self.active.as_mut()?.pointer_move(point)
    }

    /// Finish the drag. `None` if no drag was in progress.
    pub fn pointer_up(&mut self, point: LogicalPoint) -> Option<CaptureOutcome> {
        self.active.as_mut()?.pointer_up(point)?;
        let session = self.active.take()?;
        Some(self.finish(session))
    }

    /// Escape pressed in the overlay.
    pub fn cancel(&mut self) -> Option<CaptureOutcome> {
        let mut session = self.active.take()?;
        session.cancel();
        Some(CaptureOutcome::Cancelled)
    }

    /// The overlay window labelled `label` went away without the session
    /// closing it. Cancels the session only if it owns that window.
    pub fn overlay_dismissed(&mut self, label: &str) -> Option<CaptureOutcome> {
        let owns = self
            .active
            .as_ref()
            .and_then(|s| s.overlay_label())
            .is_some_and(|l| l == label);
        if !owns {
            return None;
        }
        log::info!("[SESSION] Overlay {} dismissed externally", label);
        self.cancel()
    }

    /// Cancel any open session and release every hotkey. Idempotent.
    pub fn shutdown(&mut self) {
        if self.active.is_some() {
            self.cancel();
        }
        self.hotkeys.unregister_all();
    }

    fn finish(&self, session: SelectionSession<O::Surface>) -> CaptureOutcome {
        match session.resolution() {
            Some(Resolution::Committed(_)) => {}
            Some(Resolution::TooSmall) => return CaptureOutcome::TooSmall,
            _ => return CaptureOutcome::Cancelled,
        }

        match session.crop() {
            Ok(Some(image)) => CaptureOutcome::Delivered(self.deliver(image)),
            Ok(None) => CaptureOutcome::Cancelled,
            Err(e) => {
                log::error!("[SESSION] Crop failed: {}", e);
                CaptureOutcome::Failed(e.into())
            }
        }
    }

    fn deliver(&self, image: RasterImage) -> Delivery {
        let clipboard = self.config.copy_to_clipboard.then(|| {
            let result = output::to_clipboard(&self.clipboard, &image);
            if let Err(e) = &result {
                log::warn!("[OUTPUT] Clipboard copy failed: {}", e);
            }
            result
        });

        let saved = output::save(image, &self.config.output_descriptor());
        if let Err(e) = &saved {
            log::error!("[OUTPUT] Save failed: {}", e);
        }

        Delivery { clipboard, saved }
    }
}

impl<H, S, O, C> Drop for CaptureCoordinator<H, S, O, C>
where
    H: HotkeyBackend,
    S: ScreenSource,
    O: OverlayFactory,
    C: ClipboardTarget,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}

