//! In-memory stand-ins for the OS: hotkeys, monitors, overlay, clipboard.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use clip_snap_lib::capture::{CaptureError, MonitorRect, ScreenSource, VirtualScreenBounds};
use clip_snap_lib::config::CaptureConfig;
use clip_snap_lib::coordinator::CaptureCoordinator;
use clip_snap_lib::hotkey::{HotkeyBackend, HotkeyBinding, HotkeyError, KeyCode, ModifierSet};
use clip_snap_lib::output::{ClipboardTarget, OutputError};
use clip_snap_lib::session::{OverlayFactory, OverlaySurface, ScaleFactor};
use image::{Rgba, RgbaImage};

// ── Hotkeys ─────────────────────────────────────────────────────────

/// OS hotkey table. Combos in `foreign` belong to some other program.
#[derive(Clone, Default)]
pub struct FakeHotkeys {
    pub foreign: Rc<RefCell<HashSet<(ModifierSet, KeyCode)>>>,
    pub live: Rc<RefCell<HashSet<(ModifierSet, KeyCode)>>>,
}

impl FakeHotkeys {
    pub fn claim_elsewhere(&self, modifiers: ModifierSet, key: KeyCode) {
        self.foreign.borrow_mut().insert((modifiers, key));
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }
}

impl HotkeyBackend for FakeHotkeys {
    fn register(&mut self, binding: &HotkeyBinding) -> Result<(), HotkeyError> {
        let combo = (binding.modifiers, binding.key);
        if self.foreign.borrow().contains(&combo) || !self.live.borrow_mut().insert(combo) {
            return Err(HotkeyError::Conflict {
                combo: binding.to_string(),
            });
        }
        Ok(())
    }

    fn unregister(&mut self, binding: &HotkeyBinding) -> Result<(), HotkeyError> {
        self.live.borrow_mut().remove(&(binding.modifiers, binding.key));
        Ok(())
    }
}

// ── Monitors ────────────────────────────────────────────────────────

/// Fixed monitor layout. Every pixel encodes its virtual-screen position so
/// crops can be checked exactly: R/G hold x and B/A hold y, each offset by
/// `0x8000` so negative coordinates encode too.
///
/// `density` > 1 hands out frames that many times larger than the reported
/// rect, the way a Retina display looks when its layout is read in points.
#[derive(Clone)]
pub struct FakeScreen {
    pub monitors: Vec<MonitorRect>,
    pub density: u32,
    pub fail: bool,
}

impl FakeScreen {
    pub fn new(monitors: Vec<MonitorRect>) -> Self {
        Self {
            monitors,
            density: 1,
            fail: false,
        }
    }

    pub fn single(width: u32, height: u32) -> Self {
        Self::new(vec![monitor(1, 0, 0, width, height)])
    }

    pub fn dense(monitors: Vec<MonitorRect>, density: u32) -> Self {
        Self {
            density,
            ..Self::new(monitors)
        }
    }

    /// Layout reads fine, pixel capture is refused.
    pub fn failing(width: u32, height: u32) -> Self {
        Self {
            fail: true,
            ..Self::single(width, height)
        }
    }
}

pub fn monitor(id: u32, x: i32, y: i32, width: u32, height: u32) -> MonitorRect {
    MonitorRect {
        id,
        x,
        y,
        width,
        height,
    }
}

pub fn encode(vx: i32, vy: i32) -> Rgba<u8> {
    let x = (vx + 0x8000) as u16;
    let y = (vy + 0x8000) as u16;
    Rgba([x as u8, (x >> 8) as u8, y as u8, (y >> 8) as u8])
}

impl ScreenSource for FakeScreen {
    fn monitors(&self) -> Result<Vec<MonitorRect>, CaptureError> {
        Ok(self.monitors.clone())
    }

    fn grab(&self, m: &MonitorRect) -> Result<RgbaImage, CaptureError> {
        if self.fail {
            return Err(CaptureError::CaptureFailed("screen recording denied".into()));
        }
        let d = self.density;
        Ok(RgbaImage::from_fn(m.width * d, m.height * d, |px, py| {
            encode(m.x + (px / d) as i32, m.y + (py / d) as i32)
        }))
    }
}

// ── Overlay ─────────────────────────────────────────────────────────

#[derive(Default)]
pub struct OverlayLog {
    pub presented: Cell<u32>,
    pub closed: Cell<u32>,
    pub last_bounds: Cell<Option<VirtualScreenBounds>>,
}

#[derive(Clone)]
pub struct FakeOverlays {
    pub scale: f64,
    pub fail: bool,
    pub scale_unknown: bool,
    pub log: Rc<OverlayLog>,
}

impl FakeOverlays {
    pub fn with_scale(scale: f64) -> Self {
        Self {
            scale,
            fail: false,
            scale_unknown: false,
            log: Rc::new(OverlayLog::default()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_scale(1.0)
        }
    }

    /// The window opens but cannot report its DPI.
    pub fn without_scale() -> Self {
        Self {
            scale_unknown: true,
            ..Self::with_scale(1.0)
        }
    }
}

pub struct FakeSurface {
    label: String,
    scale: Option<f64>,
    log: Rc<OverlayLog>,
}

impl OverlaySurface for FakeSurface {
    fn label(&self) -> &str {
        &self.label
    }

    fn scale_factor(&self) -> Result<ScaleFactor, CaptureError> {
        self.scale
            .map(ScaleFactor::uniform)
            .ok_or_else(|| CaptureError::Overlay("window has no monitor".into()))
    }

    fn close(&mut self) {
        self.log.closed.set(self.log.closed.get() + 1);
    }
}

impl OverlayFactory for FakeOverlays {
    type Surface = FakeSurface;

    fn present(&self, bounds: &VirtualScreenBounds) -> Result<FakeSurface, CaptureError> {
        if self.fail {
            return Err(CaptureError::Overlay("no display".into()));
        }
        let n = self.log.presented.get() + 1;
        self.log.presented.set(n);
        self.log.last_bounds.set(Some(*bounds));
        Ok(FakeSurface {
            label: format!("overlay-{}", n),
            scale: (!self.scale_unknown).then_some(self.scale),
            log: self.log.clone(),
        })
    }
}

// ── Clipboard ───────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeClipboard {
    pub fail: bool,
    pub images: Rc<RefCell<Vec<(usize, usize, Vec<u8>)>>>,
}

impl FakeClipboard {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn count(&self) -> usize {
        self.images.borrow().len()
    }
}

impl ClipboardTarget for FakeClipboard {
    fn set_image(&self, width: usize, height: usize, rgba: &[u8]) -> Result<(), OutputError> {
        if self.fail {
            return Err(OutputError::ClipboardUnavailable("locked by another app".into()));
        }
        self.images.borrow_mut().push((width, height, rgba.to_vec()));
        Ok(())
    }
}

// ── Coordinator ─────────────────────────────────────────────────────

pub type TestCoordinator = CaptureCoordinator<FakeHotkeys, FakeScreen, FakeOverlays, FakeClipboard>;

/// Config writing into `dir`, clipboard on, both default hotkeys enabled.
pub fn config_in(dir: &std::path::Path) -> CaptureConfig {
    CaptureConfig {
        save_folder_path: dir.to_path_buf(),
        ..CaptureConfig::default()
    }
}

pub fn files_in(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
