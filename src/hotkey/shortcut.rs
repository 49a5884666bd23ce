//! `HotkeyBackend` over `tauri-plugin-global-shortcut`.
//!
//! The plugin calls one global handler for every shortcut, so registration
//! keeps a small shared table from the plugin's shortcut id back to our
//! registry id. The handler only reads that table; it never touches the
//! registry itself, which lives behind the coordinator's lock.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tauri::{AppHandle, Runtime};
use tauri_plugin_global_shortcut::{
    GlobalShortcutExt, Modifiers, Shortcut, ShortcutEvent, ShortcutState,
};

use super::{keys, HotkeyBackend, HotkeyBinding, HotkeyError, HotkeyFired, Modifier};

/// Plugin shortcut id → registry id.
#[derive(Clone, Default)]
pub struct ShortcutTable(Arc<Mutex<HashMap<u32, u32>>>);

impl ShortcutTable {
    pub fn lookup(&self, shortcut: &Shortcut) -> Option<u32> {
        self.0.lock().ok()?.get(&shortcut.id()).copied()
    }

    fn insert(&self, shortcut: &Shortcut, id: u32) {
        if let Ok(mut table) = self.0.lock() {
            table.insert(shortcut.id(), id);
        }
    }

    fn remove(&self, shortcut: &Shortcut) {
        if let Ok(mut table) = self.0.lock() {
            table.remove(&shortcut.id());
        }
    }
}

/// Translate a binding into the plugin's shortcut type.
pub fn to_shortcut(binding: &HotkeyBinding) -> Result<Shortcut, HotkeyError> {
    let code = keys::to_code(binding.key).ok_or(HotkeyError::UnsupportedKey(binding.key.0))?;

    let mut mods = Modifiers::empty();
    for modifier in binding.modifiers.iter() {
        mods |= match modifier {
            Modifier::Alt => Modifiers::ALT,
            Modifier::Control => Modifiers::CONTROL,
            Modifier::Shift => Modifiers::SHIFT,
            Modifier::Meta => Modifiers::SUPER,
        };
    }

    let mods = if mods.is_empty() { None } else { Some(mods) };
    Ok(Shortcut::new(mods, code))
}

pub struct ShortcutBackend<R: Runtime> {
    app: AppHandle<R>,
    table: ShortcutTable,
}

impl<R: Runtime> ShortcutBackend<R> {
    pub fn new(app: AppHandle<R>, table: ShortcutTable) -> Self {
        Self { app, table }
    }
}

impl<R: Runtime> HotkeyBackend for ShortcutBackend<R> {
    fn register(&mut self, binding: &HotkeyBinding) -> Result<(), HotkeyError> {
        let shortcut = to_shortcut(binding)?;
        let manager = self.app.global_shortcut();

        if manager.is_registered(shortcut) {
            return Err(HotkeyError::Conflict {
                combo: binding.to_string(),
            });
        }

        manager
            .register(shortcut)
            .map_err(|e| classify(e, binding))?;
        self.table.insert(&shortcut, binding.id);
        Ok(())
    }

    fn unregister(&mut self, binding: &HotkeyBinding) -> Result<(), HotkeyError> {
        let shortcut = to_shortcut(binding)?;
        self.table.remove(&shortcut);
        self.app
            .global_shortcut()
            .unregister(shortcut)
            .map_err(|e| HotkeyError::Registration(e.to_string()))
    }
}

/// Sort a plugin failure into conflict or plain registration error.
///
/// Only `GlobalHotkey` carries the OS result, and only as text, so the
/// conflict check reads that text. Windows (`ERROR_HOTKEY_ALREADY_REGISTERED`)
/// and X11 (`BadAccess` on the key grab) both surface as global-hotkey's
/// "already registered". macOS has no distinct wording; a combination taken
/// there shows up as a generic registration failure.
fn classify(err: tauri_plugin_global_shortcut::Error, binding: &HotkeyBinding) -> HotkeyError {
    use tauri_plugin_global_shortcut::Error;

    match err {
        Error::GlobalHotkey(inner) => {
            let message = inner.to_string();
            if is_conflict_message(&message) {
                HotkeyError::Conflict {
                    combo: binding.to_string(),
                }
            } else {
                HotkeyError::Registration(message)
            }
        }
        other => HotkeyError::Registration(other.to_string()),
    }
}

fn is_conflict_message(message: &str) -> bool {
    message.to_lowercase().contains("already registered")
}

/// Drops auto-repeat presses: a shortcut fires again only after it was released.
#[derive(Debug, Default)]
pub struct RepeatFilter {
    held: HashSet<u32>,
}

impl RepeatFilter {
    pub fn accept(&mut self, shortcut_id: u32, state: ShortcutState) -> bool {
        if state == ShortcutState::Pressed {
            self.held.insert(shortcut_id)
        } else {
            self.held.remove(&shortcut_id);
            false
        }
    }
}

/// Build the plugin handler: filters repeats, resolves the registry id and
/// passes a `HotkeyFired` to `on_fire`. `on_fire` runs on whatever thread the
/// plugin dispatches from and must marshal UI work itself.
pub fn dispatcher<R, F>(
    table: ShortcutTable,
    on_fire: F,
) -> impl Fn(&AppHandle<R>, &Shortcut, ShortcutEvent) + Send + Sync + 'static
where
    R: Runtime,
    F: Fn(&AppHandle<R>, HotkeyFired) + Send + Sync + 'static,
{
    let repeats = Mutex::new(RepeatFilter::default());

    move |app: &AppHandle<R>, shortcut: &Shortcut, event: ShortcutEvent| {
        let fire = repeats
            .lock()
            .map(|mut filter| filter.accept(shortcut.id(), event.state))
            .unwrap_or(false);
        if !fire {
            return;
        }

        match table.lookup(shortcut) {
            Some(id) => {
                log::info!("[HOTKEY] Hotkey {} fired", id);
                on_fire(app, HotkeyFired(id));
            }
            None => log::debug!("[HOTKEY] Ignoring unknown shortcut {}", shortcut.id()),
        }
    }
}
