//! Global hotkey registry.
//!
//! Binds small numeric ids to key combinations at the OS level and turns
//! OS key-press notifications back into `HotkeyFired(id)`. The OS table is
//! process-global, so exactly one `HotkeyRegistry` owns it; everything else
//! borrows the registry through the coordinator.
//!
//! The OS side sits behind `HotkeyBackend` (see `shortcut.rs` for the
//! global-shortcut plugin implementation).

pub mod keys;
pub mod shortcut;

pub use keys::{KeyCode, Modifier, ModifierSet};

use std::collections::BTreeMap;
use std::fmt;

/// One id ↔ key combination binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub id: u32,
    pub modifiers: ModifierSet,
    pub key: KeyCode,
    /// A held combination fires once, not once per auto-repeat.
    pub no_repeat: bool,
}

impl HotkeyBinding {
    fn same_combination(&self, modifiers: ModifierSet, key: KeyCode) -> bool {
        self.modifiers == modifiers && self.key == key
    }
}

impl fmt::Display for HotkeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

/// Notification that the combination bound to the wrapped id was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyFired(pub u32);

/// OS-level registration of a single binding.
pub trait HotkeyBackend {
    /// Must return `HotkeyError::Conflict` when the combination is already
    /// owned elsewhere, so callers can tell it apart from other failures.
    fn register(&mut self, binding: &HotkeyBinding) -> Result<(), HotkeyError>;

    fn unregister(&mut self, binding: &HotkeyBinding) -> Result<(), HotkeyError>;
}

pub struct HotkeyRegistry<B: HotkeyBackend> {
    backend: B,
    bindings: BTreeMap<u32, HotkeyBinding>,
}

impl<B: HotkeyBackend> HotkeyRegistry<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            bindings: BTreeMap::new(),
        }
    }

    /// Bind `id` to `modifiers + key`.
    ///
    /// An id that is already bound is unbound first. Conflicts are returned
    /// as-is and never retried: the other owner's registration is live.
    pub fn register(
        &mut self,
        id: u32,
        modifiers: ModifierSet,
        key: KeyCode,
    ) -> Result<(), HotkeyError> {
        if id == 0 {
            return Err(HotkeyError::InvalidId);
        }

        if self.bindings.contains_key(&id) {
            self.unregister(id);
        }

        let binding = HotkeyBinding {
            id,
            modifiers,
            key,
            no_repeat: true,
        };

        if let Some(owner) = self
            .bindings
            .values()
            .find(|b| b.same_combination(modifiers, key))
        {
            log::warn!(
                "[HOTKEY] {} requested for id {} but already bound to id {}",
                binding,
                id,
                owner.id
            );
            return Err(HotkeyError::Conflict {
                combo: binding.to_string(),
            });
        }

        match self.backend.register(&binding) {
            Ok(()) => {
                log::info!("[HOTKEY] Registered {} as id {}", binding, id);
                self.bindings.insert(id, binding);
                Ok(())
            }
            Err(e) => {
                log::warn!("[HOTKEY] Registering {} as id {} failed: {}", binding, id, e);
                Err(e)
            }
        }
    }

    /// Release `id`. Unknown ids are ignored.
    pub fn unregister(&mut self, id: u32) {
        if let Some(binding) = self.bindings.remove(&id) {
            match self.backend.unregister(&binding) {
                Ok(()) => log::info!("[HOTKEY] Unregistered id {} ({})", id, binding),
                Err(e) => log::warn!("[HOTKEY] Unregistering id {} failed: {}", id, e),
            }
        }
    }

    /// Release every binding. Safe to call repeatedly and after a partial setup.
    pub fn unregister_all(&mut self) {
        let ids: Vec<u32> = self.bindings.keys().copied().collect();
        for id in ids {
            self.unregister(id);
        }
    }

    pub fn binding(&self, id: u32) -> Option<&HotkeyBinding> {
        self.bindings.get(&id)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &HotkeyBinding> {
        self.bindings.values()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: HotkeyBackend> Drop for HotkeyRegistry<B> {
    fn drop(&mut self) {
        self.unregister_all();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("Hotkey id must be a positive integer")]
    InvalidId,

    #[error("{combo} is already registered")]
    Conflict { combo: String },

    #[error("Key code 0x{0:02X} cannot be used as a global hotkey")]
    UnsupportedKey(u32),

    #[error("{0}")]
    Registration(String),
}
