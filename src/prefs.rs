//! Shared UI preferences.
//!
//! One record per controller, referenced by every panel. Panels write it when
//! their toolbar changes; new terminal tabs read it to initialize their own
//! toolbar.

use panemux_config::{Config, KeyboardMode};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiPrefs {
    pub toolbar_visible: bool,
    pub keyboard_mode: KeyboardMode,
    /// Sticky modifier on the toolbar (ctrl/alt latch)
    pub modifier_lock: bool,
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self {
            toolbar_visible: true,
            keyboard_mode: KeyboardMode::default(),
            modifier_lock: false,
        }
    }
}

impl UiPrefs {
    pub fn from_config(config: &Config) -> Self {
        Self {
            toolbar_visible: config.toolbar_visible,
            keyboard_mode: config.keyboard_mode,
            modifier_lock: false,
        }
    }
}

/// Cloneable handle to the one preferences record
#[derive(Debug, Clone, Default)]
pub struct SharedPrefs(Arc<RwLock<UiPrefs>>);

impl SharedPrefs {
    pub fn new(prefs: UiPrefs) -> Self {
        Self(Arc::new(RwLock::new(prefs)))
    }

    /// Copy of the current values
    pub fn snapshot(&self) -> UiPrefs {
        *self.0.read()
    }

    /// Mutate the record in place, returning the updated values
    pub fn update(&self, f: impl FnOnce(&mut UiPrefs)) -> UiPrefs {
        let mut prefs = self.0.write();
        f(&mut prefs);
        *prefs
    }

    pub fn set_toolbar_visible(&self, visible: bool) {
        self.update(|p| p.toolbar_visible = visible);
    }

    pub fn set_keyboard_mode(&self, mode: KeyboardMode) {
        self.update(|p| p.keyboard_mode = mode);
    }

    pub fn set_modifier_lock(&self, locked: bool) {
        self.update(|p| p.modifier_lock = locked);
    }
}
