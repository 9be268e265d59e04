//! Tab state: the resource bundle behind one cached view of a panel.
//!
//! A [`TabState`] wraps exactly one live resource: a terminal attachment with
//! its surface, a file browser, or a git browser. Hiding a tab suspends its
//! rendering and input routing but never touches the resource, so switching
//! back is instant and lossless. Resources are released only through
//! [`TabState::dispose`], which every removal path of the
//! [`TabCache`](cache::TabCache) calls.

pub mod cache;

pub use cache::TabCache;

use crate::attachment::{Attachment, ConnectionState};
use crate::browser::{FileBrowser, GitBrowser};
use crate::event::ResourceId;
use crate::prefs::UiPrefs;
use crate::surface::TerminalSurface;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Which kind of view a panel shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewMode {
    Terminal,
    Files,
    Git,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewMode::Terminal => "terminal",
            ViewMode::Files => "files",
            ViewMode::Git => "git",
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown view mode: {0}")]
pub struct ParseViewModeError(String);

impl FromStr for ViewMode {
    type Err = ParseViewModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "terminal" => Ok(ViewMode::Terminal),
            "files" => Ok(ViewMode::Files),
            "git" => Ok(ViewMode::Git),
            other => Err(ParseViewModeError(other.to_string())),
        }
    }
}

/// Cache key of a tab: view kind, plus window index for terminals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabKey {
    Terminal(u32),
    Files,
    Git,
}

impl TabKey {
    pub fn view_mode(self) -> ViewMode {
        match self {
            TabKey::Terminal(_) => ViewMode::Terminal,
            TabKey::Files => ViewMode::Files,
            TabKey::Git => ViewMode::Git,
        }
    }

    pub fn window_index(self) -> Option<u32> {
        match self {
            TabKey::Terminal(index) => Some(index),
            TabKey::Files | TabKey::Git => None,
        }
    }
}

impl fmt::Display for TabKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabKey::Terminal(index) => write!(f, "terminal:{index}"),
            TabKey::Files => f.write_str("files"),
            TabKey::Git => f.write_str("git"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid tab key: {0}")]
pub struct ParseTabKeyError(String);

impl FromStr for TabKey {
    type Err = ParseTabKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "files" => Ok(TabKey::Files),
            "git" => Ok(TabKey::Git),
            _ => s
                .strip_prefix("terminal:")
                .and_then(|index| index.parse().ok())
                .map(TabKey::Terminal)
                .ok_or_else(|| ParseTabKeyError(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Terminal tab
// ---------------------------------------------------------------------------

/// Attachment plus rendering surface for one window
pub struct TerminalTab {
    attachment: Attachment,
    surface: Box<dyn TerminalSurface>,
    connection_state: ConnectionState,
    title: Option<String>,
    input_routed: bool,
    fitted: (u16, u16),
}

impl TerminalTab {
    /// Wrap a fresh attachment; the surface is initialized from `prefs`
    pub(crate) fn new(
        attachment: Attachment,
        mut surface: Box<dyn TerminalSurface>,
        prefs: &UiPrefs,
        size: (u16, u16),
    ) -> Self {
        surface.apply_prefs(prefs);
        Self {
            connection_state: attachment.state(),
            attachment,
            surface,
            title: None,
            input_routed: false,
            fitted: size,
        }
    }

    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    pub(crate) fn attachment_mut(&mut self) -> &mut Attachment {
        &mut self.attachment
    }

    /// Last state reported by the attachment through the event channel
    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Whether global input is delivered to this tab
    pub fn is_input_routed(&self) -> bool {
        self.input_routed
    }

    /// Geometry the surface and the remote window were last fitted to
    pub fn fitted_size(&self) -> (u16, u16) {
        self.fitted
    }

    pub(crate) fn set_connection_state(&mut self, state: ConnectionState) {
        self.connection_state = state;
        if state == ConnectionState::Connected {
            // The server learns our geometry on every (re)connect
            let (cols, rows) = self.fitted;
            self.attachment.send_resize(cols, rows);
        }
    }

    /// Feed output to the surface. Returns the new title if it changed.
    pub(crate) fn write_output(&mut self, bytes: &[u8]) -> Option<String> {
        self.surface.write_output(bytes);
        let title = self.surface.title();
        if title != self.title {
            self.title = title.clone();
            return title;
        }
        None
    }

    pub(crate) fn set_input_routed(&mut self, routed: bool) {
        self.input_routed = routed;
        self.surface.set_input_enabled(routed);
    }

    pub(crate) fn claim_focus(&mut self) {
        self.surface.claim_focus();
    }

    pub(crate) fn apply_prefs(&mut self, prefs: &UiPrefs) {
        self.surface.apply_prefs(prefs);
    }

    /// Fit surface and remote window to `size` if it changed
    pub(crate) fn fit(&mut self, size: (u16, u16)) {
        if self.fitted == size {
            return;
        }
        self.fitted = size;
        let (cols, rows) = size;
        self.surface.resize(cols, rows);
        self.attachment.send_resize(cols, rows);
    }

    /// Deliver keystrokes if input is routed here. Returns whether it was.
    pub(crate) fn send_input(&self, bytes: &[u8]) -> bool {
        if !self.input_routed {
            return false;
        }
        self.attachment.send_input(bytes);
        true
    }
}

// ---------------------------------------------------------------------------
// Tab state
// ---------------------------------------------------------------------------

/// The one resource a tab owns
pub enum TabResource {
    Terminal(TerminalTab),
    Files(FileBrowser),
    Git(GitBrowser),
}

impl TabResource {
    pub fn resource_id(&self) -> ResourceId {
        match self {
            TabResource::Terminal(tab) => tab.attachment.id(),
            TabResource::Files(browser) => browser.id(),
            TabResource::Git(browser) => browser.id(),
        }
    }
}

pub struct TabState {
    key: TabKey,
    resource: TabResource,
    visible: bool,
}

impl TabState {
    pub(crate) fn new(key: TabKey, resource: TabResource) -> Self {
        Self {
            key,
            resource,
            visible: false,
        }
    }

    pub fn key(&self) -> TabKey {
        self.key
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn resource(&self) -> &TabResource {
        &self.resource
    }

    pub(crate) fn resource_mut(&mut self) -> &mut TabResource {
        &mut self.resource
    }

    pub fn resource_id(&self) -> ResourceId {
        self.resource.resource_id()
    }

    pub fn as_terminal(&self) -> Option<&TerminalTab> {
        match &self.resource {
            TabResource::Terminal(tab) => Some(tab),
            _ => None,
        }
    }

    pub(crate) fn as_terminal_mut(&mut self) -> Option<&mut TerminalTab> {
        match &mut self.resource {
            TabResource::Terminal(tab) => Some(tab),
            _ => None,
        }
    }

    pub fn as_files(&self) -> Option<&FileBrowser> {
        match &self.resource {
            TabResource::Files(browser) => Some(browser),
            _ => None,
        }
    }

    pub(crate) fn as_files_mut(&mut self) -> Option<&mut FileBrowser> {
        match &mut self.resource {
            TabResource::Files(browser) => Some(browser),
            _ => None,
        }
    }

    pub fn as_git(&self) -> Option<&GitBrowser> {
        match &self.resource {
            TabResource::Git(browser) => Some(browser),
            _ => None,
        }
    }

    pub(crate) fn as_git_mut(&mut self) -> Option<&mut GitBrowser> {
        match &mut self.resource {
            TabResource::Git(browser) => Some(browser),
            _ => None,
        }
    }

    /// Make visible: resume rendering, refit, and route input if `focused`
    pub(crate) fn show(&mut self, focused: bool, size: (u16, u16)) {
        self.visible = true;
        if let TabResource::Terminal(tab) = &mut self.resource {
            tab.surface.resume();
            tab.fit(size);
            tab.set_input_routed(focused);
            if focused {
                tab.claim_focus();
            }
        }
    }

    /// Hide without releasing anything
    pub(crate) fn hide(&mut self) {
        self.visible = false;
        if let TabResource::Terminal(tab) = &mut self.resource {
            tab.surface.suspend();
            tab.set_input_routed(false);
        }
    }

    /// Release the resource: disconnect the attachment or abort browser requests
    pub(crate) fn dispose(&mut self) {
        self.visible = false;
        match &mut self.resource {
            TabResource::Terminal(tab) => {
                tab.attachment.disconnect();
                tab.input_routed = false;
                tab.surface.dispose();
            }
            TabResource::Files(browser) => browser.dispose(),
            TabResource::Git(browser) => browser.dispose(),
        }
        log::debug!("Disposed tab {}", self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_key_display_and_parse() {
        for key in [TabKey::Terminal(0), TabKey::Terminal(12), TabKey::Files, TabKey::Git] {
            assert_eq!(key.to_string().parse::<TabKey>(), Ok(key));
        }
        assert_eq!(TabKey::Terminal(3).to_string(), "terminal:3");
    }

    #[test]
    fn test_tab_key_rejects_garbage() {
        assert!("terminal:".parse::<TabKey>().is_err());
        assert!("terminal:-1".parse::<TabKey>().is_err());
        assert!("shell".parse::<TabKey>().is_err());
    }

    #[test]
    fn test_tab_key_view_mode() {
        assert_eq!(TabKey::Terminal(1).view_mode(), ViewMode::Terminal);
        assert_eq!(TabKey::Terminal(1).window_index(), Some(1));
        assert_eq!(TabKey::Git.view_mode(), ViewMode::Git);
        assert_eq!(TabKey::Files.window_index(), None);
    }

    #[test]
    fn test_view_mode_roundtrip() {
        for mode in [ViewMode::Terminal, ViewMode::Files, ViewMode::Git] {
            assert_eq!(mode.to_string().parse::<ViewMode>(), Ok(mode));
        }
        assert!("diff".parse::<ViewMode>().is_err());
    }
}
