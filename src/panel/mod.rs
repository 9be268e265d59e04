//! Panels: one visible pane with its own tab cache.
//!
//! A [`Panel`] is bound to at most one session at a time and shows exactly
//! one of its cached tabs. View switches resolve against the [`TabCache`]:
//! a cached tab is shown as-is, a missing one is created and starts loading.
//! Changing session discards the whole cache first.
//!
//! Events from the panel's resources arrive via [`Panel::handle_event`].
//! Every event updates its tab, but only events from the active tab are
//! forwarded to the controller as [`PanelNotice`]s.

pub mod manager;

pub use manager::{Collaborators, LayoutSnapshot, ManagerOptions, PanelManager, PanelSlot, SplitOptions};

use crate::attachment::{Attachment, AttachmentEvent, BackoffPolicy, ConnectionState};
use crate::browser::{BrowserEvent, DEFAULT_PATH, Fetcher, FileBrowser, GitBrowser, Services};
use crate::event::{CoreEvent, EventSender, NoticeSender, PanelNotice, ResourceIds};
use crate::prefs::{SharedPrefs, UiPrefs};
use crate::surface::SurfaceFactory;
use crate::tab::{TabCache, TabKey, TabResource, TabState, TerminalTab, ViewMode};
use crate::transport::Connector;
use panemux_config::{StateStore, keys};
use panemux_protocol::AttachTarget;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Slot a panel occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelId {
    Left,
    Right,
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PanelId::Left => "left",
            PanelId::Right => "right",
        })
    }
}

/// Everything a panel needs to build and wire up resources
pub(crate) struct PanelContext {
    pub runtime: Handle,
    pub connector: Arc<dyn Connector>,
    pub surfaces: Arc<dyn SurfaceFactory>,
    pub services: Services,
    pub store: Arc<dyn StateStore>,
    pub prefs: SharedPrefs,
    pub policy: BackoffPolicy,
    pub ids: ResourceIds,
    pub events: EventSender,
    pub notices: NoticeSender,
}

pub struct Panel {
    id: PanelId,
    ctx: Arc<PanelContext>,
    session: Option<String>,
    window_index: Option<u32>,
    view_mode: ViewMode,
    focused: bool,
    cache: TabCache,
    size: (u16, u16),
}

impl Panel {
    pub(crate) fn new(id: PanelId, ctx: Arc<PanelContext>, size: (u16, u16)) -> Self {
        Self {
            id,
            ctx,
            session: None,
            window_index: None,
            view_mode: ViewMode::Terminal,
            focused: false,
            cache: TabCache::new(),
            size,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn window_index(&self) -> Option<u32> {
        self.window_index
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn cache(&self) -> &TabCache {
        &self.cache
    }

    pub fn active_tab(&self) -> Option<&TabState> {
        self.cache.active()
    }

    /// Terminal geometry the panel fits its visible terminal to
    pub fn size(&self) -> (u16, u16) {
        self.size
    }

    /// Connection indicator: the terminal tab of the current window
    pub fn connection_state(&self) -> ConnectionState {
        self.window_index
            .and_then(|index| self.cache.get(TabKey::Terminal(index)))
            .and_then(TabState::as_terminal)
            .map_or(ConnectionState::Disconnected, TerminalTab::connection_state)
    }

    /// True when bound to a session and its current window has a terminal tab
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
            && self
                .window_index
                .is_some_and(|index| self.cache.contains(TabKey::Terminal(index)))
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Show the terminal for `window_index` of `session`
    ///
    /// A different session tears down the whole cache first.
    pub fn connect_to_window(&mut self, session: &str, window_index: u32) {
        self.enter_session(session);
        let changed = self.window_index != Some(window_index);
        self.switch_to_tab(TabKey::Terminal(window_index));
        if changed {
            self.notify(PanelNotice::ClientStatus {
                panel: self.id,
                session: session.to_string(),
                window_index,
            });
        }
    }

    /// Show the file browser, navigating to `path` if it was already open
    pub fn show_file_browser(&mut self, session: &str, path: Option<&str>) {
        self.enter_session(session);
        match self.cache.get_mut(TabKey::Files).and_then(TabState::as_files_mut) {
            Some(browser) => {
                if let Some(path) = path
                    && path != browser.path()
                {
                    browser.navigate(path);
                }
            }
            None => {
                let tab = self.create_files_tab(path);
                self.cache.insert(tab);
            }
        }
        self.switch_to_tab(TabKey::Files);
    }

    pub fn show_git_browser(&mut self, session: &str) {
        self.enter_session(session);
        self.switch_to_tab(TabKey::Git);
    }

    /// Back to the terminal of the current window; no-op before any connect
    pub fn show_terminal_view(&mut self) {
        if let Some(index) = self.window_index {
            self.switch_to_tab(TabKey::Terminal(index));
        }
    }

    /// Make `key` the visible tab, creating it on first use
    ///
    /// No-op if `key` is already active or the panel has no session.
    pub fn switch_to_tab(&mut self, key: TabKey) {
        if self.session.is_none() {
            log::debug!("Panel {}: switch to {} ignored, no session", self.id, key);
            return;
        }
        if self.cache.active_key() == Some(key) {
            return;
        }

        if let Some(active) = self.cache.active_mut() {
            active.hide();
        }
        if !self.cache.contains(key) {
            let tab = self.create_tab(key);
            self.cache.insert(tab);
        }
        self.cache.set_active(Some(key));
        let (focused, size) = (self.focused, self.size);
        if let Some(tab) = self.cache.get_mut(key) {
            tab.show(focused, size);
        }
        log::debug!("Panel {} showing {}", self.id, key);

        if let Some(index) = key.window_index() {
            self.window_index = Some(index);
        }
        self.set_view_mode(key.view_mode());
        self.announce_active();
    }

    /// Dispose a cached tab that is not currently shown
    pub fn close_tab(&mut self, key: TabKey) -> bool {
        if self.cache.active_key() == Some(key) {
            return false;
        }
        self.cache.remove(key)
    }

    /// Dispose every cached tab and forget the session
    ///
    /// The view mode is left as the controller last saw it, so the next
    /// switch is reported against that.
    pub fn cleanup(&mut self) {
        if !self.cache.is_empty() {
            log::info!("Panel {} releasing {} tabs", self.id, self.cache.len());
        }
        self.cache.clear();
        self.session = None;
        self.window_index = None;
    }

    // ========================================================================
    // Browser actions on the cached tabs
    // ========================================================================

    /// Navigate the cached file browser
    pub fn navigate_files(&mut self, path: &str) {
        if let Some(browser) = self.cache.get_mut(TabKey::Files).and_then(TabState::as_files_mut) {
            browser.navigate(path);
        }
    }

    pub fn files_parent(&mut self) {
        if let Some(browser) = self.cache.get_mut(TabKey::Files).and_then(TabState::as_files_mut) {
            browser.parent();
        }
    }

    /// Reload the active browser tab; no-op on terminals
    pub fn refresh(&mut self) {
        match self.cache.active_mut().map(TabState::resource_mut) {
            Some(TabResource::Files(browser)) => browser.refresh(),
            Some(TabResource::Git(browser)) => browser.refresh(),
            _ => {}
        }
    }

    pub fn select_commit(&mut self, hash: &str) {
        if let Some(browser) = self.cache.get_mut(TabKey::Git).and_then(TabState::as_git_mut) {
            browser.select_commit(hash);
        }
    }

    pub fn show_file_diff(&mut self, path: &str) {
        if let Some(browser) = self.cache.get_mut(TabKey::Git).and_then(TabState::as_git_mut) {
            browser.show_file_diff(path);
        }
    }

    /// Back to the bare commit log
    pub fn close_diff(&mut self) {
        if let Some(browser) = self.cache.get_mut(TabKey::Git).and_then(TabState::as_git_mut) {
            browser.close_diff();
        }
    }

    // ========================================================================
    // Terminal plumbing
    // ========================================================================

    /// Deliver keystrokes to the active terminal tab if it routes input
    pub fn send_input(&self, bytes: &[u8]) -> bool {
        self.cache
            .active()
            .and_then(TabState::as_terminal)
            .is_some_and(|tab| tab.send_input(bytes))
    }

    /// New geometry; only the visible terminal is refit now, others when shown
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.size = (cols, rows);
        if let Some(tab) = self.cache.active_mut().and_then(TabState::as_terminal_mut) {
            tab.fit((cols, rows));
        }
    }

    /// Manual reconnect of the current window's attachment
    pub fn reconnect_now(&mut self) {
        let Some(index) = self.window_index else {
            return;
        };
        if let Some(tab) = self
            .cache
            .get_mut(TabKey::Terminal(index))
            .and_then(TabState::as_terminal_mut)
        {
            tab.attachment_mut().reconnect_now();
        }
    }

    /// Fan a connectivity-restored signal out to every cached attachment
    pub fn network_restored(&self) {
        for tab in self.cache.iter().filter_map(TabState::as_terminal) {
            tab.attachment().network_restored();
        }
    }

    /// Write the shared toolbar preferences and refresh the visible terminal
    pub fn update_prefs(&mut self, f: impl FnOnce(&mut UiPrefs)) {
        let prefs = self.ctx.prefs.update(f);
        if let Some(tab) = self.cache.active_mut().and_then(TabState::as_terminal_mut) {
            tab.apply_prefs(&prefs);
        }
    }

    // ========================================================================
    // Crate-internal: focus, identity, events
    // ========================================================================

    pub(crate) fn set_focused(&mut self, focused: bool) {
        if self.focused == focused {
            return;
        }
        self.focused = focused;
        let view_mode = self.view_mode;
        if let Some(tab) = self.cache.active_mut().and_then(TabState::as_terminal_mut) {
            tab.set_input_routed(focused);
            if focused && view_mode == ViewMode::Terminal {
                tab.claim_focus();
            }
        }
    }

    pub(crate) fn set_id(&mut self, id: PanelId) {
        self.id = id;
    }

    /// Route an event to the tab owning its resource. Returns false if no tab does.
    pub(crate) fn handle_event(&mut self, event: CoreEvent) -> bool {
        let active = self.cache.active_key();
        let (id, notice) = match event {
            CoreEvent::Attachment { id, event } => {
                let Some(tab) = self.cache.find_by_resource_mut(id) else {
                    return false;
                };
                let is_active = Some(tab.key()) == active;
                let Some(terminal) = tab.as_terminal_mut() else {
                    return true;
                };
                let notice = match event {
                    AttachmentEvent::StateChanged(state) => {
                        let changed = terminal.connection_state() != state;
                        terminal.set_connection_state(state);
                        // Already announced when the tab became active
                        (is_active && changed).then_some(PanelNotice::ConnectionState {
                            panel: self.id,
                            state,
                        })
                    }
                    AttachmentEvent::Output(bytes) => terminal
                        .write_output(&bytes)
                        .filter(|_| is_active)
                        .map(|title| PanelNotice::TitleChanged {
                            panel: self.id,
                            title,
                        }),
                };
                (id, notice)
            }
            CoreEvent::Browser { id, event } => {
                let Some(tab) = self.cache.find_by_resource_mut(id) else {
                    return false;
                };
                apply_browser_event(tab, event);
                (id, None)
            }
        };

        log::trace!("Panel {} handled event from resource {}", self.id, id);
        if let Some(notice) = notice {
            self.notify(notice);
        }
        true
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Bind to `session`, discarding everything cached for another one
    fn enter_session(&mut self, session: &str) {
        if self.session.as_deref() == Some(session) {
            return;
        }
        if let Some(previous) = &self.session {
            log::info!("Panel {} leaving session {} for {}", self.id, previous, session);
        }
        let had_session = self.session.is_some();
        self.cleanup();
        self.session = Some(session.to_string());
        if had_session {
            // The old session's title must not outlive its tabs
            self.notify(PanelNotice::TitleChanged {
                panel: self.id,
                title: String::new(),
            });
        }
    }

    /// Persist `mode` as the session's last view; notify only on a change
    fn set_view_mode(&mut self, mode: ViewMode) {
        if let Some(session) = &self.session {
            self.ctx.store.set(&keys::last_view(session), &mode.to_string());
        }
        if self.view_mode == mode {
            return;
        }
        self.view_mode = mode;
        self.notify(PanelNotice::ViewModeChanged {
            panel: self.id,
            mode,
        });
    }

    /// Tell the controller the state of the tab that just became active
    fn announce_active(&self) {
        let Some(tab) = self.cache.active().and_then(TabState::as_terminal) else {
            return;
        };
        self.notify(PanelNotice::ConnectionState {
            panel: self.id,
            state: tab.connection_state(),
        });
        if let Some(title) = tab.title() {
            self.notify(PanelNotice::TitleChanged {
                panel: self.id,
                title: title.to_string(),
            });
        }
    }

    fn create_tab(&mut self, key: TabKey) -> TabState {
        match key {
            TabKey::Terminal(index) => self.create_terminal_tab(index),
            TabKey::Files => self.create_files_tab(None),
            TabKey::Git => self.create_git_tab(),
        }
    }

    fn create_terminal_tab(&self, window_index: u32) -> TabState {
        let session = self.session.clone().unwrap_or_default();
        let target = AttachTarget::new(session, window_index);
        let (cols, rows) = self.size;
        let surface = self.ctx.surfaces.create(&target, cols, rows);
        let mut attachment = Attachment::new(
            self.ctx.ids.next_id(),
            target,
            Arc::clone(&self.ctx.connector),
            self.ctx.policy,
            self.ctx.runtime.clone(),
            self.ctx.events.clone(),
        );
        log::info!(
            "Panel {} opening attachment {} for {}",
            self.id,
            attachment.id(),
            attachment.target()
        );
        attachment.connect();

        let prefs = self.ctx.prefs.snapshot();
        let tab = TerminalTab::new(attachment, surface, &prefs, self.size);
        TabState::new(TabKey::Terminal(window_index), TabResource::Terminal(tab))
    }

    fn create_files_tab(&self, path: Option<&str>) -> TabState {
        let session = self.session.clone().unwrap_or_default();
        let mut browser = FileBrowser::new(
            self.fetcher(),
            session,
            Arc::clone(&self.ctx.services.directory),
        );
        browser.navigate(path.unwrap_or(DEFAULT_PATH));
        TabState::new(TabKey::Files, TabResource::Files(browser))
    }

    fn create_git_tab(&self) -> TabState {
        let session = self.session.clone().unwrap_or_default();
        let mut browser = GitBrowser::new(
            self.fetcher(),
            session,
            Arc::clone(&self.ctx.services.repository),
        );
        browser.refresh();
        TabState::new(TabKey::Git, TabResource::Git(browser))
    }

    fn fetcher(&self) -> Fetcher {
        Fetcher::new(
            self.ctx.ids.next_id(),
            self.ctx.runtime.clone(),
            self.ctx.events.clone(),
        )
    }

    fn notify(&self, notice: PanelNotice) {
        let _ = self.ctx.notices.send(notice);
    }
}

fn apply_browser_event(tab: &mut TabState, event: BrowserEvent) {
    let key = tab.key();
    let applied = match tab.resource_mut() {
        TabResource::Files(browser) => browser.apply(event),
        TabResource::Git(browser) => browser.apply(event),
        TabResource::Terminal(_) => false,
    };
    if applied {
        log::trace!("Applied browser result to {}", key);
    }
}

impl fmt::Debug for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Panel")
            .field("id", &self.id)
            .field("session", &self.session)
            .field("window_index", &self.window_index)
            .field("view_mode", &self.view_mode)
            .field("focused", &self.focused)
            .field("tabs", &self.cache.len())
            .finish()
    }
}
