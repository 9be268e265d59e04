//! Panel manager: one or two panels, focus, layout, and event routing.
//!
//! The manager owns the left panel permanently and the right panel while
//! split. It is the single consumer of the core event channel: the
//! controller calls [`PanelManager::process_pending`] or awaits
//! [`PanelManager::next_event`], and every resulting mutation of panel
//! state happens on the caller's thread.
//!
//! Sub-modules:
//! - `focus`: focus tracking and input routing
//! - `layout`: split, divider ratio, narrow-viewport collapse, drawer width

mod focus;
mod layout;

pub use layout::{LayoutSnapshot, PanelSlot, SplitOptions};

use super::{Panel, PanelContext, PanelId};
use crate::attachment::BackoffPolicy;
use crate::browser::Services;
use crate::event::{CoreEvent, EventReceiver, NoticeReceiver, ResourceIds};
use crate::prefs::{SharedPrefs, UiPrefs};
use crate::surface::SurfaceFactory;
use crate::tab::ViewMode;
use crate::transport::Connector;
use panemux_config::{Config, StateStore, keys};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// External collaborators the manager wires into every panel
#[derive(Clone)]
pub struct Collaborators {
    pub connector: Arc<dyn Connector>,
    pub surfaces: Arc<dyn SurfaceFactory>,
    pub services: Services,
    pub store: Arc<dyn StateStore>,
}

/// Tunables, normally taken from [`Config`]
#[derive(Debug, Clone, Copy)]
pub struct ManagerOptions {
    pub policy: BackoffPolicy,
    pub narrow_viewport_px: u32,
    pub default_divider_ratio: f32,
    /// Initial (cols, rows) of every panel
    pub default_size: (u16, u16),
    pub prefs: UiPrefs,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ManagerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            policy: BackoffPolicy::from_config(config),
            narrow_viewport_px: config.narrow_viewport_px,
            default_divider_ratio: config.default_divider_ratio,
            default_size: (config.default_cols, config.default_rows),
            prefs: UiPrefs::from_config(config),
        }
    }
}

pub struct PanelManager {
    ctx: Arc<PanelContext>,
    events: EventReceiver,
    left: Panel,
    right: Option<Panel>,
    focused: PanelId,
    divider_ratio: f32,
    narrow_viewport_px: u32,
    viewport_width: Option<u32>,
    drawer_width: u32,
}

impl PanelManager {
    /// Create a manager with a single, focused left panel
    ///
    /// Divider ratio and drawer width are restored from the state store.
    /// Returns the receiver for controller notices.
    pub fn new(
        runtime: Handle,
        collaborators: Collaborators,
        options: ManagerOptions,
    ) -> (Self, NoticeReceiver) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let ctx = Arc::new(PanelContext {
            runtime,
            connector: collaborators.connector,
            surfaces: collaborators.surfaces,
            services: collaborators.services,
            store: collaborators.store,
            prefs: SharedPrefs::new(options.prefs),
            policy: options.policy,
            ids: ResourceIds::new(),
            events: event_tx,
            notices: notice_tx,
        });

        let divider_ratio = ctx
            .store
            .get(keys::DIVIDER_RATIO)
            .and_then(|value| value.parse::<f32>().ok())
            .filter(|ratio| ratio.is_finite())
            .map_or(options.default_divider_ratio, layout::clamp_divider_ratio);
        let drawer_width = ctx
            .store
            .get(keys::DRAWER_WIDTH)
            .and_then(|value| value.parse::<u32>().ok())
            .map_or(layout::DRAWER_WIDTH_DEFAULT, layout::clamp_drawer_width);

        let mut left = Panel::new(PanelId::Left, Arc::clone(&ctx), options.default_size);
        left.set_focused(true);

        log::info!(
            "Panel manager ready (divider {:.2}, drawer {}px)",
            divider_ratio,
            drawer_width
        );

        let manager = Self {
            ctx,
            events: event_rx,
            left,
            right: None,
            focused: PanelId::Left,
            divider_ratio,
            narrow_viewport_px: options.narrow_viewport_px,
            viewport_width: None,
            drawer_width,
        };
        (manager, notice_rx)
    }

    // ========================================================================
    // Panel access
    // ========================================================================

    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        match id {
            PanelId::Left => Some(&self.left),
            PanelId::Right => self.right.as_ref(),
        }
    }

    pub fn panel_mut(&mut self, id: PanelId) -> Option<&mut Panel> {
        match id {
            PanelId::Left => Some(&mut self.left),
            PanelId::Right => self.right.as_mut(),
        }
    }

    pub fn panels(&self) -> impl Iterator<Item = &Panel> {
        std::iter::once(&self.left).chain(self.right.as_ref())
    }

    pub fn is_split(&self) -> bool {
        self.right.is_some()
    }

    /// Shared UI preferences record
    pub fn prefs(&self) -> &SharedPrefs {
        &self.ctx.prefs
    }

    // ========================================================================
    // Controller surface, applied to the focused panel
    // ========================================================================

    pub fn connect_to_window(&mut self, session: &str, window_index: u32) {
        self.focused_panel_mut().connect_to_window(session, window_index);
    }

    pub fn show_file_browser(&mut self, session: &str, path: Option<&str>) {
        self.focused_panel_mut().show_file_browser(session, path);
    }

    pub fn show_git_browser(&mut self, session: &str) {
        self.focused_panel_mut().show_git_browser(session);
    }

    pub fn show_terminal_view(&mut self) {
        self.focused_panel_mut().show_terminal_view();
    }

    pub fn current_session(&self) -> Option<&str> {
        self.focused_panel().session()
    }

    pub fn current_window_index(&self) -> Option<u32> {
        self.focused_panel().window_index()
    }

    pub fn current_view_mode(&self) -> ViewMode {
        self.focused_panel().view_mode()
    }

    /// Connect the focused panel, then restore the view last used for `session`
    pub fn resume_session(&mut self, session: &str, window_index: u32) {
        let last_view = self
            .ctx
            .store
            .get(&keys::last_view(session))
            .and_then(|value| value.parse::<ViewMode>().ok());
        self.connect_to_window(session, window_index);
        match last_view {
            Some(ViewMode::Files) => self.show_file_browser(session, None),
            Some(ViewMode::Git) => self.show_git_browser(session),
            Some(ViewMode::Terminal) | None => {}
        }
    }

    /// Manual reconnect of the focused panel's current window
    pub fn reconnect_now(&mut self) {
        self.focused_panel_mut().reconnect_now();
    }

    /// Connectivity came back: every attachment in every panel retries now
    pub fn network_restored(&mut self) {
        log::info!("Network restored");
        self.left.network_restored();
        if let Some(right) = &self.right {
            right.network_restored();
        }
    }

    /// Resize one panel's terminal geometry
    pub fn resize_panel(&mut self, id: PanelId, cols: u16, rows: u16) {
        if let Some(panel) = self.panel_mut(id) {
            panel.resize(cols, rows);
        }
    }

    // ========================================================================
    // Event routing
    // ========================================================================

    /// Apply every event already queued; returns how many were handled
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    /// Wait for the next event and apply it. Returns false if the channel closed.
    pub async fn next_event(&mut self) -> bool {
        match self.events.recv().await {
            Some(event) => {
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    fn dispatch(&mut self, event: CoreEvent) {
        let id = event.resource_id();
        let owner = self.left.cache().iter().any(|tab| tab.resource_id() == id);
        let handled = if owner {
            self.left.handle_event(event)
        } else if let Some(right) = self.right.as_mut() {
            right.handle_event(event)
        } else {
            false
        };
        if !handled {
            log::trace!("Dropping event from released resource {}", id);
        }
    }

    /// Release every panel's resources
    pub fn shutdown(&mut self) {
        log::info!("Panel manager shutting down");
        if let Some(mut right) = self.right.take() {
            right.cleanup();
        }
        self.left.cleanup();
        self.focused = PanelId::Left;
        self.left.set_focused(true);
    }
}

impl Drop for PanelManager {
    fn drop(&mut self) {
        if let Some(mut right) = self.right.take() {
            right.cleanup();
        }
        self.left.cleanup();
    }
}
