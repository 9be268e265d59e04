//! Focus and input routing for PanelManager
//!
//! Exactly one panel is focused at any time. Global input goes to the focused
//! panel's active terminal tab and nowhere else.

use super::PanelManager;
use crate::event::PanelNotice;
use crate::panel::{Panel, PanelId};

impl PanelManager {
    /// Id of the focused panel
    pub fn get_focused_panel(&self) -> PanelId {
        self.focused
    }

    pub fn focused_panel(&self) -> &Panel {
        match (self.focused, self.right.as_ref()) {
            (PanelId::Right, Some(right)) => right,
            _ => &self.left,
        }
    }

    pub fn focused_panel_mut(&mut self) -> &mut Panel {
        match (self.focused, self.right.as_mut()) {
            (PanelId::Right, Some(right)) => right,
            _ => &mut self.left,
        }
    }

    /// Focus `id`, unfocusing the previous panel
    ///
    /// No-op if already focused or if `id` does not exist.
    pub fn set_focus(&mut self, id: PanelId) {
        if self.focused == id || self.panel(id).is_none() {
            return;
        }

        self.focused_panel_mut().set_focused(false);
        self.focused = id;
        self.focused_panel_mut().set_focused(true);

        log::debug!("Focus moved to {} panel", id);
        let _ = self.ctx.notices.send(PanelNotice::FocusChanged { panel: id });
    }

    /// Toggle focus between the two panels; only while split
    pub fn switch_focus(&mut self) {
        if !self.is_split() {
            return;
        }
        let next = match self.focused {
            PanelId::Left => PanelId::Right,
            PanelId::Right => PanelId::Left,
        };
        self.set_focus(next);
    }

    /// Send keystrokes to the focused panel's active terminal tab
    ///
    /// Returns false when the focused panel is not showing a terminal.
    pub fn route_input(&self, bytes: &[u8]) -> bool {
        self.focused_panel().send_input(bytes)
    }
}
