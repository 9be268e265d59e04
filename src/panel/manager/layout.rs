//! Layout operations for PanelManager
//!
//! Split toggling, divider ratio, narrow-viewport collapse, and the pinned
//! drawer width. Ratio, split flag, and drawer width are persisted through
//! the state store.
//!
//! Collapse is purely visual: below the narrow threshold only the focused
//! panel is laid out, while the other keeps its cache and attachments.

use super::PanelManager;
use crate::event::PanelNotice;
use crate::panel::{Panel, PanelId};
use panemux_config::{DIVIDER_RATIO_MAX, DIVIDER_RATIO_MIN, keys};
use serde::Serialize;
use std::sync::Arc;

pub(super) const DRAWER_WIDTH_MIN: u32 = 160;
pub(super) const DRAWER_WIDTH_MAX: u32 = 640;
pub(super) const DRAWER_WIDTH_DEFAULT: u32 = 280;

/// Options for [`PanelManager::toggle_split`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitOptions {
    /// Leave the new right panel empty instead of mirroring the left's window
    pub skip_auto_connect: bool,
}

/// One laid-out panel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelSlot {
    pub id: PanelId,
    /// Fraction of the viewport width
    pub fraction: f32,
    pub focused: bool,
}

/// What the view layer should draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutSnapshot {
    pub split: bool,
    /// Split, but the viewport is too narrow to show both panels
    pub collapsed: bool,
    pub divider_ratio: f32,
    pub drawer_width: u32,
    /// Visible panels, left to right
    pub panels: Vec<PanelSlot>,
}

pub(super) fn clamp_divider_ratio(ratio: f32) -> f32 {
    ratio.clamp(DIVIDER_RATIO_MIN, DIVIDER_RATIO_MAX)
}

pub(super) fn clamp_drawer_width(px: u32) -> u32 {
    px.clamp(DRAWER_WIDTH_MIN, DRAWER_WIDTH_MAX)
}

impl PanelManager {
    /// Enter or leave split mode
    ///
    /// Entering creates the right panel and, unless `skip_auto_connect`,
    /// connects it to the left panel's (session, window) with its own
    /// attachment. Focus stays where it was.
    ///
    /// Leaving keeps the focused panel and releases the other one entirely.
    /// A kept right panel becomes the left panel.
    pub fn toggle_split(&mut self, options: SplitOptions) {
        if self.right.is_some() {
            self.leave_split();
        } else {
            self.enter_split(options);
        }
        let _ = self.ctx.notices.send(PanelNotice::LayoutChanged);
    }

    fn enter_split(&mut self, options: SplitOptions) {
        let mut right = Panel::new(PanelId::Right, Arc::clone(&self.ctx), self.left.size());
        if !options.skip_auto_connect
            && self.left.is_connected()
            && let (Some(session), Some(index)) = (self.left.session(), self.left.window_index())
        {
            log::info!("Split: mirroring {}:{} in right panel", session, index);
            let session = session.to_string();
            right.connect_to_window(&session, index);
        }
        self.right = Some(right);
        self.ctx.store.set(keys::SPLIT_MODE, "true");
        log::info!("Entered split mode");
    }

    fn leave_split(&mut self) {
        let Some(mut right) = self.right.take() else {
            return;
        };
        if self.focused == PanelId::Right {
            right.set_id(PanelId::Left);
            let mut discarded = std::mem::replace(&mut self.left, right);
            discarded.cleanup();
            self.focused = PanelId::Left;
            let _ = self.ctx.notices.send(PanelNotice::FocusChanged {
                panel: PanelId::Left,
            });
        } else {
            right.cleanup();
        }
        self.ctx.store.set(keys::SPLIT_MODE, "false");
        log::info!("Left split mode");
    }

    /// Re-enter split mode if it was active when the layout was last saved
    pub fn restore_split(&mut self) {
        let persisted = self.ctx.store.get(keys::SPLIT_MODE).as_deref() == Some("true");
        if persisted && !self.is_split() {
            self.toggle_split(SplitOptions::default());
        }
    }

    pub fn divider_ratio(&self) -> f32 {
        self.divider_ratio
    }

    /// Move the divider; clamped to [0.2, 0.8] and persisted. NaN is ignored.
    pub fn set_divider_ratio(&mut self, ratio: f32) {
        if !ratio.is_finite() {
            return;
        }
        let ratio = clamp_divider_ratio(ratio);
        if ratio == self.divider_ratio {
            return;
        }
        self.divider_ratio = ratio;
        self.ctx.store.set(keys::DIVIDER_RATIO, &format!("{ratio}"));
        let _ = self.ctx.notices.send(PanelNotice::LayoutChanged);
    }

    /// Report the viewport width in pixels
    pub fn set_viewport_width(&mut self, px: u32) {
        let was_collapsed = self.is_collapsed();
        self.viewport_width = Some(px);
        if self.is_collapsed() != was_collapsed {
            log::debug!(
                "Viewport {}px: split layout {}",
                px,
                if was_collapsed { "restored" } else { "collapsed" }
            );
            let _ = self.ctx.notices.send(PanelNotice::LayoutChanged);
        }
    }

    /// Split, but the viewport is narrower than the collapse threshold
    pub fn is_collapsed(&self) -> bool {
        self.is_split()
            && self
                .viewport_width
                .is_some_and(|px| px < self.narrow_viewport_px)
    }

    pub fn drawer_width(&self) -> u32 {
        self.drawer_width
    }

    /// Set the pinned drawer width; clamped and persisted
    pub fn set_drawer_width(&mut self, px: u32) {
        let px = clamp_drawer_width(px);
        if px == self.drawer_width {
            return;
        }
        self.drawer_width = px;
        self.ctx.store.set(keys::DRAWER_WIDTH, &px.to_string());
    }

    /// Current layout for the view layer
    pub fn layout(&self) -> LayoutSnapshot {
        let slot = |id: PanelId, fraction: f32| PanelSlot {
            id,
            fraction,
            focused: self.focused == id,
        };
        let panels = if !self.is_split() {
            vec![slot(PanelId::Left, 1.0)]
        } else if self.is_collapsed() {
            vec![slot(self.focused, 1.0)]
        } else {
            vec![
                slot(PanelId::Left, self.divider_ratio),
                slot(PanelId::Right, 1.0 - self.divider_ratio),
            ]
        };
        LayoutSnapshot {
            split: self.is_split(),
            collapsed: self.is_collapsed(),
            divider_ratio: self.divider_ratio,
            drawer_width: self.drawer_width,
            panels,
        }
    }
}
