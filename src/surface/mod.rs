//! Rendering surface seam for terminal tabs.
//!
//! A surface receives output bytes and owns keystroke capture and the fit
//! loop. Panels drive it through [`TerminalSurface`]; how it draws is its own
//! business. [`Vt100Surface`] is the headless default.

mod vt;

pub use vt::{Vt100Surface, Vt100SurfaceFactory};

use crate::prefs::UiPrefs;
use panemux_protocol::AttachTarget;

pub trait TerminalSurface: Send {
    /// Feed output received from the attachment
    fn write_output(&mut self, bytes: &[u8]);

    /// Stop rendering and fitting while the tab is hidden
    fn suspend(&mut self);

    /// Resume rendering after [`suspend`](Self::suspend)
    fn resume(&mut self);

    /// Fit to new geometry
    fn resize(&mut self, cols: u16, rows: u16);

    /// Enable or disable keystroke capture for this surface
    fn set_input_enabled(&mut self, enabled: bool);

    /// Take keyboard focus
    fn claim_focus(&mut self);

    /// Initialize or refresh the toolbar from the shared preferences
    fn apply_prefs(&mut self, prefs: &UiPrefs);

    /// Window title reported by the remote program, if any
    fn title(&self) -> Option<String>;

    /// Release everything; the surface is never used again
    fn dispose(&mut self);
}

/// Creates one surface per terminal tab
pub trait SurfaceFactory: Send + Sync {
    fn create(&self, target: &AttachTarget, cols: u16, rows: u16) -> Box<dyn TerminalSurface>;
}
