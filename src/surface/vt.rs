//! Headless terminal surface backed by `vt100`.
//!
//! The surface keeps a full screen model per tab, so a tab that was hidden
//! can be repainted from its own state when shown again. When a mirror writer
//! is attached (the CLI uses stdout), output is passed through while the
//! surface is both visible and receiving input, and the screen is repainted
//! whenever it becomes so.

use super::{SurfaceFactory, TerminalSurface};
use crate::prefs::UiPrefs;
use panemux_config::KeyboardMode;
use panemux_protocol::AttachTarget;
use std::io::Write;

const DEFAULT_SCROLLBACK: usize = 1000;

pub struct Vt100Surface {
    parser: vt100::Parser,
    suspended: bool,
    input_enabled: bool,
    toolbar_visible: bool,
    keyboard_mode: KeyboardMode,
    mirror: Option<Box<dyn Write + Send>>,
    disposed: bool,
}

impl Vt100Surface {
    pub fn new(cols: u16, rows: u16, scrollback: usize) -> Self {
        Self {
            parser: vt100::Parser::new(rows.max(1), cols.max(1), scrollback),
            suspended: false,
            input_enabled: false,
            toolbar_visible: true,
            keyboard_mode: KeyboardMode::default(),
            mirror: None,
            disposed: false,
        }
    }

    /// Pass output through to `writer` while shown and focused
    pub fn with_mirror(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.mirror = Some(writer);
        self
    }

    /// Plain text of the visible screen
    pub fn contents(&self) -> String {
        self.parser.screen().contents()
    }

    /// Current geometry as (cols, rows)
    pub fn size(&self) -> (u16, u16) {
        let (rows, cols) = self.parser.screen().size();
        (cols, rows)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn is_input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn toolbar(&self) -> (bool, KeyboardMode) {
        (self.toolbar_visible, self.keyboard_mode)
    }

    fn mirroring(&self) -> bool {
        !self.disposed && !self.suspended && self.input_enabled
    }

    fn mirror_bytes(&mut self, bytes: &[u8]) {
        if let Some(writer) = self.mirror.as_mut() {
            let result = writer.write_all(bytes).and_then(|_| writer.flush());
            if let Err(e) = result {
                log::warn!("Surface mirror write failed: {}", e);
                self.mirror = None;
            }
        }
    }

    fn repaint(&mut self) {
        if self.mirror.is_some() && self.mirroring() {
            let screen = self.parser.screen().contents_formatted();
            self.mirror_bytes(&screen);
        }
    }
}

impl TerminalSurface for Vt100Surface {
    fn write_output(&mut self, bytes: &[u8]) {
        if self.disposed {
            return;
        }
        self.parser.process(bytes);
        if self.mirroring() {
            self.mirror_bytes(bytes);
        }
    }

    fn suspend(&mut self) {
        self.suspended = true;
    }

    fn resume(&mut self) {
        if self.suspended {
            self.suspended = false;
            self.repaint();
        }
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        self.parser.set_size(rows.max(1), cols.max(1));
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        if self.input_enabled != enabled {
            self.input_enabled = enabled;
            self.repaint();
        }
    }

    fn claim_focus(&mut self) {
        log::trace!("Surface claimed focus");
    }

    fn apply_prefs(&mut self, prefs: &UiPrefs) {
        self.toolbar_visible = prefs.toolbar_visible;
        self.keyboard_mode = prefs.keyboard_mode;
    }

    fn title(&self) -> Option<String> {
        let title = self.parser.screen().title();
        (!title.is_empty()).then(|| title.to_string())
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.mirror = None;
    }
}

/// Builds [`Vt100Surface`]s, optionally mirrored to stdout
#[derive(Debug, Clone)]
pub struct Vt100SurfaceFactory {
    scrollback: usize,
    mirror_stdout: bool,
}

impl Default for Vt100SurfaceFactory {
    fn default() -> Self {
        Self {
            scrollback: DEFAULT_SCROLLBACK,
            mirror_stdout: false,
        }
    }
}

impl Vt100SurfaceFactory {
    /// Surfaces that echo the focused visible tab to stdout
    pub fn stdout() -> Self {
        Self {
            mirror_stdout: true,
            ..Self::default()
        }
    }
}

impl SurfaceFactory for Vt100SurfaceFactory {
    fn create(&self, target: &AttachTarget, cols: u16, rows: u16) -> Box<dyn TerminalSurface> {
        log::debug!("Creating surface {}x{} for {}", cols, rows, target);
        let surface = Vt100Surface::new(cols, rows, self.scrollback);
        if self.mirror_stdout {
            Box::new(surface.with_mirror(Box::new(std::io::stdout())))
        } else {
            Box::new(surface)
        }
    }
}
