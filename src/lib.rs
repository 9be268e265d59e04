// Library exports for the panemux binary and integration tests
//
// # Concurrency Policy
//
// panemux runs every panel mutation on one controller thread. Background work
// (attachment workers, browser fetches) lives in tokio tasks and talks to the
// controller only through the core event channel.
//
//   - `parking_lot::Mutex`: sync-only state shared between an attachment
//     handle and its worker (state + destroyed flag). Never held across an
//     `.await`.
//
//   - `parking_lot::RwLock`: the shared UI preferences record.
//
//   - `tokio::sync::mpsc`: everything else. Commands into attachment
//     workers, core events and panel notices out.

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod debug;

pub mod attachment;
pub mod browser;
pub mod cli;
pub mod event;
pub mod panel;
pub mod prefs;
pub mod surface;
pub mod tab;
pub mod transport;

pub use attachment::{Attachment, AttachmentEvent, BackoffPolicy, ConnectionState};
pub use event::{CoreEvent, PanelNotice, ResourceId};
pub use panel::{
    Collaborators, LayoutSnapshot, ManagerOptions, Panel, PanelId, PanelManager, PanelSlot,
    SplitOptions,
};
pub use tab::{TabKey, ViewMode};
