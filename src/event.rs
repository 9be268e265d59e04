//! Event plumbing between background resources and the panel controller.
//!
//! Attachments and browser fetch tasks never touch panel state directly.
//! They post a [`CoreEvent`] tagged with their [`ResourceId`]; the
//! `PanelManager` drains the channel on the controller thread and routes each
//! event to the tab that currently owns that id. Events for ids that no
//! longer exist (disposed tabs) are dropped.
//!
//! Controller-facing callbacks go the other way as [`PanelNotice`] values.

use crate::attachment::{AttachmentEvent, ConnectionState};
use crate::browser::BrowserEvent;
use crate::panel::PanelId;
use crate::tab::ViewMode;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

/// Process-unique identifier of one attachment or browser instance
pub type ResourceId = u64;

/// Allocator for [`ResourceId`]s, shared by every panel of one manager
#[derive(Debug, Clone, Default)]
pub struct ResourceIds(Arc<AtomicU64>);

impl ResourceIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id (ids start at 1)
    pub fn next_id(&self) -> ResourceId {
        self.0.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Message posted by a background resource
#[derive(Debug)]
pub enum CoreEvent {
    Attachment {
        id: ResourceId,
        event: AttachmentEvent,
    },
    Browser {
        id: ResourceId,
        event: BrowserEvent,
    },
}

impl CoreEvent {
    /// Id of the resource that posted the event
    pub fn resource_id(&self) -> ResourceId {
        match self {
            CoreEvent::Attachment { id, .. } | CoreEvent::Browser { id, .. } => *id,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<CoreEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<CoreEvent>;

/// Callback delivered to the top-level controller
#[derive(Debug, Clone, PartialEq)]
pub enum PanelNotice {
    /// The panel is now bound to a different (session, window)
    ClientStatus {
        panel: PanelId,
        session: String,
        window_index: u32,
    },
    /// Connection indicator of the panel's active terminal tab changed
    ConnectionState {
        panel: PanelId,
        state: ConnectionState,
    },
    /// Focus moved to `panel`
    FocusChanged { panel: PanelId },
    /// Window title of the active terminal tab changed; empty when cleared
    TitleChanged { panel: PanelId, title: String },
    /// The panel switched between terminal, files and git
    ViewModeChanged { panel: PanelId, mode: ViewMode },
    /// Split, collapse or divider state changed
    LayoutChanged,
}

pub type NoticeSender = mpsc::UnboundedSender<PanelNotice>;
pub type NoticeReceiver = mpsc::UnboundedReceiver<PanelNotice>;
