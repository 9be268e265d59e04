//! File and git browser tabs.
//!
//! Browsers are navigable surfaces backed by remote services. Every request
//! is tagged with the browser's generation counter at issue time and runs as
//! its own tokio task; the completion comes back through the core event
//! channel and is applied only if the generation still matches. Anything
//! older is dropped, so a slow response can never overwrite a newer one.
//!
//! Service failures are stored as an inline error on the browser itself and
//! never leave the tab.

mod files;
mod git;

pub use files::{DEFAULT_PATH, FileBrowser};
pub use git::{DiffTarget, GitBrowser};

use crate::event::{CoreEvent, EventSender, ResourceId};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

// ---------------------------------------------------------------------------
// Service errors and data
// ---------------------------------------------------------------------------

/// Failure reported by a browser service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// No backend is configured for this service
    #[error("{0} is not available")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub hash: String,
    pub summary: String,
    pub author: String,
}

// ---------------------------------------------------------------------------
// Service seams
// ---------------------------------------------------------------------------

/// Directory listing for a session's filesystem
#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn list(&self, session: &str, path: &str) -> Result<Vec<DirEntry>, ServiceError>;
}

/// Version-control queries for a session's working tree
#[async_trait]
pub trait RepositoryService: Send + Sync {
    async fn log(&self, session: &str) -> Result<Vec<CommitSummary>, ServiceError>;
    async fn commit_diff(&self, session: &str, hash: &str) -> Result<String, ServiceError>;
    async fn file_diff(&self, session: &str, path: &str) -> Result<String, ServiceError>;
}

/// Stand-in that fails every request with [`ServiceError::Unavailable`]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableServices;

#[async_trait]
impl DirectoryService for UnavailableServices {
    async fn list(&self, _session: &str, _path: &str) -> Result<Vec<DirEntry>, ServiceError> {
        Err(ServiceError::Unavailable("directory listing".to_string()))
    }
}

#[async_trait]
impl RepositoryService for UnavailableServices {
    async fn log(&self, _session: &str) -> Result<Vec<CommitSummary>, ServiceError> {
        Err(ServiceError::Unavailable("git log".to_string()))
    }

    async fn commit_diff(&self, _session: &str, _hash: &str) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable("git diff".to_string()))
    }

    async fn file_diff(&self, _session: &str, _path: &str) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable("git diff".to_string()))
    }
}

/// The pair of services browsers are built from
#[derive(Clone)]
pub struct Services {
    pub directory: Arc<dyn DirectoryService>,
    pub repository: Arc<dyn RepositoryService>,
}

impl Services {
    pub fn new(
        directory: Arc<dyn DirectoryService>,
        repository: Arc<dyn RepositoryService>,
    ) -> Self {
        Self {
            directory,
            repository,
        }
    }

    pub fn unavailable() -> Self {
        Self::new(Arc::new(UnavailableServices), Arc::new(UnavailableServices))
    }
}

// ---------------------------------------------------------------------------
// Completion events
// ---------------------------------------------------------------------------

/// Completion of one browser request, tagged with its generation
#[derive(Debug, Clone, PartialEq)]
pub enum BrowserEvent {
    Listing {
        generation: u64,
        path: String,
        result: Result<Vec<DirEntry>, ServiceError>,
    },
    Log {
        generation: u64,
        result: Result<Vec<CommitSummary>, ServiceError>,
    },
    Diff {
        generation: u64,
        target: DiffTarget,
        result: Result<String, ServiceError>,
    },
}

// ---------------------------------------------------------------------------
// Fetch plumbing
// ---------------------------------------------------------------------------

/// Spawns request tasks for one browser instance and tracks them for disposal
pub(crate) struct Fetcher {
    id: ResourceId,
    runtime: Handle,
    events: EventSender,
    in_flight: Vec<JoinHandle<()>>,
}

impl Fetcher {
    pub(crate) fn new(id: ResourceId, runtime: Handle, events: EventSender) -> Self {
        Self {
            id,
            runtime,
            events,
            in_flight: Vec::new(),
        }
    }

    pub(crate) fn id(&self) -> ResourceId {
        self.id
    }

    /// Run `request` in the background and post its result
    pub(crate) fn spawn<F>(&mut self, request: F)
    where
        F: Future<Output = BrowserEvent> + Send + 'static,
    {
        self.in_flight.retain(|task| !task.is_finished());
        let id = self.id;
        let events = self.events.clone();
        self.in_flight.push(self.runtime.spawn(async move {
            let event = request.await;
            let _ = events.send(CoreEvent::Browser { id, event });
        }));
    }

    /// Abort every outstanding request
    pub(crate) fn abort_all(&mut self) {
        for task in self.in_flight.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Fetcher {
    fn drop(&mut self) {
        self.abort_all();
    }
}
