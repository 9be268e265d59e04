//! Directory browser tab.

use super::{BrowserEvent, DirEntry, DirectoryService, Fetcher};
use crate::event::ResourceId;
use std::path::Path;
use std::sync::Arc;

/// Initial path when none is requested: the session's working directory
pub const DEFAULT_PATH: &str = ".";

pub struct FileBrowser {
    fetcher: Fetcher,
    session: String,
    service: Arc<dyn DirectoryService>,
    path: String,
    entries: Vec<DirEntry>,
    loading: bool,
    error: Option<String>,
    generation: u64,
}

impl FileBrowser {
    pub(crate) fn new(
        fetcher: Fetcher,
        session: impl Into<String>,
        service: Arc<dyn DirectoryService>,
    ) -> Self {
        Self {
            fetcher,
            session: session.into(),
            service,
            path: DEFAULT_PATH.to_string(),
            entries: Vec::new(),
            loading: false,
            error: None,
            generation: 0,
        }
    }

    /// List `path`, superseding any listing still in flight
    pub fn navigate(&mut self, path: &str) {
        self.generation += 1;
        self.path = path.to_string();
        self.loading = true;
        self.error = None;

        let generation = self.generation;
        let session = self.session.clone();
        let path = self.path.clone();
        let service = Arc::clone(&self.service);
        log::debug!("Files {} listing {} (generation {})", session, path, generation);
        self.fetcher.spawn(async move {
            let result = service.list(&session, &path).await;
            BrowserEvent::Listing {
                generation,
                path,
                result,
            }
        });
    }

    /// Re-list the current path
    pub fn refresh(&mut self) {
        let path = self.path.clone();
        self.navigate(&path);
    }

    /// Navigate one level up; no-op at the root
    pub fn parent(&mut self) {
        if let Some(parent) = parent_path(&self.path) {
            self.navigate(&parent);
        }
    }

    /// Apply a completed listing. Returns false for stale or foreign events.
    pub(crate) fn apply(&mut self, event: BrowserEvent) -> bool {
        let BrowserEvent::Listing {
            generation,
            path,
            result,
        } = event
        else {
            return false;
        };
        if generation != self.generation {
            log::debug!(
                "Files {} dropping stale listing of {} (generation {} != {})",
                self.session,
                path,
                generation,
                self.generation
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(entries) => {
                self.entries = entries;
                self.error = None;
            }
            Err(e) => {
                log::warn!("Files {} failed to list {}: {}", self.session, path, e);
                self.entries.clear();
                self.error = Some(e.to_string());
            }
        }
        true
    }

    pub(crate) fn dispose(&mut self) {
        self.fetcher.abort_all();
    }

    pub fn id(&self) -> ResourceId {
        self.fetcher.id()
    }

    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Inline error shown in place of the listing
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn parent_path(path: &str) -> Option<String> {
    let parent = Path::new(path).parent()?;
    if parent.as_os_str().is_empty() {
        // "docs" -> "."; "." has no parent
        return (path != DEFAULT_PATH).then(|| DEFAULT_PATH.to_string());
    }
    Some(parent.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path("/home/dev/src").as_deref(), Some("/home/dev"));
        assert_eq!(parent_path("/home").as_deref(), Some("/"));
        assert_eq!(parent_path("/"), None);
        assert_eq!(parent_path("docs/api").as_deref(), Some("docs"));
        assert_eq!(parent_path("docs").as_deref(), Some("."));
        assert_eq!(parent_path("."), None);
    }
}
