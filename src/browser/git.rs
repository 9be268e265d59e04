//! Git browser tab: commit log plus one diff view.
//!
//! The log and the diff pane are independent navigable surfaces with their
//! own generation counters. Selecting a commit and opening a file diff share
//! the diff counter, since both replace the same pane.

use super::{BrowserEvent, CommitSummary, Fetcher, RepositoryService};
use crate::event::ResourceId;
use std::sync::Arc;

/// What the diff pane shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffTarget {
    Commit(String),
    File(String),
}

pub struct GitBrowser {
    fetcher: Fetcher,
    session: String,
    service: Arc<dyn RepositoryService>,

    commits: Vec<CommitSummary>,
    log_loading: bool,
    log_error: Option<String>,
    log_generation: u64,

    selection: Option<DiffTarget>,
    diff: Option<String>,
    diff_loading: bool,
    diff_error: Option<String>,
    diff_generation: u64,
}

impl GitBrowser {
    pub(crate) fn new(
        fetcher: Fetcher,
        session: impl Into<String>,
        service: Arc<dyn RepositoryService>,
    ) -> Self {
        Self {
            fetcher,
            session: session.into(),
            service,
            commits: Vec::new(),
            log_loading: false,
            log_error: None,
            log_generation: 0,
            selection: None,
            diff: None,
            diff_loading: false,
            diff_error: None,
            diff_generation: 0,
        }
    }

    /// Reload the commit log
    pub fn refresh(&mut self) {
        self.log_generation += 1;
        self.log_loading = true;
        self.log_error = None;

        let generation = self.log_generation;
        let session = self.session.clone();
        let service = Arc::clone(&self.service);
        self.fetcher.spawn(async move {
            let result = service.log(&session).await;
            BrowserEvent::Log { generation, result }
        });
    }

    /// Show the diff of one commit
    pub fn select_commit(&mut self, hash: &str) {
        self.request_diff(DiffTarget::Commit(hash.to_string()));
    }

    /// Show the working-tree diff of one file
    pub fn show_file_diff(&mut self, path: &str) {
        self.request_diff(DiffTarget::File(path.to_string()));
    }

    /// Return to the bare log; any diff still loading is discarded
    pub fn close_diff(&mut self) {
        self.diff_generation += 1;
        self.selection = None;
        self.diff = None;
        self.diff_loading = false;
        self.diff_error = None;
    }

    fn request_diff(&mut self, target: DiffTarget) {
        self.diff_generation += 1;
        self.selection = Some(target.clone());
        self.diff_loading = true;
        self.diff_error = None;

        let generation = self.diff_generation;
        let session = self.session.clone();
        let service = Arc::clone(&self.service);
        log::debug!(
            "Git {} loading {:?} (generation {})",
            session,
            target,
            generation
        );
        self.fetcher.spawn(async move {
            let result = match &target {
                DiffTarget::Commit(hash) => service.commit_diff(&session, hash).await,
                DiffTarget::File(path) => service.file_diff(&session, path).await,
            };
            BrowserEvent::Diff {
                generation,
                target,
                result,
            }
        });
    }

    /// Apply a completed request. Returns false for stale or foreign events.
    pub(crate) fn apply(&mut self, event: BrowserEvent) -> bool {
        match event {
            BrowserEvent::Log { generation, result } => {
                if generation != self.log_generation {
                    log::debug!("Git {} dropping stale log (generation {})", self.session, generation);
                    return false;
                }
                self.log_loading = false;
                match result {
                    Ok(commits) => {
                        self.commits = commits;
                        self.log_error = None;
                    }
                    Err(e) => {
                        log::warn!("Git {} failed to load log: {}", self.session, e);
                        self.log_error = Some(e.to_string());
                    }
                }
                true
            }
            BrowserEvent::Diff {
                generation,
                target,
                result,
            } => {
                if generation != self.diff_generation {
                    log::debug!(
                        "Git {} dropping stale diff {:?} (generation {})",
                        self.session,
                        target,
                        generation
                    );
                    return false;
                }
                self.diff_loading = false;
                match result {
                    Ok(diff) => {
                        self.diff = Some(diff);
                        self.diff_error = None;
                    }
                    Err(e) => {
                        log::warn!("Git {} failed to load {:?}: {}", self.session, target, e);
                        self.diff = None;
                        self.diff_error = Some(e.to_string());
                    }
                }
                true
            }
            BrowserEvent::Listing { .. } => false,
        }
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

    pub fn commits(&self) -> &[CommitSummary] {
        &self.commits
    }

    pub fn is_log_loading(&self) -> bool {
        self.log_loading
    }

    pub fn log_error(&self) -> Option<&str> {
        self.log_error.as_deref()
    }

    pub fn selection(&self) -> Option<&DiffTarget> {
        self.selection.as_ref()
    }

    pub fn diff(&self) -> Option<&str> {
        self.diff.as_deref()
    }

    pub fn is_diff_loading(&self) -> bool {
        self.diff_loading
    }

    pub fn diff_error(&self) -> Option<&str> {
        self.diff_error.as_deref()
    }

    pub fn log_generation(&self) -> u64 {
        self.log_generation
    }

    pub fn diff_generation(&self) -> u64 {
        self.diff_generation
    }
}
