//! Shared integration test helpers for panemux.
//!
//! This module provides scripted collaborators used across the `tests/`
//! integration test suite:
//!
//! - [`MockConnector`]: records every open with its (paused) tokio timestamp,
//!   can refuse or delay opens, and exposes each accepted stream as a
//!   [`MockLink`] so tests can push output, close it, or inspect sent frames
//! - [`MockSurfaceFactory`]: records every surface it creates
//! - [`ScriptedServices`]: directory and repository services with per-request
//!   delays and failures
//! - [`Harness`]: a `PanelManager` wired to all of the above
//!
//! # Usage
//!
//! ```ignore
//! mod common;
//! use common::Harness;
//! ```
//!
//! Tests run with `#[tokio::test(start_paused = true)]` so backoff timing is
//! deterministic. The `#[allow(dead_code)]` attribute suppresses warnings when
//! only a subset of helpers are used per file.

#![allow(dead_code)]

use async_trait::async_trait;
use panemux::browser::{
    CommitSummary, DirEntry, DirectoryService, RepositoryService, ServiceError, Services,
};
use panemux::event::NoticeReceiver;
use panemux::prefs::UiPrefs;
use panemux::surface::{SurfaceFactory, TerminalSurface};
use panemux::tab::{TabKey, TabState, TerminalTab};
use panemux::transport::{Connector, FrameStream, TransportError};
use panemux::{Collaborators, ManagerOptions, PanelId, PanelManager, PanelNotice};
use panemux_config::MemoryStateStore;
use panemux_protocol::{AttachTarget, ClientFrame, ServerFrame};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Let every ready task run; with a paused clock this advances 50ms
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

// ============================================================================
// Connector
// ============================================================================

#[derive(Debug, Clone)]
pub struct OpenRecord {
    pub target: AttachTarget,
    pub at: Instant,
}

/// Server side of one accepted stream
#[derive(Clone)]
pub struct MockLink {
    pub target: AttachTarget,
    server: Arc<Mutex<Option<mpsc::UnboundedSender<ServerFrame>>>>,
    sent: Arc<Mutex<Vec<ClientFrame>>>,
    dropped: Arc<AtomicBool>,
}

impl MockLink {
    /// Send an output frame to the client
    pub fn push_output(&self, data: &str) -> bool {
        self.server.lock().as_ref().is_some_and(|tx| {
            tx.send(ServerFrame::Output {
                data: data.to_string(),
            })
            .is_ok()
        })
    }

    /// Close the stream from the server side
    pub fn close(&self) {
        self.server.lock().take();
    }

    /// Frames the client sent on this stream
    pub fn sent(&self) -> Vec<ClientFrame> {
        self.sent.lock().clone()
    }

    /// True once the client dropped its end
    pub fn is_dropped(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }
}

struct MockStream {
    inbound: mpsc::UnboundedReceiver<ServerFrame>,
    sent: Arc<Mutex<Vec<ClientFrame>>>,
    dropped: Arc<AtomicBool>,
}

#[async_trait]
impl FrameStream for MockStream {
    async fn send(&mut self, frame: ClientFrame) -> Result<(), TransportError> {
        self.sent.lock().push(frame);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<ServerFrame, TransportError>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn close(&mut self) {}
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct ConnectorState {
    refuse: bool,
    open_delay: Duration,
    opens: Vec<OpenRecord>,
    links: Vec<MockLink>,
}

/// Scripted connector; clones share state
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl MockConnector {
    /// Accepts every open
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses every open
    pub fn refusing() -> Self {
        let connector = Self::default();
        connector.set_refuse(true);
        connector
    }

    pub fn set_refuse(&self, refuse: bool) {
        self.state.lock().refuse = refuse;
    }

    /// Delay every open by `delay` before it resolves
    pub fn set_open_delay(&self, delay: Duration) {
        self.state.lock().open_delay = delay;
    }

    pub fn opens(&self) -> Vec<OpenRecord> {
        self.state.lock().opens.clone()
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().opens.len()
    }

    pub fn opens_for(&self, session: &str, window_index: u32) -> usize {
        let target = AttachTarget::new(session, window_index);
        self.state
            .lock()
            .opens
            .iter()
            .filter(|open| open.target == target)
            .count()
    }

    /// Open offsets from `start` in milliseconds
    pub fn open_offsets_ms(&self, start: Instant) -> Vec<u128> {
        self.opens()
            .iter()
            .map(|open| (open.at - start).as_millis())
            .collect()
    }

    pub fn links(&self) -> Vec<MockLink> {
        self.state.lock().links.clone()
    }

    /// Most recent accepted stream for a target
    pub fn link_for(&self, session: &str, window_index: u32) -> Option<MockLink> {
        let target = AttachTarget::new(session, window_index);
        self.state
            .lock()
            .links
            .iter()
            .rev()
            .find(|link| link.target == target)
            .cloned()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self, target: &AttachTarget) -> Result<Box<dyn FrameStream>, TransportError> {
        let delay = {
            let mut state = self.state.lock();
            state.opens.push(OpenRecord {
                target: target.clone(),
                at: Instant::now(),
            });
            state.open_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.refuse {
            return Err(TransportError::Open {
                target: target.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let dropped = Arc::new(AtomicBool::new(false));
        state.links.push(MockLink {
            target: target.clone(),
            server: Arc::new(Mutex::new(Some(tx))),
            sent: Arc::clone(&sent),
            dropped: Arc::clone(&dropped),
        });
        Ok(Box::new(MockStream {
            inbound: rx,
            sent,
            dropped,
        }))
    }
}

// ============================================================================
// Surfaces
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SurfaceRecord {
    pub output: Vec<u8>,
    pub suspended: bool,
    pub input_enabled: bool,
    pub focus_claims: usize,
    pub size: (u16, u16),
    pub prefs: Option<UiPrefs>,
    pub title: Option<String>,
    pub disposed: bool,
}

/// Test-side view of one created surface
#[derive(Clone)]
pub struct SurfaceProbe {
    pub target: AttachTarget,
    record: Arc<Mutex<SurfaceRecord>>,
}

impl SurfaceProbe {
    pub fn record(&self) -> SurfaceRecord {
        self.record.lock().clone()
    }

    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.record.lock().output).into_owned()
    }
}

struct MockSurface {
    record: Arc<Mutex<SurfaceRecord>>,
}

impl TerminalSurface for MockSurface {
    fn write_output(&mut self, bytes: &[u8]) {
        let mut record = self.record.lock();
        record.output.extend_from_slice(bytes);
        let text = String::from_utf8_lossy(bytes);
        if let Some(rest) = text.strip_prefix("\x1b]2;")
            && let Some(end) = rest.find('\x07')
        {
            record.title = Some(rest[..end].to_string());
        }
    }

    fn suspend(&mut self) {
        self.record.lock().suspended = true;
    }

    fn resume(&mut self) {
        self.record.lock().suspended = false;
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        self.record.lock().size = (cols, rows);
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.record.lock().input_enabled = enabled;
    }

    fn claim_focus(&mut self) {
        self.record.lock().focus_claims += 1;
    }

    fn apply_prefs(&mut self, prefs: &UiPrefs) {
        self.record.lock().prefs = Some(*prefs);
    }

    fn title(&self) -> Option<String> {
        self.record.lock().title.clone()
    }

    fn dispose(&mut self) {
        self.record.lock().disposed = true;
    }
}

/// Records every surface it creates; clones share the record list
#[derive(Clone, Default)]
pub struct MockSurfaceFactory {
    created: Arc<Mutex<Vec<SurfaceProbe>>>,
}

impl MockSurfaceFactory {
    pub fn count(&self) -> usize {
        self.created.lock().len()
    }

    pub fn probes(&self) -> Vec<SurfaceProbe> {
        self.created.lock().clone()
    }

    /// Most recent surface for a target
    pub fn probe_for(&self, session: &str, window_index: u32) -> Option<SurfaceProbe> {
        let target = AttachTarget::new(session, window_index);
        self.created
            .lock()
            .iter()
            .rev()
            .find(|probe| probe.target == target)
            .cloned()
    }
}

impl SurfaceFactory for MockSurfaceFactory {
    fn create(&self, target: &AttachTarget, cols: u16, rows: u16) -> Box<dyn TerminalSurface> {
        let record = Arc::new(Mutex::new(SurfaceRecord {
            size: (cols, rows),
            ..SurfaceRecord::default()
        }));
        self.created.lock().push(SurfaceProbe {
            target: target.clone(),
            record: Arc::clone(&record),
        });
        Box::new(MockSurface { record })
    }
}

// ============================================================================
// Browser services
// ============================================================================

#[derive(Default)]
struct ScriptState {
    delays: HashMap<String, Duration>,
    failures: HashSet<String>,
    calls: Vec<String>,
}

/// Directory and repository services answering from a script
///
/// Request keys: `list:<path>`, `log`, `commit:<hash>`, `file:<path>`.
#[derive(Clone, Default)]
pub struct ScriptedServices {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay responses to `key`
    pub fn delay(&self, key: &str, delay: Duration) {
        self.state.lock().delays.insert(key.to_string(), delay);
    }

    /// Make requests for `key` fail
    pub fn fail(&self, key: &str) {
        self.state.lock().failures.insert(key.to_string());
    }

    /// Make requests for `key` succeed again
    pub fn heal(&self, key: &str) {
        self.state.lock().failures.remove(key);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, key: &str) -> usize {
        self.state.lock().calls.iter().filter(|call| *call == key).count()
    }

    pub fn services(&self) -> Services {
        Services::new(Arc::new(self.clone()), Arc::new(self.clone()))
    }

    /// Record the call, wait out its delay, then report whether it fails
    async fn respond(&self, key: String) -> Result<(), ServiceError> {
        let delay = {
            let mut state = self.state.lock();
            state.calls.push(key.clone());
            state.delays.get(&key).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.state.lock().failures.contains(&key) {
            return Err(ServiceError::Failed(format!("{key} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryService for ScriptedServices {
    async fn list(&self, _session: &str, path: &str) -> Result<Vec<DirEntry>, ServiceError> {
        self.respond(format!("list:{path}")).await?;
        Ok(vec![DirEntry {
            name: format!("{path}/entry"),
            is_dir: false,
            size: Some(1),
        }])
    }
}

#[async_trait]
impl RepositoryService for ScriptedServices {
    async fn log(&self, session: &str) -> Result<Vec<CommitSummary>, ServiceError> {
        self.respond("log".to_string()).await?;
        Ok(vec![CommitSummary {
            hash: "abc123".to_string(),
            summary: format!("{session} head"),
            author: "dev".to_string(),
        }])
    }

    async fn commit_diff(&self, _session: &str, hash: &str) -> Result<String, ServiceError> {
        self.respond(format!("commit:{hash}")).await?;
        Ok(format!("diff of commit {hash}"))
    }

    async fn file_diff(&self, _session: &str, path: &str) -> Result<String, ServiceError> {
        self.respond(format!("file:{path}")).await?;
        Ok(format!("diff of file {path}"))
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A manager wired to scripted collaborators
pub struct Harness {
    pub manager: PanelManager,
    pub notices: NoticeReceiver,
    pub connector: MockConnector,
    pub surfaces: MockSurfaceFactory,
    pub services: ScriptedServices,
    pub store: Arc<MemoryStateStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(MockConnector::new(), Arc::new(MemoryStateStore::new()))
    }

    pub fn with_connector(connector: MockConnector) -> Self {
        Self::build(connector, Arc::new(MemoryStateStore::new()))
    }

    pub fn with_store(store: Arc<MemoryStateStore>) -> Self {
        Self::build(MockConnector::new(), store)
    }

    fn build(connector: MockConnector, store: Arc<MemoryStateStore>) -> Self {
        let surfaces = MockSurfaceFactory::default();
        let services = ScriptedServices::new();
        let collaborators = Collaborators {
            connector: Arc::new(connector.clone()),
            surfaces: Arc::new(surfaces.clone()),
            services: services.services(),
            store: store.clone(),
        };
        let (manager, notices) = PanelManager::new(
            tokio::runtime::Handle::current(),
            collaborators,
            ManagerOptions::default(),
        );
        Self {
            manager,
            notices,
            connector,
            surfaces,
            services,
            store,
        }
    }

    /// Let background work finish, then apply its events
    pub async fn settle(&mut self) {
        settle().await;
        self.manager.process_pending();
    }

    /// Advance the paused clock by `duration`, then apply events
    pub async fn advance(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
        self.manager.process_pending();
    }

    pub fn drain_notices(&mut self) -> Vec<PanelNotice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notices.try_recv() {
            notices.push(notice);
        }
        notices
    }

    pub fn tab(&self, panel: PanelId, key: TabKey) -> Option<&TabState> {
        self.manager.panel(panel)?.cache().get(key)
    }

    pub fn terminal(&self, panel: PanelId, window_index: u32) -> Option<&TerminalTab> {
        self.tab(panel, TabKey::Terminal(window_index))?.as_terminal()
    }
}
