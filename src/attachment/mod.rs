//! Resilient attachment to one remote (session, window).
//!
//! An [`Attachment`] is a handle to a background tokio task that owns the
//! transport stream and the backoff timer. The handle and the task share a
//! small state record; every state change and every output chunk is posted to
//! the core event channel while holding that record's lock, and only if the
//! attachment has not been destroyed. [`Attachment::disconnect`] flips the
//! destroyed flag under the same lock, so nothing is emitted after it returns
//! even if a retry timer or an open was already in flight.
//!
//! ## State machine
//!
//! ```text
//! Disconnected --connect()--> Connecting --open ok--> Connected
//!                                 ^                       |
//!                                 +----stream closed------+
//! any state --disconnect()--> Disconnected (destroyed, terminal)
//! ```

mod backoff;
mod task;

pub use backoff::BackoffPolicy;

use crate::event::{CoreEvent, EventSender, ResourceId};
use crate::transport::Connector;
use panemux_protocol::AttachTarget;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Connection indicator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        })
    }
}

/// Event posted by an attachment to its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentEvent {
    StateChanged(ConnectionState),
    /// Output bytes for the rendering surface
    Output(Vec<u8>),
}

/// Messages from the handle to the worker task
#[derive(Debug)]
pub(crate) enum Command {
    Input(Vec<u8>),
    Resize { cols: u16, rows: u16 },
    /// Skip the pending backoff wait and attempt now
    RetryNow,
}

#[derive(Debug)]
struct Inner {
    state: ConnectionState,
    destroyed: bool,
}

/// State shared between the handle and the worker task
pub(crate) struct Shared {
    id: ResourceId,
    target: AttachTarget,
    inner: Mutex<Inner>,
    retry_count: AtomicU32,
    events: EventSender,
}

impl Shared {
    /// Move to `state` and notify the owner. Returns false once destroyed.
    pub(crate) fn transition(&self, state: ConnectionState) -> bool {
        let mut inner = self.inner.lock();
        if inner.destroyed {
            return false;
        }
        if inner.state != state {
            log::debug!(
                "Attachment {} ({}): {} -> {}",
                self.id,
                self.target,
                inner.state,
                state
            );
            inner.state = state;
            let _ = self.events.send(CoreEvent::Attachment {
                id: self.id,
                event: AttachmentEvent::StateChanged(state),
            });
        }
        true
    }

    /// Forward output to the owner. Returns false once destroyed.
    pub(crate) fn emit_output(&self, bytes: Vec<u8>) -> bool {
        let inner = self.inner.lock();
        if inner.destroyed {
            return false;
        }
        let _ = self.events.send(CoreEvent::Attachment {
            id: self.id,
            event: AttachmentEvent::Output(bytes),
        });
        true
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.inner.lock().destroyed
    }

    pub(crate) fn target(&self) -> &AttachTarget {
        &self.target
    }

    pub(crate) fn reset_retries(&self) {
        self.retry_count.store(0, Ordering::SeqCst);
    }

    /// Count one scheduled retry, returning the count before the increment
    pub(crate) fn next_retry(&self) -> u32 {
        self.retry_count.fetch_add(1, Ordering::SeqCst)
    }
}

/// Handle to one resilient attachment
pub struct Attachment {
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    policy: BackoffPolicy,
    runtime: Handle,
    commands: Option<mpsc::UnboundedSender<Command>>,
    task: Option<JoinHandle<()>>,
}

impl Attachment {
    /// Create a disconnected attachment; nothing runs until [`connect`](Self::connect)
    pub fn new(
        id: ResourceId,
        target: AttachTarget,
        connector: Arc<dyn Connector>,
        policy: BackoffPolicy,
        runtime: Handle,
        events: EventSender,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                id,
                target,
                inner: Mutex::new(Inner {
                    state: ConnectionState::Disconnected,
                    destroyed: false,
                }),
                retry_count: AtomicU32::new(0),
                events,
            }),
            connector,
            policy,
            runtime,
            commands: None,
            task: None,
        }
    }

    /// Start the first connection attempt
    ///
    /// Moves to `Connecting` immediately and spawns the worker. No-op when
    /// destroyed or already running.
    pub fn connect(&mut self) {
        if self.task.is_some() || !self.shared.transition(ConnectionState::Connecting) {
            return;
        }
        log::info!("Attachment {} connecting to {}", self.shared.id, self.shared.target);

        let (tx, rx) = mpsc::unbounded_channel();
        self.commands = Some(tx);
        self.task = Some(self.runtime.spawn(task::run(
            Arc::clone(&self.shared),
            Arc::clone(&self.connector),
            self.policy,
            rx,
        )));
    }

    /// Cancel the pending backoff wait, reset the retry count, and attempt now
    ///
    /// Starts the first attempt when never connected. No-op while connected or
    /// after [`disconnect`](Self::disconnect).
    pub fn reconnect_now(&mut self) {
        match self.state() {
            ConnectionState::Disconnected => self.connect(),
            ConnectionState::Connecting => {
                if self.is_destroyed() {
                    return;
                }
                log::info!("Attachment {} manual reconnect", self.shared.id);
                self.shared.reset_retries();
                self.send_command(Command::RetryNow);
            }
            ConnectionState::Connected => {}
        }
    }

    /// Connectivity came back: retry immediately with a fresh backoff sequence
    ///
    /// Only acts while `Connecting`.
    pub fn network_restored(&self) {
        if self.is_destroyed() || self.state() != ConnectionState::Connecting {
            return;
        }
        log::info!("Attachment {} network restored", self.shared.id);
        self.shared.reset_retries();
        self.send_command(Command::RetryNow);
    }

    /// Send keystrokes; silently dropped unless connected
    pub fn send_input(&self, bytes: &[u8]) {
        if self.state() == ConnectionState::Connected {
            self.send_command(Command::Input(bytes.to_vec()));
        } else {
            log::trace!("Attachment {} dropping {} input bytes", self.shared.id, bytes.len());
        }
    }

    /// Send new geometry; silently dropped unless connected
    pub fn send_resize(&self, cols: u16, rows: u16) {
        if self.state() == ConnectionState::Connected {
            self.send_command(Command::Resize { cols, rows });
        }
    }

    /// Tear down for good: cancel the worker and any pending timer
    ///
    /// Emits one final `Disconnected` state change. Idempotent.
    pub fn disconnect(&mut self) {
        {
            let mut inner = self.shared.inner.lock();
            if inner.destroyed {
                return;
            }
            inner.destroyed = true;
            inner.state = ConnectionState::Disconnected;
            let _ = self.shared.events.send(CoreEvent::Attachment {
                id: self.shared.id,
                event: AttachmentEvent::StateChanged(ConnectionState::Disconnected),
            });
        }

        self.commands = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        log::info!(
            "Attachment {} to {} disconnected",
            self.shared.id,
            self.shared.target
        );
    }

    pub fn id(&self) -> ResourceId {
        self.shared.id
    }

    pub fn target(&self) -> &AttachTarget {
        &self.shared.target
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.inner.lock().state
    }

    /// Number of retries scheduled since the last successful open or reset
    pub fn retry_count(&self) -> u32 {
        self.shared.retry_count.load(Ordering::SeqCst)
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.is_destroyed()
    }

    fn send_command(&self, command: Command) {
        if let Some(tx) = &self.commands {
            let _ = tx.send(command);
        }
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("id", &self.shared.id)
            .field("target", &self.shared.target)
            .field("state", &self.state())
            .field("retry_count", &self.retry_count())
            .finish()
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{FrameStream, TransportError};
    use async_trait::async_trait;

    struct Refusing;

    #[async_trait]
    impl Connector for Refusing {
        async fn open(
            &self,
            target: &AttachTarget,
        ) -> Result<Box<dyn FrameStream>, TransportError> {
            Err(TransportError::Open {
                target: target.to_string(),
                reason: "refused".to_string(),
            })
        }
    }

    fn attachment(events: EventSender) -> Attachment {
        Attachment::new(
            7,
            AttachTarget::new("dev", 0),
            Arc::new(Refusing),
            BackoffPolicy::default(),
            Handle::current(),
            events,
        )
    }

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_moves_to_connecting_synchronously() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut attachment = attachment(tx);
        assert_eq!(attachment.state(), ConnectionState::Disconnected);

        attachment.connect();
        assert_eq!(attachment.state(), ConnectionState::Connecting);
        assert!(matches!(
            rx.try_recv(),
            Ok(CoreEvent::Attachment {
                id: 7,
                event: AttachmentEvent::StateChanged(ConnectionState::Connecting)
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_is_terminal_and_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut attachment = attachment(tx);
        attachment.connect();
        attachment.disconnect();
        attachment.disconnect();
        attachment.connect();
        attachment.reconnect_now();

        assert!(attachment.is_destroyed());
        assert_eq!(attachment.state(), ConnectionState::Disconnected);

        let mut states = Vec::new();
        while let Ok(CoreEvent::Attachment { event, .. }) = rx.try_recv() {
            states.push(event);
        }
        assert_eq!(
            states,
            vec![
                AttachmentEvent::StateChanged(ConnectionState::Connecting),
                AttachmentEvent::StateChanged(ConnectionState::Disconnected),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_dropped_while_not_connected() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let attachment = attachment(tx);
        // No worker and no command channel yet: must not panic
        attachment.send_input(b"ls\r");
        attachment.send_resize(80, 24);
        assert_eq!(attachment.retry_count(), 0);
    }
}
