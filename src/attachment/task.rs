//! Attachment worker task: open, pump, back off, repeat.

use super::{BackoffPolicy, Command, ConnectionState, Shared};
use crate::transport::{Connector, FrameStream, TransportError};
use panemux_protocol::{ClientFrame, ServerFrame};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;

/// Why the pump loop returned
enum PumpExit {
    /// The stream ended or failed; reconnect
    StreamClosed,
    /// The handle is gone or the attachment was destroyed
    Shutdown,
}

enum Step {
    Command(Option<Command>),
    Frame(Option<Result<ServerFrame, TransportError>>),
}

pub(super) async fn run(
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    policy: BackoffPolicy,
    mut commands: UnboundedReceiver<Command>,
) {
    loop {
        if shared.is_destroyed() {
            return;
        }

        match connector.open(shared.target()).await {
            Ok(mut stream) => {
                shared.reset_retries();
                if !shared.transition(ConnectionState::Connected) {
                    stream.close().await;
                    return;
                }
                let exit = pump(&shared, stream.as_mut(), &mut commands).await;
                stream.close().await;
                match exit {
                    PumpExit::Shutdown => return,
                    PumpExit::StreamClosed => {
                        if !shared.transition(ConnectionState::Connecting) {
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                log::warn!("Attachment {}: {}", shared.target(), e);
            }
        }

        if !wait_for_retry(&shared, &policy, &mut commands).await {
            return;
        }
    }
}

/// Shuttle frames until the stream closes
async fn pump(
    shared: &Shared,
    stream: &mut dyn FrameStream,
    commands: &mut UnboundedReceiver<Command>,
) -> PumpExit {
    loop {
        let step = tokio::select! {
            command = commands.recv() => Step::Command(command),
            frame = stream.recv() => Step::Frame(frame),
        };

        match step {
            Step::Command(None) => return PumpExit::Shutdown,
            Step::Command(Some(Command::Input(bytes))) => {
                if let Err(e) = stream.send(ClientFrame::input(&bytes)).await {
                    log::warn!("Attachment {}: {}", shared.target(), e);
                    return PumpExit::StreamClosed;
                }
            }
            Step::Command(Some(Command::Resize { cols, rows })) => {
                if let Err(e) = stream.send(ClientFrame::Resize { cols, rows }).await {
                    log::warn!("Attachment {}: {}", shared.target(), e);
                    return PumpExit::StreamClosed;
                }
            }
            // Already connected
            Step::Command(Some(Command::RetryNow)) => {}
            Step::Frame(None) => {
                log::info!("Attachment {} closed by server", shared.target());
                return PumpExit::StreamClosed;
            }
            Step::Frame(Some(Err(e))) => {
                log::warn!("Attachment {}: {}", shared.target(), e);
                return PumpExit::StreamClosed;
            }
            Step::Frame(Some(Ok(ServerFrame::Output { data }))) => {
                if !shared.emit_output(data.into_bytes()) {
                    return PumpExit::Shutdown;
                }
            }
            Step::Frame(Some(Ok(ServerFrame::Unknown))) => {
                log::trace!("Attachment {} ignoring unknown frame", shared.target());
            }
        }
    }
}

/// Sleep out the backoff delay. Returns false when the worker should exit.
///
/// A `RetryNow` that was queued while the last open was in flight cuts the
/// wait short without counting a retry.
async fn wait_for_retry(
    shared: &Shared,
    policy: &BackoffPolicy,
    commands: &mut UnboundedReceiver<Command>,
) -> bool {
    let mut immediate = false;
    loop {
        match commands.try_recv() {
            Ok(Command::RetryNow) => immediate = true,
            // Input and resize are dropped while not connected
            Ok(_) => {}
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
    if immediate {
        return !shared.is_destroyed();
    }

    let attempt = shared.next_retry();
    let delay = policy.delay(attempt);
    log::info!(
        "Attachment {} reconnecting in {:?} (retry {})",
        shared.target(),
        delay,
        attempt + 1
    );

    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => break,
            command = commands.recv() => match command {
                Some(Command::RetryNow) => break,
                Some(_) => {}
                None => return false,
            },
        }
    }
    !shared.is_destroyed()
}
