//! Concurrent MLLP listener for inbound HL7 messages

use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use socket2::SockRef;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::ack::build_ack;
use crate::codec::MllpCodec;
use crate::config::ListenerConfig;
use crate::{MllpError, Result};

/// Events surfaced to the owner of a running listener
#[derive(Debug)]
pub enum ListenerEvent {
    /// A complete message arrived and has been acknowledged
    Received { peer: SocketAddr, message: Bytes },

    /// A single connection failed; other connections are unaffected
    ConnectionError { peer: SocketAddr, error: MllpError },
}

/// A bound, not yet running, MLLP listener
pub struct MllpListener {
    config: ListenerConfig,
    listener: TcpListener,
}

impl MllpListener {
    /// Bind the listening socket
    pub async fn bind(config: ListenerConfig) -> Result<Self> {
        config.validate()?;

        let addr = SocketAddr::new(config.bind_addr, config.port);
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.set_reuseaddr(true)?;
        socket.bind(addr)?;
        let listener = socket.listen(1024)?;

        info!("MLLP listener bound on {}", listener.local_addr()?);
        Ok(Self { config, listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Start accepting connections.
    ///
    /// Received messages and per-connection failures are delivered on the
    /// returned channel. The listener runs until [`ListenerHandle::stop`] is
    /// called or the handle is dropped.
    pub fn start(self) -> Result<(ListenerHandle, mpsc::Receiver<ListenerEvent>)> {
        let local_addr = self.local_addr()?;
        let (events_tx, events_rx) = mpsc::channel(self.config.event_capacity);
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(accept_loop(
            self.listener,
            self.config.max_frame_len,
            events_tx,
            shutdown.clone(),
        ));

        let handle = ListenerHandle {
            local_addr,
            shutdown,
            finished: CancellationToken::new(),
            task: Mutex::new(Some(task)),
        };
        Ok((handle, events_rx))
    }
}

/// Control handle for a running listener
pub struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    /// Cancelled once teardown has completed
    finished: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ListenerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Close the listening socket and every active connection.
    ///
    /// Returns once the accept loop and all connection tasks have finished,
    /// including for callers that race an in-progress stop. Calling it again
    /// after that is a no-op.
    pub async fn stop(&self) {
        self.shutdown.cancel();

        let task = match self.task.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("MLLP listener task on {} failed: {}", self.local_addr, e);
            }
            info!("MLLP listener on {} stopped", self.local_addr);
            self.finished.cancel();
        }

        self.finished.cancelled().await;
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn accept_loop(
    listener: TcpListener,
    max_frame_len: usize,
    events: mpsc::Sender<ListenerEvent>,
    shutdown: CancellationToken,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("Accepted connection from {}", peer);
                    connections.spawn(handle_connection(
                        stream,
                        peer,
                        max_frame_len,
                        events.clone(),
                        shutdown.child_token(),
                    ));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            },
            // Reap finished connections so the set does not grow unbounded
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    drop(listener);
    connections.shutdown().await;
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    max_frame_len: usize,
    events: mpsc::Sender<ListenerEvent>,
    shutdown: CancellationToken,
) {
    let mut framed = Framed::new(stream, MllpCodec::with_max_frame_len(max_frame_len));

    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = framed.next() => frame,
        };

        match frame {
            Some(Ok(message)) => {
                info!("Received message from {} ({} bytes)", peer, message.len());
                let ack = Bytes::from(build_ack(&message));

                if events
                    .send(ListenerEvent::Received { peer, message })
                    .await
                    .is_err()
                {
                    debug!("Event receiver dropped; acknowledging without delivery");
                }

                if let Err(e) = framed.send(ack).await {
                    warn!("Failed to acknowledge message from {}: {}", peer, e);
                    report(&events, peer, e).await;
                    break;
                }
            }
            Some(Err(e)) => {
                warn!("Closing connection from {}: {}", peer, e);
                if matches!(e, MllpError::BufferOverflow { .. }) {
                    reset(framed.get_ref());
                }
                report(&events, peer, e).await;
                break;
            }
            None => {
                debug!("Connection from {} closed by peer", peer);
                break;
            }
        }
    }
}

async fn report(events: &mpsc::Sender<ListenerEvent>, peer: SocketAddr, error: MllpError) {
    let _ = events
        .send(ListenerEvent::ConnectionError { peer, error })
        .await;
}

/// Abort the connection with a TCP reset instead of an orderly close
fn reset(stream: &TcpStream) {
    if let Err(e) = SockRef::from(stream).set_linger(Some(Duration::ZERO)) {
        debug!("Failed to set SO_LINGER for reset: {}", e);
    }
}
