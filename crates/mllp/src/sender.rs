//! One-shot MLLP sender for outbound HL7 messages

use std::future::Future;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};

use crate::codec::{decode_frame, encode};
use crate::config::SenderConfig;
use crate::{MllpError, Result};

/// Outcome of a successful send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    /// Number of bytes written, including the frame markers
    pub bytes_written: usize,

    /// Acknowledgement returned by the remote host, if one arrived in time
    pub ack: Option<String>,
}

/// MLLP sender. Each call to [`MllpSender::send`] is a single attempt on a
/// fresh connection; retrying is left to the caller.
pub struct MllpSender {
    config: SenderConfig,
}

impl MllpSender {
    /// Create a new sender with the given configuration
    pub fn new(config: SenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SenderConfig {
        &self.config
    }

    /// Send one message and wait for its acknowledgement.
    ///
    /// Line endings are converted to bare carriage returns before framing.
    /// Connect, TLS and write failures are reported as distinct errors; a
    /// missing acknowledgement is not an error.
    pub async fn send(&self, message: &str) -> Result<SendReport> {
        self.config.validate()?;

        let addr = self.config.address();
        let deadline = Instant::now() + self.config.timeout();
        info!("Sending HL7 message to {} (tls: {})", addr, self.config.use_tls);

        let payload = self.config.encoding.encode(&to_segment_terminators(message));
        let frame = encode(&payload);

        let stream = connect_within(addr.clone(), self.config.timeout(), TcpStream::connect(&addr)).await?;
        debug!("Connected to {}", addr);

        if self.config.use_tls {
            self.send_tls(stream, &addr, &frame, deadline).await
        } else {
            let mut stream = stream;
            self.exchange(&mut stream, &frame, deadline).await
        }
    }

    #[cfg(feature = "tls")]
    async fn send_tls(
        &self,
        stream: TcpStream,
        addr: &str,
        frame: &[u8],
        deadline: Instant,
    ) -> Result<SendReport> {
        if self.config.ignore_cert_error {
            warn!("Certificate validation disabled for {}", addr);
        }

        let handshake = crate::tls::connect(stream, &self.config.host, self.config.ignore_cert_error);
        let mut tls_stream = match tokio::time::timeout_at(deadline, handshake).await {
            Ok(result) => result?,
            Err(_) => return Err(MllpError::tls(addr, "handshake timed out")),
        };
        debug!("TLS established with {}", addr);

        let report = self.exchange(&mut tls_stream, frame, deadline).await;
        shutdown_within(&mut tls_stream, deadline, addr).await;
        report
    }

    #[cfg(not(feature = "tls"))]
    async fn send_tls(
        &self,
        _stream: TcpStream,
        _addr: &str,
        _frame: &[u8],
        _deadline: Instant,
    ) -> Result<SendReport> {
        Err(MllpError::NotSupported("TLS requires feature 'tls'".into()))
    }

    /// Write the frame and read back at most one acknowledgement frame
    async fn exchange<S>(&self, stream: &mut S, frame: &[u8], deadline: Instant) -> Result<SendReport>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let write = async {
            stream.write_all(frame).await?;
            stream.flush().await
        };
        match tokio::time::timeout_at(deadline, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(MllpError::Write(e)),
            Err(_) => {
                return Err(MllpError::Timeout(format!(
                    "writing {} bytes to {}",
                    frame.len(),
                    self.config.address()
                )))
            }
        }
        info!("Message sent ({} bytes)", frame.len());

        let ack = match tokio::time::timeout_at(deadline, read_ack(stream)).await {
            Ok(Ok(ack)) => ack.map(|bytes| self.config.encoding.decode(&bytes)),
            Ok(Err(e)) => {
                debug!("Failed to read acknowledgement: {}", e);
                None
            }
            Err(_) => {
                debug!("No acknowledgement before timeout");
                None
            }
        };

        Ok(SendReport {
            bytes_written: frame.len(),
            ack,
        })
    }
}

/// Await `connect`, giving up after `limit`
async fn connect_within<S, F>(addr: String, limit: Duration, connect: F) -> Result<S>
where
    F: Future<Output = std::io::Result<S>>,
{
    match timeout(limit, connect).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(source)) => {
            warn!("Connection to {} failed: {}", addr, source);
            Err(MllpError::Connect { addr, source })
        }
        Err(_) => {
            warn!("Connection to {} timed out", addr);
            Err(MllpError::ConnectTimeout { addr, timeout: limit })
        }
    }
}

/// Close the write half, giving up at `deadline`. Failures are logged only.
#[cfg_attr(not(feature = "tls"), allow(dead_code))]
async fn shutdown_within<S>(stream: &mut S, deadline: Instant, addr: &str) -> bool
where
    S: AsyncWrite + Unpin,
{
    match tokio::time::timeout_at(deadline, stream.shutdown()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            debug!("Shutdown of connection to {} failed: {}", addr, e);
            false
        }
        Err(_) => {
            debug!("Shutdown of connection to {} timed out", addr);
            false
        }
    }
}

/// Read until one complete frame arrives or the peer closes the connection
async fn read_ack<S>(stream: &mut S) -> std::io::Result<Option<bytes::Bytes>>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = BytesMut::with_capacity(1024);
    loop {
        if let Some(frame) = decode_frame(&mut buffer) {
            return Ok(Some(frame));
        }
        if stream.read_buf(&mut buffer).await? == 0 {
            return Ok(None);
        }
    }
}

/// Convert `\r\n` and `\n` line endings to the HL7 segment terminator `\r`
pub fn to_segment_terminators(message: &str) -> String {
    message.replace("\r\n", "\r").replace('\n', "\r")
}
