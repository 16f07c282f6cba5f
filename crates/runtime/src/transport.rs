//! Framed stdio transport to the wallet bridge host.
//!
//! Each frame is a u32 little-endian byte length followed by a JSON
//! body - the framing native-messaging hosts already speak. The
//! transport is split into a sender half (owned by the connection's
//! writer task) and a receiver half (a read loop that forwards parsed
//! frames to an mpsc channel), so tests can drive a connection over
//! in-memory duplex pipes exactly as production drives it over a
//! child process's stdio.

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Upper bound on a single frame body. A wallet response is a few
/// hundred bytes; anything near this size is a corrupt length prefix.
const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

/// Sender half of a transport.
pub trait Transport: Send {
    /// Serializes and writes one message frame.
    fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Receiver half of a transport.
pub trait TransportReceiver: Send {
    /// Runs the read loop until EOF or a framing error, forwarding
    /// each parsed frame to the message channel handed out at
    /// construction. Returns `Ok(())` on clean EOF.
    fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// The three pieces a [`Connection`](crate::Connection) needs.
pub struct TransportParts {
    pub sender: Box<dyn Transport>,
    pub receiver: Box<dyn TransportReceiver>,
    pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// Transport over a pair of byte streams (child stdio or test pipes).
pub struct PipeTransport<W, R> {
    sender: PipeTransportSender<W>,
    receiver: PipeTransportReceiver<R>,
}

impl<W, R> PipeTransport<W, R>
where
    W: AsyncWrite + Unpin + Send + 'static,
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Creates a transport writing frames to `writer` and reading
    /// frames from `reader`. Returns the receiver's output channel
    /// alongside the transport.
    pub fn new(writer: W, reader: R) -> (Self, mpsc::UnboundedReceiver<Value>) {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let transport = Self {
            sender: PipeTransportSender { writer },
            receiver: PipeTransportReceiver { reader, message_tx },
        };
        (transport, message_rx)
    }

    /// Splits into independent sender and receiver halves.
    pub fn into_parts(self) -> (PipeTransportSender<W>, PipeTransportReceiver<R>) {
        (self.sender, self.receiver)
    }

    /// Boxes the halves together with the message channel for a
    /// [`Connection`](crate::Connection).
    pub fn into_transport_parts(self, message_rx: mpsc::UnboundedReceiver<Value>) -> TransportParts {
        let (sender, receiver) = self.into_parts();
        TransportParts {
            sender: Box::new(sender),
            receiver: Box::new(receiver),
            message_rx,
        }
    }
}

/// Writes `[len: u32 LE][json bytes]` frames.
pub struct PipeTransportSender<W> {
    writer: W,
}

impl<W> PipeTransportSender<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub async fn send(&mut self, message: Value) -> Result<()> {
        let body = serde_json::to_vec(&message)?;
        let len = u32::try_from(body.len())
            .map_err(|_| Error::Transport(format!("frame too large: {} bytes", body.len())))?;
        if len > MAX_FRAME_BYTES {
            return Err(Error::Transport(format!("frame too large: {len} bytes")));
        }
        self.writer.write_all(&len.to_le_bytes()).await?;
        self.writer.write_all(&body).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

impl<W> Transport for PipeTransportSender<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn send(&mut self, message: Value) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(PipeTransportSender::send(self, message))
    }
}

/// Reads frames and forwards them until EOF.
pub struct PipeTransportReceiver<R> {
    reader: R,
    message_tx: mpsc::UnboundedSender<Value>,
}

impl<R> PipeTransportReceiver<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub async fn run(mut self) -> Result<()> {
        loop {
            let mut len_buf = [0u8; 4];
            match self.reader.read_exact(&mut len_buf).await {
                Ok(_) => {}
                // Bridge exited; not an error from the transport's view.
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e.into()),
            }
            let len = u32::from_le_bytes(len_buf);
            if len > MAX_FRAME_BYTES {
                return Err(Error::Transport(format!(
                    "frame length {len} exceeds {MAX_FRAME_BYTES}"
                )));
            }

            let mut body = vec![0u8; len as usize];
            self.reader.read_exact(&mut body).await?;

            match serde_json::from_slice::<Value>(&body) {
                Ok(message) => {
                    if self.message_tx.send(message).is_err() {
                        // Connection dropped its receiver; stop reading.
                        return Ok(());
                    }
                }
                Err(e) => {
                    tracing::warn!("discarding unparseable frame: {e}");
                }
            }
        }
    }
}

impl<R> TransportReceiver for PipeTransportReceiver<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        Box::pin(PipeTransportReceiver::run(*self))
    }
}
