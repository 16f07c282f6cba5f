//! JSON-RPC connection to the wallet bridge.
//!
//! Implements the request/response correlation layer on top of the
//! transport:
//! - generating unique request ids
//! - correlating responses with pending requests
//! - distinguishing id-less notifications from responses
//! - parsing notifications into [`ProviderEvent`]s for subscribers
//!
//! # Message flow
//!
//! 1. A caller invokes [`Connection::request`] with method and params
//! 2. The connection allocates an id and registers a oneshot callback
//! 3. The request is queued to the writer task and sent as one frame
//! 4. The caller awaits the oneshot receiver
//! 5. The read loop correlates the response by id and completes the
//!    callback (wallet error objects become [`Error::Rpc`])
//!
//! Frames without an id are wallet notifications and are dispatched
//! to the event bus instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::{broadcast, mpsc, oneshot};

use rw_protocol::{Address, ChainId};

use crate::error::{Error, Result};
use crate::events::{EventBus, ProviderEvent};
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// Request frame sent to the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Unique request id for correlating the response.
    pub id: u64,
    /// Provider method name (`eth_requestAccounts`, ...).
    pub method: String,
    /// Method parameters; omitted when the method takes none.
    #[serde(skip_serializing_if = "Value::is_null", default)]
    pub params: Value,
}

/// Response frame from the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Request id this response correlates to.
    pub id: u64,
    /// Success result (mutually exclusive with error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// EIP-1193 error object (mutually exclusive with result).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorPayload>,
}

/// EIP-1193 error object carried in a failed response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorPayload {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Notification frame pushed by the wallet (no id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Event name: `accountsChanged` or `chainChanged`.
    pub method: String,
    /// Event payload: address array or hex chain id string.
    #[serde(default)]
    pub params: Value,
}

/// Discriminated union of bridge frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// Response message (has `id`).
    Response(Response),
    /// Notification message (no `id`).
    Notification(Notification),
    /// Unknown frame (forward-compatible catch-all).
    Unknown(Value),
}

/// Pending request callbacks keyed by request id.
type CallbackMap = Arc<TokioMutex<HashMap<u64, oneshot::Sender<Result<Value>>>>>;

/// RAII guard ensuring callback cleanup when a request future is dropped.
struct CancelGuard {
    id: u64,
    callbacks: CallbackMap,
    completed: bool,
}

impl CancelGuard {
    fn new(id: u64, callbacks: CallbackMap) -> Self {
        Self {
            id,
            callbacks,
            completed: false,
        }
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if self.completed {
            return;
        }

        let id = self.id;
        let callbacks = Arc::clone(&self.callbacks);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if callbacks.lock().await.remove(&id).is_some() {
                    tracing::debug!(id, "removed orphaned callback");
                }
            });
        }
    }
}

/// Future returned by [`Connection::request`] with automatic
/// cancellation cleanup.
struct ResponseFuture {
    rx: oneshot::Receiver<Result<Value>>,
    guard: CancelGuard,
}

impl Future for ResponseFuture {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(result) => {
                self.guard.complete();
                Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// JSON-RPC connection to the wallet bridge.
///
/// Manages request/response correlation and notification dispatch.
/// Sequential request ids, oneshot channels for correlation.
pub struct Connection {
    /// Sequential request id counter.
    last_id: AtomicU64,
    /// Pending request callbacks keyed by request id.
    callbacks: CallbackMap,
    /// Channel for queueing outbound messages to the writer task.
    outbound_tx: mpsc::UnboundedSender<Value>,
    /// Transport sender (taken by `run()` to start the writer task).
    transport_sender: TokioMutex<Option<Box<dyn Transport>>>,
    /// Receiver half of the transport (taken once by `run()`).
    transport_receiver: TokioMutex<Option<Box<dyn TransportReceiver>>>,
    /// Incoming parsed frames from the transport.
    message_rx: TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>,
    /// Receiver for outbound messages (taken by `run()`).
    outbound_rx: TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>,
    /// Fan-out for wallet notifications.
    events: EventBus,
}

impl Connection {
    /// Creates a new connection over the given transport.
    pub fn new(parts: TransportParts) -> Self {
        let TransportParts {
            sender,
            receiver,
            message_rx,
        } = parts;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Self {
            last_id: AtomicU64::new(0),
            callbacks: Arc::new(TokioMutex::new(HashMap::new())),
            outbound_tx,
            transport_sender: TokioMutex::new(Some(sender)),
            transport_receiver: TokioMutex::new(Some(receiver)),
            message_rx: TokioMutex::new(Some(message_rx)),
            outbound_rx: TokioMutex::new(Some(outbound_rx)),
            events: EventBus::new(),
        }
    }

    /// Sends a provider request and awaits the response.
    ///
    /// No timeout is imposed: a request may legitimately sit for
    /// minutes while the user decides at the wallet's approval prompt.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(id, method, "sending request");

        let (tx, rx) = oneshot::channel();
        self.callbacks.lock().await.insert(id, tx);

        let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

        let request = Request {
            id,
            method: method.to_string(),
            params,
        };

        let request_value = serde_json::to_value(&request)?;
        if self.outbound_tx.send(request_value).is_err() {
            tracing::error!("failed to queue request: outbound channel closed");
            return Err(Error::ChannelClosed);
        }

        ResponseFuture { rx, guard }.await
    }

    /// Subscribes to wallet notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    /// Runs the message dispatch loop. Call once, typically from a
    /// spawned task; resolves when the transport reaches EOF.
    pub async fn run(self: &Arc<Self>) {
        let transport_receiver = self
            .transport_receiver
            .lock()
            .await
            .take()
            .expect("run() can only be called once - transport receiver already taken");

        let mut transport_sender = self
            .transport_sender
            .lock()
            .await
            .take()
            .expect("run() can only be called once - transport sender already taken");

        let mut outbound_rx = self
            .outbound_rx
            .lock()
            .await
            .take()
            .expect("run() can only be called once - outbound receiver already taken");

        let reader_handle = tokio::spawn(async move {
            if let Err(e) = transport_receiver.run().await {
                tracing::error!("transport read error: {e}");
            }
        });

        let writer_handle = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                if let Err(e) = transport_sender.send(message).await {
                    tracing::error!("transport write error: {e}");
                    break;
                }
            }
        });

        let mut message_rx = self
            .message_rx
            .lock()
            .await
            .take()
            .expect("run() can only be called once - message receiver already taken");

        while let Some(message_value) = message_rx.recv().await {
            match serde_json::from_value::<Message>(message_value) {
                Ok(message) => {
                    if let Err(e) = self.dispatch_internal(message).await {
                        tracing::error!("error dispatching message: {e}");
                    }
                }
                Err(e) => {
                    tracing::error!("failed to parse message: {e}");
                }
            }
        }

        // Bridge is gone; fail every request still waiting on it.
        for (_, callback) in self.callbacks.lock().await.drain() {
            let _ = callback.send(Err(Error::ChannelClosed));
        }

        let _ = reader_handle.await;
        let _ = writer_handle.await;
    }

    /// Dispatch an incoming message (test-only public version).
    #[cfg(test)]
    pub async fn dispatch(self: &Arc<Self>, message: Message) -> Result<()> {
        self.dispatch_internal(message).await
    }

    async fn dispatch_internal(self: &Arc<Self>, message: Message) -> Result<()> {
        match message {
            Message::Response(response) => {
                let callback = self
                    .callbacks
                    .lock()
                    .await
                    .remove(&response.id)
                    .ok_or_else(|| {
                        Error::Protocol(format!(
                            "cannot find request to respond: id={}",
                            response.id
                        ))
                    })?;

                let result = if let Some(payload) = response.error {
                    Err(Error::Rpc {
                        code: payload.code,
                        message: payload.message,
                    })
                } else {
                    Ok(response.result.unwrap_or(Value::Null))
                };

                let _ = callback.send(result);
                Ok(())
            }
            Message::Notification(notification) => {
                match parse_notification(&notification) {
                    Some(event) => {
                        tracing::debug!(method = %notification.method, "wallet notification");
                        self.events.emit(event);
                    }
                    None => {
                        tracing::debug!(
                            method = %notification.method,
                            "unrecognized notification (ignored)"
                        );
                    }
                }
                Ok(())
            }
            Message::Unknown(value) => {
                tracing::debug!(
                    "unknown frame (forward-compatible, ignored): {}",
                    serde_json::to_string(&value)
                        .unwrap_or_else(|_| "<serialization failed>".to_string())
                );
                Ok(())
            }
        }
    }
}

/// Parses a wallet notification into a [`ProviderEvent`].
///
/// `accountsChanged` carries the full ordered address array;
/// `chainChanged` carries a hex chain id string. Malformed payloads
/// yield `None` and are dropped with a debug log - a wallet speaking
/// a newer dialect must not wedge the session.
fn parse_notification(notification: &Notification) -> Option<ProviderEvent> {
    match notification.method.as_str() {
        "accountsChanged" => {
            let accounts: Vec<Address> =
                serde_json::from_value(notification.params.clone()).ok()?;
            Some(ProviderEvent::AccountsChanged(accounts))
        }
        "chainChanged" => {
            let chain: ChainId = serde_json::from_value(notification.params.clone()).ok()?;
            Some(ProviderEvent::ChainChanged(chain))
        }
        _ => None,
    }
}
