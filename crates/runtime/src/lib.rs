//! Wallet provider runtime - bridge lifecycle, transport, and connection
//!
//! In the browser the wallet extension injects a provider object into
//! every page. A native client has no injection point, so it reaches
//! the extension's native-messaging host instead: a helper process
//! whose stdin/stdout carry length-prefixed JSON frames. This crate
//! owns that plumbing:
//!
//! - **Bridge management**: locating and spawning the bridge host
//! - **Transport**: framed bidirectional communication over stdio pipes
//! - **Connection**: JSON-RPC request/response correlation and
//!   notification dispatch
//! - **Provider**: the object-safe capability trait and the typed
//!   `eth_*` / `wallet_*` call surface consumed by the session layer

pub mod bridge;
pub mod connection;
pub mod error;
pub mod events;
pub mod provider;
pub mod transport;

pub use bridge::{BRIDGE_ENV, WalletBridge, locate_bridge};
pub use connection::{Connection, Message, Notification, Request, Response, RpcErrorPayload};
pub use error::{Error, Result};
pub use events::{ProviderEvent, Subscription};
pub use provider::{Provider, ProviderHandle};
pub use transport::{
    PipeTransport, PipeTransportReceiver, PipeTransportSender, Transport, TransportParts,
    TransportReceiver,
};
