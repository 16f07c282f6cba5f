//! Error types for the wallet provider runtime.

use thiserror::Error;

use rw_protocol::error_codes;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to the wallet bridge.
#[derive(Debug, Error)]
pub enum Error {
    /// No bridge host executable could be located.
    #[error("wallet bridge not found. Set {} or install the bridge host on PATH", crate::bridge::BRIDGE_ENV)]
    BridgeNotFound,

    /// Failed to launch the bridge host process.
    #[error("failed to launch wallet bridge: {0}")]
    LaunchFailed(String),

    /// Transport-level error (framing, stdio pipes).
    #[error("transport error: {0}")]
    Transport(String),

    /// Protocol-level error (malformed or uncorrelatable message).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Error response from the wallet itself (EIP-1193 error object).
    #[error("wallet error {code}: {message}")]
    Rpc {
        /// EIP-1193 / JSON-RPC error code.
        code: i64,
        /// Human-readable message from the wallet.
        message: String,
    },

    /// Connection closed before the request settled.
    #[error("connection closed unexpectedly")]
    ChannelClosed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the wallet error code if this is an RPC error.
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            Error::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// True if the wallet reported the switch target as a chain it
    /// does not know (code 4902) - the add-then-retry signal.
    pub fn is_unrecognized_chain(&self) -> bool {
        self.rpc_code() == Some(error_codes::UNRECOGNIZED_CHAIN_ID)
    }

    /// True if the user dismissed the wallet's approval prompt.
    pub fn is_user_rejected(&self) -> bool {
        self.rpc_code() == Some(error_codes::USER_REJECTED_REQUEST)
    }
}
