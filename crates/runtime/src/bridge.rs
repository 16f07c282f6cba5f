//! Wallet bridge host process lifecycle.
//!
//! The bridge is the native-messaging host of the user's wallet
//! extension. Locating it is the native equivalent of checking for an
//! injected `window.ethereum`: a missing bridge is a capability gap,
//! not an error.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::{Child, Command};

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::transport::PipeTransport;

/// Environment variable naming the bridge host executable.
pub const BRIDGE_ENV: &str = "RW_WALLET_BRIDGE";

/// Executable name probed on PATH when nothing else is configured.
const BRIDGE_BIN: &str = "wallet-bridge";

/// Locates the bridge host executable.
///
/// Resolution order: explicit path argument, `RW_WALLET_BRIDGE`,
/// then `wallet-bridge` on PATH. `None` means no wallet capability
/// is present in this environment.
pub fn locate_bridge(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.is_file().then(|| path.to_path_buf());
    }
    if let Ok(env_path) = std::env::var(BRIDGE_ENV) {
        let path = PathBuf::from(env_path);
        return path.is_file().then_some(path);
    }
    which::which(BRIDGE_BIN).ok()
}

/// A running bridge host with a live connection to it.
///
/// Dropping the bridge kills the child process; the connection's
/// dispatch loop then winds down on transport EOF.
pub struct WalletBridge {
    child: Child,
    connection: Arc<Connection>,
}

impl WalletBridge {
    /// Spawns the bridge host at `path` and starts the connection's
    /// dispatch loop.
    pub async fn spawn(path: &Path) -> Result<Self> {
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::LaunchFailed(format!("{}: {e}", path.display())))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::LaunchFailed("bridge stdin not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::LaunchFailed("bridge stdout not captured".to_string()))?;

        let (transport, message_rx) = PipeTransport::new(stdin, stdout);
        let connection = Arc::new(Connection::new(transport.into_transport_parts(message_rx)));

        let dispatch = Arc::clone(&connection);
        tokio::spawn(async move { dispatch.run().await });

        tracing::info!(bridge = %path.display(), "wallet bridge started");

        Ok(Self { child, connection })
    }

    /// The bridge's provider connection.
    pub fn connection(&self) -> Arc<Connection> {
        Arc::clone(&self.connection)
    }

    /// Terminates the bridge host.
    pub async fn shutdown(mut self) -> Result<()> {
        self.child.kill().await?;
        Ok(())
    }
}
