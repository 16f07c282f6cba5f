//! The wallet session state machine.
//!
//! States: Disconnected, Connecting, Connected(account, chain), and
//! Error - where Error is just Disconnected with a message retained,
//! reachable only from Connecting, and cleared by the next
//! `connect()`. All state lives in one struct behind one mutex so
//! that wallet notifications and connect commits each apply in a
//! single atomic step; interleavings can reorder writes but never
//! tear them.

use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use rw_protocol::{Address, ChainId};
use rw_runtime::{Provider, ProviderEvent, ProviderHandle, Subscription};

use crate::network::TargetNetwork;

/// Errors a `connect()` attempt can settle with.
///
/// All of these are recovered locally: `connect()` stores the display
/// message in the session state and the user may simply retry.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No provider capability was detected at initialize time.
    #[error("no wallet provider detected. Install a wallet extension to continue")]
    ProviderMissing,

    /// The wallet returned an empty or malformed account list.
    #[error("the wallet returned no accounts")]
    NoAccountsReturned,

    /// Switch request rejected for a reason other than "unknown chain".
    #[error("switching the wallet to the target network failed: {0}")]
    NetworkSwitchFailed(String),

    /// The add-network request itself was rejected.
    #[error("adding the target network to the wallet failed: {0}")]
    NetworkAddFailed(String),

    /// Any other provider failure (user rejection, bridge gone, ...).
    #[error(transparent)]
    Provider(#[from] rw_runtime::Error),
}

/// Snapshot of the session's observable state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Active account; present only after a successful account
    /// retrieval with no disconnect/clear since.
    pub account: Option<Address>,
    /// Chain the wallet is pointed at, as last observed.
    pub chain_id: Option<ChainId>,
    /// True strictly between the start and settlement of a connect.
    pub connecting: bool,
    /// Display message from the most recent failed connect.
    pub last_error: Option<String>,
}

/// Signal emitted to the outside world on a fully successful connect.
/// Not session state - the embedding UI decides what to do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationIntent {
    /// Proceed to the post-connect screen.
    PostConnect,
}

/// Label shown when no wallet is connected.
const DISCONNECTED_LABEL: &str = "Connect Wallet";

/// Owns the connection-to-wallet lifecycle.
///
/// One session per application; pass it by reference to whichever
/// surface needs it. Dropping the session releases the provider event
/// subscription and thereby stops the forwarding task.
pub struct WalletSession {
    target: TargetNetwork,
    state: Arc<Mutex<SessionState>>,
    provider: Mutex<Option<ProviderHandle>>,
    subscription: Mutex<Option<Subscription>>,
    nav_tx: mpsc::UnboundedSender<NavigationIntent>,
}

impl WalletSession {
    /// Creates a disconnected session targeting `target`. The
    /// returned receiver yields one [`NavigationIntent`] per fully
    /// successful connect.
    pub fn new(target: TargetNetwork) -> (Self, mpsc::UnboundedReceiver<NavigationIntent>) {
        let (nav_tx, nav_rx) = mpsc::unbounded_channel();
        let session = Self {
            target,
            state: Arc::new(Mutex::new(SessionState::default())),
            provider: Mutex::new(None),
            subscription: Mutex::new(None),
            nav_tx,
        };
        (session, nav_rx)
    }

    /// Runs once at session start.
    ///
    /// `provider` is the detected capability, or `None` when the host
    /// environment has no wallet - which leaves the session fully
    /// disconnected with no error (a capability gap the UI must
    /// accommodate, not a failure).
    ///
    /// With a provider present this silently probes already-authorized
    /// accounts and the current chain (never prompting; any probe
    /// error is swallowed as "no prior authorization") and subscribes
    /// to account/chain change notifications.
    pub async fn initialize(&self, provider: Option<Arc<dyn Provider>>) {
        let Some(provider) = provider else {
            tracing::info!("no wallet provider detected; session starts disconnected");
            return;
        };

        let handle = ProviderHandle::new(provider);

        let probed_accounts = handle.eth_accounts().await.ok();
        let probed_chain = handle.eth_chain_id().await.ok();
        {
            let mut state = self.state.lock();
            if let Some(accounts) = probed_accounts {
                if let Some(first) = accounts.into_iter().next() {
                    tracing::debug!(account = %first.truncated(), "prior authorization found");
                    state.account = Some(first);
                }
            }
            if let Some(chain) = probed_chain {
                state.chain_id = Some(chain);
            }
        }

        let mut events = handle.subscribe();
        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut cancel_rx => break,
                    event = events.recv() => {
                        match event {
                            Ok(event) => apply_notification(&state, event),
                            // Lag only skips stale intermediate states;
                            // resubscribing would replay nothing anyway.
                            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                                tracing::warn!(skipped = n, "wallet notifications lagged");
                            }
                            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                        }
                    }
                }
            }
        });

        *self.subscription.lock() = Some(Subscription::new(cancel_tx));
        *self.provider.lock() = Some(handle);
    }

    /// User-initiated connect.
    ///
    /// Prompts for account authorization, then steers the wallet onto
    /// the target network - adding the network and retrying the
    /// switch when the wallet reports it unrecognized. On success the
    /// session is Connected and one [`NavigationIntent::PostConnect`]
    /// is emitted. On failure nothing is committed: account and chain
    /// keep their pre-call values and the error message is stored.
    ///
    /// A call while another connect is in flight is a no-op - state
    /// is never race-overwritten by an abandoned attempt.
    pub async fn connect(&self) -> Result<(), SessionError> {
        {
            let mut state = self.state.lock();
            if state.connecting {
                tracing::debug!("connect already in flight; ignoring re-entrant call");
                return Ok(());
            }
            state.connecting = true;
            state.last_error = None;
        }

        let result = self.try_connect().await;

        match result {
            Ok((account, chain_id)) => {
                {
                    let mut state = self.state.lock();
                    state.account = Some(account);
                    state.chain_id = Some(chain_id);
                    state.connecting = false;
                }
                let _ = self.nav_tx.send(NavigationIntent::PostConnect);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "connect failed");
                let mut state = self.state.lock();
                state.last_error = Some(e.to_string());
                state.connecting = false;
                Err(e)
            }
        }
    }

    /// The connect sequence proper. Results are staged in locals and
    /// committed by the caller only on full success.
    async fn try_connect(&self) -> Result<(Address, ChainId), SessionError> {
        let handle = self
            .provider
            .lock()
            .clone()
            .ok_or(SessionError::ProviderMissing)?;

        let accounts = match handle.eth_request_accounts().await {
            Ok(accounts) => accounts,
            // A malformed account list and an empty one read the same
            // to the user.
            Err(rw_runtime::Error::Json(_)) => return Err(SessionError::NoAccountsReturned),
            Err(e) => return Err(e.into()),
        };
        let account = accounts
            .into_iter()
            .next()
            .ok_or(SessionError::NoAccountsReturned)?;
        tracing::debug!(account = %account.truncated(), "wallet authorized accounts");

        let current = handle.eth_chain_id().await?;
        let target = self.target.chain_id().clone();
        if current != target {
            tracing::info!(from = %current, to = %target, "switching wallet network");
            self.steer_to_target(&handle).await?;
        }

        Ok((account, target))
    }

    /// Switch, and on the "unrecognized chain" signal add the network
    /// and retry the switch once.
    async fn steer_to_target(&self, handle: &ProviderHandle) -> Result<(), SessionError> {
        let target = self.target.chain_id();
        match handle.wallet_switch_chain(target).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_unrecognized_chain() => {
                tracing::info!(chain = %target, "wallet does not know the target network; adding it");
                handle
                    .wallet_add_chain(self.target.descriptor())
                    .await
                    .map_err(|e| SessionError::NetworkAddFailed(e.to_string()))?;
                handle
                    .wallet_switch_chain(target)
                    .await
                    .map_err(|e| SessionError::NetworkSwitchFailed(e.to_string()))
            }
            Err(e) => Err(SessionError::NetworkSwitchFailed(e.to_string())),
        }
    }

    /// Purely local disconnect: clears account, chain, and error.
    ///
    /// The wallet side keeps its authorization - providers expose no
    /// revoke call - so a later `connect()` will not prompt again.
    /// Idempotent.
    pub fn disconnect(&self) {
        let mut state = self.state.lock();
        state.account = None;
        state.chain_id = None;
        state.last_error = None;
    }

    /// Pure projection of the state into the button label.
    pub fn current_label(&self) -> String {
        let state = self.state.lock();
        if state.connecting {
            return "Connecting...".to_string();
        }
        match &state.account {
            Some(account) => account.truncated(),
            None => DISCONNECTED_LABEL.to_string(),
        }
    }

    /// Snapshot of the observable session state.
    pub fn state(&self) -> SessionState {
        self.state.lock().clone()
    }

    /// The network this session steers the wallet toward.
    pub fn target(&self) -> &TargetNetwork {
        &self.target
    }
}

/// Applies one wallet notification in a single atomic step.
///
/// An empty account set means the wallet disconnected the site; a
/// non-empty one makes its first element the active account. A chain
/// change only updates the observed chain id.
fn apply_notification(state: &Mutex<SessionState>, event: ProviderEvent) {
    let mut state = state.lock();
    match event {
        ProviderEvent::AccountsChanged(accounts) => {
            state.account = accounts.into_iter().next();
        }
        ProviderEvent::ChainChanged(chain) => {
            state.chain_id = Some(chain);
        }
    }
}
