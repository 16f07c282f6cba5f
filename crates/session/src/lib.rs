//! Wallet session for the raffle app.
//!
//! The single source of truth for "is a wallet connected, to which
//! address, on which chain". [`WalletSession`] mediates every
//! interaction with the wallet provider capability: the silent probe
//! at startup, the user-initiated connect (including steering the
//! wallet onto the target network, adding it first if the wallet has
//! never seen it), the purely local disconnect, and the out-of-band
//! account/chain change notifications the wallet pushes at any time.
//!
//! The raffle domain leaves live here too: the [`TargetNetwork`] the
//! app operates on, raffle draft composition, and the post-connect
//! company routing decision.

pub mod company;
pub mod network;
pub mod raffle;
pub mod session;

pub use company::{CompanyRegistry, Route};
pub use network::TargetNetwork;
pub use raffle::{DraftError, RaffleDraft};
pub use session::{NavigationIntent, SessionError, SessionState, WalletSession};
