//! Wire types for the EIP-1193 wallet provider protocol.
//!
//! These are the JSON shapes exchanged with a wallet provider:
//! chain ids and account addresses as the provider reports them, and
//! the parameter objects for `wallet_switchEthereumChain` /
//! `wallet_addEthereumChain`. Pure data, no I/O.

mod chain;
mod network;

pub use chain::{Address, AddressParseError, ChainId, ChainIdParseError};
pub use network::{NativeCurrency, NetworkDescriptor, SwitchChainParams};

/// EIP-1193 provider error codes the client has to recognize.
pub mod error_codes {
    /// The user rejected the request (closed the approval prompt).
    pub const USER_REJECTED_REQUEST: i64 = 4001;

    /// `wallet_switchEthereumChain` target is not known to the wallet;
    /// the chain must be added via `wallet_addEthereumChain` first.
    pub const UNRECOGNIZED_CHAIN_ID: i64 = 4902;
}
