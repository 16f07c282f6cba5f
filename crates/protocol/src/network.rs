//! Parameter shapes for the `wallet_*` chain-management methods.

use serde::{Deserialize, Serialize};

use crate::chain::ChainId;

/// Native currency metadata inside a [`NetworkDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Full network descriptor passed to `wallet_addEthereumChain`.
///
/// Field names follow the wallet RPC spec, hence the camelCase rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDescriptor {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub block_explorer_urls: Vec<String>,
}

/// Sole parameter of `wallet_switchEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchChainParams {
    pub chain_id: ChainId,
}
