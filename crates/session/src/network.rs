//! The network this app expects accounts to operate on.

use rw_protocol::{ChainId, NativeCurrency, NetworkDescriptor};

/// The single network `connect()` steers the wallet toward.
///
/// Immutable configuration, not runtime state. The production value
/// is Avalanche C-Chain (prizes are denominated in AVAX); tests point
/// this at private chains.
#[derive(Debug, Clone)]
pub struct TargetNetwork {
    descriptor: NetworkDescriptor,
}

impl TargetNetwork {
    /// Avalanche C-Chain mainnet, chain id `0xa86a` (43114).
    pub fn avalanche() -> Self {
        Self {
            descriptor: NetworkDescriptor {
                chain_id: ChainId::parse("0xa86a").expect("static chain id"),
                chain_name: "Avalanche C-Chain".to_string(),
                native_currency: NativeCurrency {
                    name: "Avalanche".to_string(),
                    symbol: "AVAX".to_string(),
                    decimals: 18,
                },
                rpc_urls: vec!["https://api.avax.network/ext/bc/C/rpc".to_string()],
                block_explorer_urls: vec!["https://snowtrace.io".to_string()],
            },
        }
    }

    /// A custom target, for tests and non-mainnet deployments.
    pub fn new(descriptor: NetworkDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.descriptor.chain_id
    }

    /// Full descriptor, the `wallet_addEthereumChain` parameter.
    pub fn descriptor(&self) -> &NetworkDescriptor {
        &self.descriptor
    }
}

impl Default for TargetNetwork {
    fn default() -> Self {
        Self::avalanche()
    }
}
