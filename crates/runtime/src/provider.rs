//! The provider capability and its typed call surface.
//!
//! [`Provider`] is the object-safe seam between the session layer and
//! whatever actually answers requests - the live bridge connection in
//! production, a scripted stub in tests. [`ProviderHandle`] layers the
//! typed `eth_*` / `wallet_*` calls on top, so the session never
//! touches raw JSON.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::broadcast;

use rw_protocol::{Address, ChainId, NetworkDescriptor, SwitchChainParams};

use crate::connection::Connection;
use crate::error::Result;
use crate::events::ProviderEvent;

/// The injected wallet capability, abstracted.
///
/// Not owned by consumers - the host environment (bridge process)
/// owns the wallet side; holders of this trait only invoke it.
pub trait Provider: Send + Sync {
    /// Sends one provider request and awaits the result.
    fn request(
        &self,
        method: &str,
        params: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>>;

    /// Subscribes to out-of-band wallet notifications.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

impl Provider for Connection {
    fn request(
        &self,
        method: &str,
        params: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>> {
        let method = method.to_string();
        Box::pin(async move { Connection::request(self, &method, params).await })
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        Connection::subscribe(self)
    }
}

/// Typed call surface over a [`Provider`].
#[derive(Clone)]
pub struct ProviderHandle {
    inner: Arc<dyn Provider>,
}

impl ProviderHandle {
    pub fn new(inner: Arc<dyn Provider>) -> Self {
        Self { inner }
    }

    async fn call<P: Serialize, R: DeserializeOwned>(&self, method: &str, params: P) -> Result<R> {
        let params_value = serde_json::to_value(params)?;
        let response = self.inner.request(method, params_value).await?;
        serde_json::from_value(response).map_err(Into::into)
    }

    /// Read-only probe of already-authorized accounts. Never prompts;
    /// an empty list means no prior authorization.
    pub async fn eth_accounts(&self) -> Result<Vec<Address>> {
        self.call("eth_accounts", Value::Null).await
    }

    /// Requests account authorization, prompting the user if needed.
    /// By provider convention the first returned address is the
    /// active account.
    pub async fn eth_request_accounts(&self) -> Result<Vec<Address>> {
        self.call("eth_requestAccounts", Value::Null).await
    }

    /// Current chain id as the wallet reports it.
    pub async fn eth_chain_id(&self) -> Result<ChainId> {
        self.call("eth_chainId", Value::Null).await
    }

    /// Asks the wallet to point at `chain_id`. Fails with code 4902
    /// ([`Error::is_unrecognized_chain`](crate::Error::is_unrecognized_chain))
    /// if the wallet does not know the chain.
    pub async fn wallet_switch_chain(&self, chain_id: &ChainId) -> Result<()> {
        let params = [SwitchChainParams {
            chain_id: chain_id.clone(),
        }];
        let _: Value = self.call("wallet_switchEthereumChain", params).await?;
        Ok(())
    }

    /// Registers a new chain with the wallet.
    pub async fn wallet_add_chain(&self, descriptor: &NetworkDescriptor) -> Result<()> {
        let _: Value = self.call("wallet_addEthereumChain", [descriptor]).await?;
        Ok(())
    }

    /// Subscribes to out-of-band wallet notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.inner.subscribe()
    }
}

impl std::fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use parking_lot::Mutex;

    /// Provider answering from a scripted method -> result table.
    struct TableProvider {
        responses: Mutex<Vec<(String, Result<Value>)>>,
        bus: EventBus,
    }

    impl Provider for TableProvider {
        fn request(
            &self,
            method: &str,
            _params: Value,
        ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>> {
            let mut responses = self.responses.lock();
            let position = responses.iter().position(|(m, _)| m == method);
            let result = match position {
                Some(i) => responses.remove(i).1,
                None => Err(crate::Error::Protocol(format!("unscripted method: {method}"))),
            };
            Box::pin(async move { result })
        }

        fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
            self.bus.subscribe()
        }
    }

    fn handle_with(responses: Vec<(&str, Result<Value>)>) -> ProviderHandle {
        ProviderHandle::new(Arc::new(TableProvider {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(m, r)| (m.to_string(), r))
                    .collect(),
            ),
            bus: EventBus::new(),
        }))
    }

    #[tokio::test]
    async fn typed_accounts_call_parses_addresses() {
        let handle = handle_with(vec![(
            "eth_accounts",
            Ok(serde_json::json!(["0xABCDEF0123456789abcdef0123456789ABCDEF01"])),
        )]);

        let accounts = handle.eth_accounts().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].truncated(), "0xABCD...EF01");
    }

    #[tokio::test]
    async fn malformed_account_list_is_a_json_error() {
        let handle = handle_with(vec![("eth_accounts", Ok(serde_json::json!("0xnope")))]);
        assert!(matches!(
            handle.eth_accounts().await,
            Err(crate::Error::Json(_))
        ));
    }

    #[tokio::test]
    async fn chain_id_parses_and_normalizes() {
        let handle = handle_with(vec![("eth_chainId", Ok(serde_json::json!("0xA86A")))]);
        let chain = handle.eth_chain_id().await.unwrap();
        assert_eq!(chain.as_str(), "0xa86a");
    }
}
