//! End-to-end wallet session scenarios against a scripted provider.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::{broadcast, oneshot};

use rw_protocol::{Address, ChainId};
use rw_runtime::{Error as RuntimeError, Provider, ProviderEvent, Result as RuntimeResult};
use rw_session::{NavigationIntent, SessionError, TargetNetwork, WalletSession};

const ADDR: &str = "0xABCDEF0123456789abcdef0123456789ABCDEF01";
const OLD_ADDR: &str = "0x1111111111111111111111111111111111111111";
const OTHER_ADDR: &str = "0x2222222222222222222222222222222222222222";

struct Step {
    method: &'static str,
    result: RuntimeResult<Value>,
    gate: Option<oneshot::Receiver<()>>,
}

fn ok(method: &'static str, value: Value) -> Step {
    Step {
        method,
        result: Ok(value),
        gate: None,
    }
}

fn rpc_err(method: &'static str, code: i64, message: &str) -> Step {
    Step {
        method,
        result: Err(RuntimeError::Rpc {
            code,
            message: message.to_string(),
        }),
        gate: None,
    }
}

fn gated(method: &'static str, value: Value) -> (Step, oneshot::Sender<()>) {
    let (tx, rx) = oneshot::channel();
    (
        Step {
            method,
            result: Ok(value),
            gate: Some(rx),
        },
        tx,
    )
}

/// Provider that answers requests from a fixed script, in order.
/// Individual steps can be gated on a oneshot so tests control when
/// an in-flight request settles.
struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl ScriptedProvider {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            events,
        })
    }

    fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    fn remaining(&self) -> usize {
        self.steps.lock().len()
    }

    fn as_dyn(self: &Arc<Self>) -> Arc<dyn Provider> {
        Arc::clone(self) as Arc<dyn Provider>
    }
}

impl Provider for ScriptedProvider {
    fn request(
        &self,
        method: &str,
        _params: Value,
    ) -> Pin<Box<dyn Future<Output = RuntimeResult<Value>> + Send + '_>> {
        let method = method.to_string();
        let step = self.steps.lock().pop_front();
        Box::pin(async move {
            let step = step.unwrap_or_else(|| panic!("unscripted request: {method}"));
            assert_eq!(step.method, method, "request out of scripted order");
            if let Some(gate) = step.gate {
                let _ = gate.await;
            }
            step.result
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

/// Probe steps every `initialize(Some(..))` consumes first.
fn probe(accounts: Value, chain: Value) -> Vec<Step> {
    vec![ok("eth_accounts", accounts), ok("eth_chainId", chain)]
}

fn address(s: &str) -> Address {
    Address::parse(s).unwrap()
}

fn chain(s: &str) -> ChainId {
    ChainId::parse(s).unwrap()
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn happy_path_adds_unrecognized_network_then_retries() {
    let mut steps = probe(json!([]), json!("0x1"));
    steps.extend([
        ok("eth_requestAccounts", json!([ADDR])),
        ok("eth_chainId", json!("0x1")),
        rpc_err("wallet_switchEthereumChain", 4902, "Unrecognized chain ID"),
        ok("wallet_addEthereumChain", Value::Null),
        ok("wallet_switchEthereumChain", Value::Null),
    ]);
    let provider = ScriptedProvider::new(steps);

    let (session, mut nav) = WalletSession::new(TargetNetwork::avalanche());
    session.initialize(Some(provider.as_dyn())).await;
    session.connect().await.unwrap();

    let state = session.state();
    assert_eq!(state.account, Some(address(ADDR)));
    assert_eq!(state.chain_id, Some(chain("0xa86a")));
    assert!(state.last_error.is_none());
    assert!(!state.connecting);

    // Navigation intent emitted exactly once.
    assert_eq!(nav.try_recv().unwrap(), NavigationIntent::PostConnect);
    assert!(nav.try_recv().is_err());
    assert_eq!(provider.remaining(), 0);
}

#[tokio::test]
async fn connect_on_target_chain_skips_the_network_dance() {
    let mut steps = probe(json!([]), json!("0xa86a"));
    steps.extend([
        ok("eth_requestAccounts", json!([ADDR])),
        ok("eth_chainId", json!("0xa86a")),
    ]);
    let provider = ScriptedProvider::new(steps);

    let (session, mut nav) = WalletSession::new(TargetNetwork::avalanche());
    session.initialize(Some(provider.as_dyn())).await;
    session.connect().await.unwrap();

    assert_eq!(session.state().chain_id, Some(chain("0xa86a")));
    assert!(nav.try_recv().is_ok());
    assert_eq!(provider.remaining(), 0, "no wallet_* call should be made");
}

#[tokio::test]
async fn rejected_prompt_commits_nothing() {
    let mut steps = probe(json!([]), json!("0x1"));
    steps.push(rpc_err(
        "eth_requestAccounts",
        4001,
        "User rejected the request",
    ));
    let provider = ScriptedProvider::new(steps);

    let (session, mut nav) = WalletSession::new(TargetNetwork::avalanche());
    session.initialize(Some(provider.as_dyn())).await;

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, SessionError::Provider(_)));

    let state = session.state();
    assert!(state.account.is_none());
    // Pre-call chain observation is untouched by the failed connect.
    assert_eq!(state.chain_id, Some(chain("0x1")));
    assert!(!state.connecting);
    assert!(state.last_error.unwrap().contains("User rejected"));
    assert!(nav.try_recv().is_err());
}

#[tokio::test]
async fn empty_account_list_reports_no_accounts() {
    let mut steps = probe(json!([]), json!("0x1"));
    steps.push(ok("eth_requestAccounts", json!([])));
    let provider = ScriptedProvider::new(steps);

    let (session, _nav) = WalletSession::new(TargetNetwork::avalanche());
    session.initialize(Some(provider.as_dyn())).await;

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, SessionError::NoAccountsReturned));
    assert_eq!(
        session.state().last_error.unwrap(),
        "the wallet returned no accounts"
    );
}

#[tokio::test]
async fn malformed_account_list_reports_no_accounts() {
    let mut steps = probe(json!([]), json!("0x1"));
    steps.push(ok("eth_requestAccounts", json!("not-a-list")));
    let provider = ScriptedProvider::new(steps);

    let (session, _nav) = WalletSession::new(TargetNetwork::avalanche());
    session.initialize(Some(provider.as_dyn())).await;

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, SessionError::NoAccountsReturned));
}

#[tokio::test]
async fn switch_failure_preserves_previous_session_values() {
    // Session starts with a prior authorization on chain 0x1.
    let mut steps = probe(json!([OLD_ADDR]), json!("0x1"));
    steps.extend([
        ok("eth_requestAccounts", json!([ADDR])),
        ok("eth_chainId", json!("0x1")),
        rpc_err(
            "wallet_switchEthereumChain",
            -32002,
            "Request of type 'wallet_switchEthereumChain' already pending",
        ),
    ]);
    let provider = ScriptedProvider::new(steps);

    let (session, mut nav) = WalletSession::new(TargetNetwork::avalanche());
    session.initialize(Some(provider.as_dyn())).await;

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, SessionError::NetworkSwitchFailed(_)));

    // No partial commit: the account retrieved mid-connect is dropped.
    let state = session.state();
    assert_eq!(state.account, Some(address(OLD_ADDR)));
    assert_eq!(state.chain_id, Some(chain("0x1")));
    assert!(nav.try_recv().is_err());
}

#[tokio::test]
async fn add_network_rejection_maps_to_add_failed() {
    let mut steps = probe(json!([]), json!("0x1"));
    steps.extend([
        ok("eth_requestAccounts", json!([ADDR])),
        ok("eth_chainId", json!("0x1")),
        rpc_err("wallet_switchEthereumChain", 4902, "Unrecognized chain ID"),
        rpc_err("wallet_addEthereumChain", 4001, "User rejected the request"),
    ]);
    let provider = ScriptedProvider::new(steps);

    let (session, _nav) = WalletSession::new(TargetNetwork::avalanche());
    session.initialize(Some(provider.as_dyn())).await;

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, SessionError::NetworkAddFailed(_)));
    assert!(
        session
            .state()
            .last_error
            .unwrap()
            .starts_with("adding the target network")
    );
}

#[tokio::test]
async fn initialize_probe_restores_prior_authorization() {
    let provider = ScriptedProvider::new(probe(json!([ADDR]), json!("0xa86a")));

    let (session, _nav) = WalletSession::new(TargetNetwork::avalanche());
    session.initialize(Some(provider.as_dyn())).await;

    let state = session.state();
    assert_eq!(state.account, Some(address(ADDR)));
    assert_eq!(state.chain_id, Some(chain("0xa86a")));
    assert!(state.last_error.is_none());
    assert_eq!(session.current_label(), "0xABCD...EF01");
}

#[tokio::test]
async fn initialize_probe_swallows_errors() {
    let steps = vec![
        rpc_err("eth_accounts", -32603, "Internal error"),
        rpc_err("eth_chainId", -32603, "Internal error"),
    ];
    let provider = ScriptedProvider::new(steps);

    let (session, _nav) = WalletSession::new(TargetNetwork::avalanche());
    session.initialize(Some(provider.as_dyn())).await;

    let state = session.state();
    assert!(state.account.is_none());
    assert!(state.chain_id.is_none());
    assert!(state.last_error.is_none(), "probe failures must stay silent");
}

#[tokio::test]
async fn accounts_changed_notifications_apply_first_element_or_clear() {
    let provider = ScriptedProvider::new(probe(json!([ADDR]), json!("0xa86a")));

    let (session, _nav) = WalletSession::new(TargetNetwork::avalanche());
    let session = Arc::new(session);
    session.initialize(Some(provider.as_dyn())).await;

    provider.emit(ProviderEvent::AccountsChanged(vec![
        address(OTHER_ADDR),
        address(ADDR),
    ]));
    let s = Arc::clone(&session);
    wait_until(move || s.state().account == Some(address(OTHER_ADDR))).await;

    provider.emit(ProviderEvent::AccountsChanged(vec![]));
    let s = Arc::clone(&session);
    wait_until(move || s.state().account.is_none()).await;
}

#[tokio::test]
async fn chain_changed_notification_updates_chain_only() {
    let provider = ScriptedProvider::new(probe(json!([ADDR]), json!("0xa86a")));

    let (session, _nav) = WalletSession::new(TargetNetwork::avalanche());
    let session = Arc::new(session);
    session.initialize(Some(provider.as_dyn())).await;

    provider.emit(ProviderEvent::ChainChanged(chain("0x1")));
    let s = Arc::clone(&session);
    wait_until(move || s.state().chain_id == Some(chain("0x1"))).await;

    assert_eq!(session.state().account, Some(address(ADDR)));
}

#[tokio::test]
async fn connecting_brackets_the_connect_and_notifications_interleave() {
    let mut steps = probe(json!([]), json!("0x1"));
    let (request_step, release) = gated("eth_requestAccounts", json!([ADDR]));
    steps.push(request_step);
    steps.push(ok("eth_chainId", json!("0xa86a")));
    let provider = ScriptedProvider::new(steps);

    let (session, mut nav) = WalletSession::new(TargetNetwork::avalanche());
    let session = Arc::new(session);
    session.initialize(Some(provider.as_dyn())).await;
    assert!(!session.state().connecting);

    let connect_task = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.connect().await })
    };

    let s = Arc::clone(&session);
    wait_until(move || s.state().connecting).await;
    assert_eq!(session.current_label(), "Connecting...");

    // A notification arriving while connect is suspended at the
    // prompt is applied atomically, right away.
    provider.emit(ProviderEvent::AccountsChanged(vec![address(OTHER_ADDR)]));
    let s = Arc::clone(&session);
    wait_until(move || s.state().account == Some(address(OTHER_ADDR))).await;
    assert!(session.state().connecting);

    release.send(()).unwrap();
    connect_task.await.unwrap().unwrap();

    // The connect settled after the notification, so its commit is the
    // most recent write.
    let state = session.state();
    assert!(!state.connecting);
    assert_eq!(state.account, Some(address(ADDR)));
    assert_eq!(state.chain_id, Some(chain("0xa86a")));
    assert!(nav.try_recv().is_ok());
}

#[tokio::test]
async fn reentrant_connect_is_a_noop() {
    let mut steps = probe(json!([]), json!("0x1"));
    let (request_step, release) = gated("eth_requestAccounts", json!([ADDR]));
    steps.push(request_step);
    steps.push(ok("eth_chainId", json!("0xa86a")));
    let provider = ScriptedProvider::new(steps);

    let (session, mut nav) = WalletSession::new(TargetNetwork::avalanche());
    let session = Arc::new(session);
    session.initialize(Some(provider.as_dyn())).await;

    let connect_task = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.connect().await })
    };
    let s = Arc::clone(&session);
    wait_until(move || s.state().connecting).await;

    let consumed_before = provider.remaining();
    // Second connect while the first is suspended: returns without
    // touching the provider or the state.
    session.connect().await.unwrap();
    assert_eq!(provider.remaining(), consumed_before);
    assert!(session.state().connecting);

    release.send(()).unwrap();
    connect_task.await.unwrap().unwrap();

    // Only the one navigation intent, from the first connect.
    assert!(nav.try_recv().is_ok());
    assert!(nav.try_recv().is_err());
}

#[tokio::test]
async fn disconnect_after_connect_is_purely_local() {
    let mut steps = probe(json!([]), json!("0xa86a"));
    steps.extend([
        ok("eth_requestAccounts", json!([ADDR])),
        ok("eth_chainId", json!("0xa86a")),
    ]);
    let provider = ScriptedProvider::new(steps);

    let (session, _nav) = WalletSession::new(TargetNetwork::avalanche());
    session.initialize(Some(provider.as_dyn())).await;
    session.connect().await.unwrap();

    session.disconnect();
    let state = session.state();
    assert!(state.account.is_none());
    assert!(state.chain_id.is_none());
    assert!(state.last_error.is_none());
    assert_eq!(session.current_label(), "Connect Wallet");
    // No provider call was made for the disconnect.
    assert_eq!(provider.remaining(), 0);
}
