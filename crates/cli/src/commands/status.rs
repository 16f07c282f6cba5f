use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde_json::json;

use rw_runtime::{Provider, WalletBridge, locate_bridge};
use rw_session::{TargetNetwork, WalletSession};

/// Silent probe only - never prompts the user.
pub async fn run(bridge_path: Option<&Path>) -> Result<()> {
    let Some(path) = locate_bridge(bridge_path) else {
        println!("No wallet provider detected");
        return Ok(());
    };

    let bridge = WalletBridge::spawn(&path).await?;
    let (session, _nav) = WalletSession::new(TargetNetwork::avalanche());
    let provider: Option<Arc<dyn Provider>> = Some(bridge.connection() as _);
    session.initialize(provider).await;

    let state = session.state();
    let payload = json!({
        "label": session.current_label(),
        "account": state.account.map(|a| a.to_string()),
        "chain_id": state.chain_id.map(|c| c.to_string()),
        "target_chain": session.target().chain_id().to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);

    let _ = bridge.shutdown().await;
    Ok(())
}
