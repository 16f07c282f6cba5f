use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use rw_runtime::{Provider, WalletBridge, locate_bridge};
use rw_session::{CompanyRegistry, NavigationIntent, Route, TargetNetwork, WalletSession};

pub async fn run(bridge_path: Option<&Path>, company: Option<&str>) -> Result<()> {
    let (session, mut nav) = WalletSession::new(TargetNetwork::avalanche());

    let bridge = match locate_bridge(bridge_path) {
        Some(path) => Some(WalletBridge::spawn(&path).await?),
        None => None,
    };
    let provider: Option<Arc<dyn Provider>> = bridge.as_ref().map(|b| b.connection() as _);
    session.initialize(provider).await;

    if let Err(err) = session.connect().await {
        // The message is also in session state; the CLI surfaces it
        // through the error path.
        return Err(err.into());
    }

    let state = session.state();
    let chain = state
        .chain_id
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("Connected: {} on {}", session.current_label(), chain);

    if matches!(nav.try_recv(), Ok(NavigationIntent::PostConnect)) {
        info!(target: "rw.connect", "navigation intent: post-connect");
        if let Some(name) = company {
            match CompanyRegistry::default().route_for(name) {
                Route::Manager => println!("Next: manager dashboard for {name}"),
                Route::Register => println!("Next: register company {name}"),
            }
        } else {
            println!("Next: choose company");
        }
    }

    if let Some(bridge) = bridge {
        let _ = bridge.shutdown().await;
    }
    Ok(())
}
