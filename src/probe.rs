//! Readiness probing for the local test node.
//!
//! Deploying against the `local` network only works once anvil answers RPC
//! requests, so the deploy flow polls the node with a bounded retry budget
//! before delegating to forge. Remote networks are not backed by the local
//! node and are never probed.

use std::time::Duration;

use alloy::{
    network::Ethereum,
    providers::{
        Provider, ProviderBuilder, RootProvider, fillers::FillProvider,
        utils::JoinedRecommendedFillers,
    },
    transports::http::reqwest::Url,
};
use tracing::{debug, info};

use crate::LOCAL_NETWORK;

/// RPC endpoint of the local anvil node.
pub const ANVIL_RPC_URL: &str = "http://localhost:8545";

/// Provider connected to the probe endpoint with read only access
pub type HttpProvider = FillProvider<JoinedRecommendedFillers, RootProvider, Ethereum>;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct NodeProbeConfig {
    pub url: Url,
    pub max_attempts: u32,
    pub check_interval: Duration,
}

impl NodeProbeConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            max_attempts: 10,
            check_interval: Duration::from_secs(1),
        }
    }

    /// Build a read-only provider for the probe endpoint.
    fn provider(&self) -> HttpProvider {
        ProviderBuilder::new().connect_http(self.url.clone())
    }
}

/// Readiness check for the selected deploy network.
///
/// Only the `local` network is served by the anvil node; any other network
/// identifier reports ready immediately, without a single probe.
pub async fn node_ready(network: &str, cfg: &NodeProbeConfig) -> bool {
    if network != LOCAL_NETWORK {
        return true;
    }
    wait_for_node(&cfg.provider(), cfg).await
}

/// Poll `eth_blockNumber` until the node answers or the attempt budget is
/// spent. Transport errors count as a failed attempt, never as a hard error.
pub async fn wait_for_node<P: Provider>(provider: &P, cfg: &NodeProbeConfig) -> bool {
    for attempt in 1..=cfg.max_attempts {
        match provider.get_block_number().await {
            Ok(block) => {
                info!(attempt, block, "node is up");
                return true;
            }
            Err(err) => {
                debug!(attempt, %err, "liveness probe failed");
                info!("node is not running, waiting for it to start...");
            }
        }
        if attempt < cfg.max_attempts {
            tokio::time::sleep(cfg.check_interval).await;
        }
    }
    false
}
