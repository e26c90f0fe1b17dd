//! Onit contract deployment helpers.
//!
//! This crate drives the forge deployment scripts for the Onit market
//! contracts: it waits for the local test node to accept RPC requests, then
//! runs `forge script` for the selected artifacts.

use anyhow::Result;

pub mod deployer;
pub mod logging;
pub mod probe;

use crate::{deployer::DeployConfig, probe::NodeProbeConfig};

/// Network identifier of the local anvil test node.
pub const LOCAL_NETWORK: &str = "local";

/// Wait for the node backing `cfg.network`, then deploy the selected
/// artifacts in order. Returns `false` without deploying anything when the
/// node never came up.
pub async fn wait_and_deploy(cfg: &DeployConfig, probe_cfg: &NodeProbeConfig) -> Result<bool> {
    if !probe::node_ready(&cfg.network, probe_cfg).await {
        return Ok(false);
    }
    deployer::deploy_selected(cfg).await?;
    Ok(true)
}
