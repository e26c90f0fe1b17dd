//! CLI for contract deployment
//!
//! # Usage
//!
//! ```text
//! # Simulate a factory + router deployment against a running anvil node
//! cargo run --bin deploy -- local
//!
//! # Broadcast the router to a public network with the production profile
//! cargo run --bin deploy -- sepolia router -b -p
//! ```
use anyhow::Result;
use clap::Parser;
use onit_contract::{
    deployer::{DeployConfig, DeployTarget},
    logging,
    probe::{self, NodeProbeConfig},
    wait_and_deploy,
};

#[derive(Clone, Debug, Parser)]
struct Args {
    /// Network to deploy to
    network: String,

    /// What to deploy: 'router', 'factory', or 'both'
    #[clap(default_value = "both")]
    target: String,

    /// Broadcast transactions
    #[clap(short)]
    broadcast: bool,

    /// Use the production profile
    #[clap(short)]
    production: bool,
}

fn usage() {
    eprintln!("Usage: deploy <network> [target] [-b] [-p]");
    eprintln!("  <network>: Network to deploy to");
    eprintln!("  [target]: What to deploy - 'router', 'factory', or 'both' (default: both)");
    eprintln!("  -b: Broadcast transactions");
    eprintln!("  -p: Use production profile");
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_logging();

    let args = Args::parse();

    // deployments only make sense in development setups
    if std::env::var("APP_ENV").as_deref() != Ok("development") {
        println!("Not running in a development environment, exiting...");
        return Ok(());
    }

    let target = match args.target.parse::<DeployTarget>() {
        Ok(target) => target,
        Err(err) => {
            eprintln!("{err}");
            usage();
            std::process::exit(1);
        }
    };

    let cfg = DeployConfig {
        network: args.network,
        target,
        broadcast: args.broadcast,
        production: args.production,
    };
    let probe_cfg = NodeProbeConfig::new(probe::ANVIL_RPC_URL.parse()?);

    if !wait_and_deploy(&cfg, &probe_cfg).await? {
        // the node never came up, nothing to deploy against
        return Ok(());
    }

    println!("\n✅ Deployment completed successfully!");
    println!("📦 Deployed: {}", cfg.target.summary());
    Ok(())
}
