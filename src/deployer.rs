//! Forge script dispatch for the deployable artifacts.

use std::str::FromStr;

use anyhow::{Context, Result, bail, ensure};
use tokio::process::Command;
use tracing::info;

use crate::LOCAL_NETWORK;

/// Program every deployment is delegated to.
const FORGE_PROGRAM: &str = "forge";

/// A single `forge script` deployment.
#[derive(Clone, Copy, Debug)]
pub struct ForgeScript {
    /// Artifact name used in logs and error reports.
    pub name: &'static str,
    /// `<path>:<contract>` target handed to `forge script`.
    pub target: &'static str,
}

/// The proxy factory new markets are created through.
pub const FACTORY: ForgeScript = ForgeScript {
    name: "Factory",
    target: "script/DeployFactory.s.sol:OnitInfiniteOutcomeDPMFactoryDeployer",
};

/// The market order router.
pub const ORDER_ROUTER: ForgeScript = ForgeScript {
    name: "Order Router",
    target: "script/DeployOrderRouter.s.sol:OnitOrderRouterDeployer",
};

/// What a single run deploys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeployTarget {
    Factory,
    Router,
    Both,
}

impl DeployTarget {
    /// Scripts for this selection. The factory always precedes the router:
    /// the router registration depends on addresses the factory run emits.
    pub fn scripts(self) -> &'static [ForgeScript] {
        match self {
            Self::Factory => &[FACTORY],
            Self::Router => &[ORDER_ROUTER],
            Self::Both => &[FACTORY, ORDER_ROUTER],
        }
    }

    /// Human readable list of the selected artifacts.
    pub fn summary(self) -> String {
        self.scripts()
            .iter()
            .map(|script| script.name)
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

impl FromStr for DeployTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "factory" => Ok(Self::Factory),
            "router" => Ok(Self::Router),
            "both" => Ok(Self::Both),
            other => bail!("invalid deploy target {other:?}, use: router, factory, or both"),
        }
    }
}

/// Run configuration for one deploy invocation.
#[derive(Clone, Debug)]
pub struct DeployConfig {
    /// Network identifier passed through to `--rpc-url`.
    pub network: String,
    pub target: DeployTarget,
    /// Submit transactions on-chain instead of simulating them.
    pub broadcast: bool,
    /// Deploy with the production foundry profile.
    pub production: bool,
}

impl DeployConfig {
    pub fn is_local(&self) -> bool {
        self.network == LOCAL_NETWORK
    }

    /// Arguments of one `forge script` invocation under this configuration.
    fn forge_args(&self, script: &ForgeScript) -> Vec<String> {
        let mut args = vec![
            "script".to_owned(),
            script.target.to_owned(),
            "--rpc-url".to_owned(),
            self.network.clone(),
        ];
        if self.broadcast {
            args.push("--broadcast".to_owned());
            // verification is meaningless for transactions that never leave
            // the local node
            if !self.is_local() {
                args.push("--verify".to_owned());
            }
        }
        args.push("-vvvv".to_owned());
        args
    }
}

/// Deploy one artifact (with logging)
async fn deploy(program: &str, script: &ForgeScript, cfg: &DeployConfig) -> Result<()> {
    info!("deploying {}", script.name);

    let mut cmd = Command::new(program);
    cmd.args(cfg.forge_args(script));
    if cfg.production {
        cmd.env("FOUNDRY_PROFILE", "prod");
    }

    let status = cmd
        .status()
        .await
        .with_context(|| format!("failed to run {program}"))?;
    ensure!(status.success(), "{} deployment failed ({status})", script.name);

    info!("deployed {}", script.name);
    Ok(())
}

/// Deploy everything the configuration selects, in order, stopping at the
/// first failure.
pub async fn deploy_selected(cfg: &DeployConfig) -> Result<()> {
    dispatch(FORGE_PROGRAM, cfg).await
}

async fn dispatch(program: &str, cfg: &DeployConfig) -> Result<()> {
    for script in cfg.target.scripts() {
        deploy(program, script, cfg).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(network: &str, target: DeployTarget, broadcast: bool) -> DeployConfig {
        DeployConfig {
            network: network.to_owned(),
            target,
            broadcast,
            production: false,
        }
    }

    #[test]
    fn parses_known_targets() {
        assert_eq!(
            "factory".parse::<DeployTarget>().unwrap(),
            DeployTarget::Factory
        );
        assert_eq!(
            "router".parse::<DeployTarget>().unwrap(),
            DeployTarget::Router
        );
        assert_eq!("both".parse::<DeployTarget>().unwrap(), DeployTarget::Both);
    }

    #[test]
    fn rejects_unknown_target() {
        let err = "everything".parse::<DeployTarget>().unwrap_err();
        assert!(err.to_string().contains("router, factory, or both"));
    }

    #[test]
    fn factory_deploys_before_router() {
        let names = DeployTarget::Both
            .scripts()
            .iter()
            .map(|script| script.name)
            .collect::<Vec<_>>();
        assert_eq!(names, ["Factory", "Order Router"]);
    }

    #[test]
    fn argv_shape() {
        let args = config("local", DeployTarget::Router, false).forge_args(&ORDER_ROUTER);
        assert_eq!(
            args,
            [
                "script",
                "script/DeployOrderRouter.s.sol:OnitOrderRouterDeployer",
                "--rpc-url",
                "local",
                "-vvvv",
            ]
        );
    }

    #[test]
    fn verify_only_when_broadcasting_off_local() {
        let args = config("sepolia", DeployTarget::Factory, true).forge_args(&FACTORY);
        assert!(args.contains(&"--broadcast".to_owned()));
        assert!(args.contains(&"--verify".to_owned()));

        let args = config("local", DeployTarget::Factory, true).forge_args(&FACTORY);
        assert!(args.contains(&"--broadcast".to_owned()));
        assert!(!args.contains(&"--verify".to_owned()));

        let args = config("sepolia", DeployTarget::Factory, false).forge_args(&FACTORY);
        assert!(!args.contains(&"--broadcast".to_owned()));
        assert!(!args.contains(&"--verify".to_owned()));
    }

    /// Stub forge that records profile + argv, one line per invocation.
    #[cfg(unix)]
    fn fake_forge(dir: &std::path::Path, exit_code: i32) -> (std::path::PathBuf, std::path::PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let log = dir.join("calls.log");
        let bin = dir.join("forge");
        std::fs::write(
            &bin,
            format!(
                "#!/bin/sh\necho \"${{FOUNDRY_PROFILE:-default}} $@\" >> \"{}\"\nexit {}\n",
                log.display(),
                exit_code
            ),
        )
        .unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
        (bin, log)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn deploys_selection_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let (bin, log) = fake_forge(dir.path(), 0);
        let mut cfg = config("local", DeployTarget::Both, false);
        cfg.production = true;

        dispatch(bin.to_str().unwrap(), &cfg).await.unwrap();

        let calls = std::fs::read_to_string(&log).unwrap();
        let lines = calls.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("prod script script/DeployFactory.s.sol"));
        assert!(lines[1].starts_with("prod script script/DeployOrderRouter.s.sol"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn no_profile_override_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let (bin, log) = fake_forge(dir.path(), 0);
        let cfg = config("local", DeployTarget::Factory, false);

        dispatch(bin.to_str().unwrap(), &cfg).await.unwrap();

        let calls = std::fs::read_to_string(&log).unwrap();
        assert!(calls.starts_with("default script "));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_factory_stops_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let (bin, log) = fake_forge(dir.path(), 1);
        let cfg = config("local", DeployTarget::Both, false);

        let err = dispatch(bin.to_str().unwrap(), &cfg).await.unwrap_err();
        assert!(err.to_string().contains("Factory deployment failed"));

        let calls = std::fs::read_to_string(&log).unwrap();
        assert_eq!(calls.lines().count(), 1, "router must not run after the factory failed");
    }

    #[tokio::test]
    async fn missing_program_reports_spawn_failure() {
        let cfg = config("local", DeployTarget::Factory, false);

        let err = dispatch("/nonexistent/forge", &cfg).await.unwrap_err();
        assert!(err.to_string().contains("failed to run"));
    }
}
