//! # Deployment Configuration
//!
//! A deployment config is a JSON document describing who deploys the two
//! ledgers, how each is parameterized, and which addresses behave as
//! receiver-capable contracts. Every field is optional:
//!
//! ```json
//! {
//!   "deployer": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
//!   "erc20":  { "name": "Gold", "symbol": "GLD", "decimals": 18, "initial_supply": 21000000 },
//!   "erc721": { "base_uri": "ipfs://collection/" },
//!   "receivers": {
//!     "0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0": "accept",
//!     "0xdeaddeaddeaddeaddeaddeaddeaddeaddeaddead": { "revert": { "reason": "closed" } }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use ys_contracts::receiver::{ReceiverBehavior, ReceiverDirectory, ScriptedReceiver};
use ys_contracts::{FungibleConfig, FungibleLedger, NonFungibleRegistry, RegistryConfig};
use ys_protocol::config::DEFAULT_DEPLOYER;
use ys_protocol::Address;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeploymentConfig {
    /// Identity that constructs both ledgers and receives the initial mint.
    pub deployer: Address,
    pub erc20: FungibleConfig,
    pub erc721: RegistryConfig,
    /// Addresses with receiver code, consulted by safe transfers.
    pub receivers: BTreeMap<Address, ReceiverBehavior>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            deployer: DEFAULT_DEPLOYER,
            erc20: FungibleConfig::default(),
            erc721: RegistryConfig::default(),
            receivers: BTreeMap::new(),
        }
    }
}

impl DeploymentConfig {
    /// Reads a config file, or returns the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read deployment config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid deployment config {}", path.display()))
    }
}

/// Both ledgers plus the receivers safe transfers resolve against.
#[derive(Debug)]
pub struct Deployment {
    pub deployer: Address,
    pub erc20: FungibleLedger,
    pub erc721: NonFungibleRegistry,
    pub receivers: ReceiverDirectory<ScriptedReceiver>,
}

impl Deployment {
    /// Constructs both ledgers from `config`. Construction events are left
    /// in each ledger's log for the caller to drain.
    pub fn deploy(config: DeploymentConfig) -> Result<Self> {
        let erc20 = FungibleLedger::new(config.erc20, config.deployer)
            .context("fungible ledger deployment failed")?;
        let erc721 = NonFungibleRegistry::new(config.erc721, config.deployer)
            .context("non-fungible registry deployment failed")?;

        let mut receivers = ReceiverDirectory::new();
        for (address, behavior) in config.receivers {
            receivers.register(address, ScriptedReceiver::new(behavior));
        }

        tracing::info!(
            deployer = %config.deployer,
            receivers = receivers.len(),
            "ledgers deployed"
        );

        Ok(Self {
            deployer: config.deployer,
            erc20,
            erc721,
            receivers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_path_yields_defaults() {
        let config = DeploymentConfig::load(None).unwrap();
        assert_eq!(config, DeploymentConfig::default());
        assert_eq!(config.deployer, DEFAULT_DEPLOYER);
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let file = write_temp(
            r#"{
                "erc20": { "symbol": "GLD", "decimals": 18 },
                "receivers": { "0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0": "accept" }
            }"#,
        );
        let config = DeploymentConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.erc20.symbol, "GLD");
        assert_eq!(config.erc20.decimals, 18);
        assert_eq!(config.erc20.name, FungibleConfig::default().name);
        assert_eq!(config.erc721, RegistryConfig::default());
        assert_eq!(
            config.receivers.get(&Address::repeat_byte(0xc0)),
            Some(&ReceiverBehavior::Accept)
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let file = write_temp(r#"{ "deployr": "0x00" }"#);
        let err = DeploymentConfig::load(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("invalid deployment config"));
    }

    #[test]
    fn unreadable_path_reports_context() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeploymentConfig::load(Some(&dir.path().join("absent.json"))).unwrap_err();
        assert!(err.to_string().contains("failed to read deployment config"));
    }

    #[test]
    fn deploy_registers_receivers() {
        let mut config = DeploymentConfig::default();
        config
            .receivers
            .insert(Address::repeat_byte(0xc0), ReceiverBehavior::WrongSelector);

        let deployment = Deployment::deploy(config).unwrap();

        assert!(deployment.receivers.is_contract(&Address::repeat_byte(0xc0)));
        assert_eq!(deployment.erc721.owner_of(1).unwrap(), DEFAULT_DEPLOYER);
        assert_eq!(
            deployment.erc20.balance_of(&DEFAULT_DEPLOYER),
            deployment.erc20.total_supply()
        );
    }

    #[test]
    fn null_deployer_fails_deployment() {
        let config = DeploymentConfig {
            deployer: Address::ZERO,
            ..DeploymentConfig::default()
        };
        let err = Deployment::deploy(config).unwrap_err();
        assert!(err.to_string().contains("fungible ledger deployment failed"));
    }
}
