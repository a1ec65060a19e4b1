//! Engine configuration with TOML file support.

use concord_types::{Address, Digest, Power};
use concord_utils::LogFormat;
use serde::{Deserialize, Serialize};

use crate::domain::SigningDomain;
use crate::engine::GovernanceEngine;
use crate::error::GovernanceError;
use crate::offchain::OffchainGovernance;
use crate::onchain::OnchainGovernance;
use crate::policy::ConsensusPolicy;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GovernanceMode {
    /// Signature sets submitted with each action.
    #[default]
    Offchain,
    /// Sequential votes recorded per proposal.
    Onchain,
}

/// A principal and its initial power.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberConfig {
    pub address: Address,

    /// Ignored in on-chain mode, where every member holds 1.
    #[serde(default = "default_power")]
    pub power: u64,
}

/// Configuration for a governance engine.
///
/// Loaded from a TOML file via [`GovernanceConfig::from_toml_file`] or built
/// programmatically in tests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default)]
    pub mode: GovernanceMode,

    /// The engine's own address. Actions aimed here amend the engine.
    #[serde(default)]
    pub address: Address,

    /// Consensus ratio. Set both or neither; when unset, off-chain engines
    /// start at 2/3 and on-chain engines at 0, so the first on-chain
    /// proposals pass on a single vote until governors raise the bar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numerator: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denominator: Option<u64>,

    /// Derive the domain separator from this chain id and `address`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,

    /// Use this separator verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_separator: Option<Digest>,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default)]
    pub members: Vec<MemberConfig>,
}

fn default_power() -> u64 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl GovernanceConfig {
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, GovernanceError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| GovernanceError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, GovernanceError> {
        toml::from_str(s).map_err(|e| GovernanceError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, GovernanceError> {
        toml::to_string_pretty(self).map_err(|e| GovernanceError::Config(e.to_string()))
    }

    pub fn policy(&self) -> Result<ConsensusPolicy, GovernanceError> {
        match (self.numerator, self.denominator) {
            (Some(numerator), Some(denominator)) => ConsensusPolicy::new(numerator, denominator),
            (None, None) => Ok(match self.mode {
                GovernanceMode::Offchain => ConsensusPolicy::TWO_THIRDS,
                GovernanceMode::Onchain => ConsensusPolicy::NONE,
            }),
            _ => Err(GovernanceError::Config(
                "numerator and denominator must be set together".into(),
            )),
        }
    }

    pub fn signing_domain(&self) -> Result<SigningDomain, GovernanceError> {
        match (self.chain_id, self.domain_separator) {
            (Some(_), Some(_)) => Err(GovernanceError::Config(
                "set either chain_id or domain_separator, not both".into(),
            )),
            (Some(chain_id), None) => Ok(SigningDomain::for_chain(chain_id, &self.address)),
            (None, Some(separator)) => Ok(SigningDomain::with_separator(separator)),
            (None, None) => Ok(SigningDomain::plain()),
        }
    }

    fn addresses(&self) -> Vec<Address> {
        self.members.iter().map(|m| m.address).collect()
    }

    pub fn build_offchain(&self) -> Result<OffchainGovernance, GovernanceError> {
        let powers: Vec<Power> = self.members.iter().map(|m| Power::from(m.power)).collect();
        OffchainGovernance::new(
            self.address,
            &self.addresses(),
            &powers,
            self.policy()?,
            self.signing_domain()?,
        )
    }

    pub fn build_onchain(&self) -> Result<OnchainGovernance, GovernanceError> {
        if self.chain_id.is_some() || self.domain_separator.is_some() {
            tracing::warn!("signing domain settings have no effect in on-chain mode");
        }
        if self.members.iter().any(|m| m.power != 1) {
            tracing::warn!("on-chain mode is equal weight, member powers are treated as 1");
        }
        OnchainGovernance::new(self.address, &self.addresses(), self.policy()?)
    }

    /// Build the engine for the configured mode.
    pub fn build(&self) -> Result<GovernanceEngine, GovernanceError> {
        Ok(match self.mode {
            GovernanceMode::Offchain => GovernanceEngine::Offchain(self.build_offchain()?),
            GovernanceMode::Onchain => GovernanceEngine::Onchain(self.build_onchain()?),
        })
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            mode: GovernanceMode::default(),
            address: Address::ZERO,
            numerator: None,
            denominator: None,
            chain_id: None,
            domain_separator: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            members: Vec::new(),
        }
    }
}
