//! Activation settings for the stateful precompiles.
//!
//! Settings are read from the `statefulPrecompiles` object of the chainspec
//! extras or from environment variables:
//!
//! ```json
//! {
//!   "statefulPrecompiles": {
//!     "contractNativeMinterConfig": {
//!       "blockTimestamp": 0,
//!       "adminAddresses": ["0x8db97C7cEcE249c2b98bDC0226Cc4C2A57BF52FC"]
//!     },
//!     "feeManagerConfig": {
//!       "blockTimestamp": 1700000000,
//!       "adminAddresses": ["0x8db97C7cEcE249c2b98bDC0226Cc4C2A57BF52FC"]
//!     }
//!   }
//! }
//! ```

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{env, str::FromStr};
use thiserror::Error;

/// Key of the precompile settings inside the chainspec extras.
pub const EXTRAS_KEY: &str = "statefulPrecompiles";

/// Comma-separated native minter admins.
pub const NATIVE_MINTER_ADMINS_ENV: &str = "EV_NATIVE_MINTER_ADMINS";
/// Native minter activation timestamp.
pub const NATIVE_MINTER_TIMESTAMP_ENV: &str = "EV_NATIVE_MINTER_ACTIVATION_TIMESTAMP";
/// Comma-separated fee config manager admins.
pub const FEE_MANAGER_ADMINS_ENV: &str = "EV_FEE_MANAGER_ADMINS";
/// Fee config manager activation timestamp.
pub const FEE_MANAGER_TIMESTAMP_ENV: &str = "EV_FEE_MANAGER_ACTIVATION_TIMESTAMP";

/// Allow-list settings of a single precompile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowListConfig {
    /// Timestamp of the first block the precompile is active in. Defaults to genesis.
    #[serde(default)]
    pub block_timestamp: Option<u64>,
    /// Addresses granted the admin role on activation.
    #[serde(default)]
    pub admin_addresses: Vec<Address>,
}

impl AllowListConfig {
    /// Creates a config active from genesis.
    pub const fn new(admin_addresses: Vec<Address>) -> Self {
        Self {
            block_timestamp: None,
            admin_addresses,
        }
    }

    /// Activation timestamp, zero when unset.
    pub fn activation_timestamp(&self) -> u64 {
        self.block_timestamp.unwrap_or_default()
    }

    fn validate(&self, precompile: &'static str) -> Result<(), ConfigError> {
        if self.admin_addresses.iter().any(|admin| admin.is_zero()) {
            return Err(ConfigError::ZeroAdmin { precompile });
        }
        Ok(())
    }
}

/// Which stateful precompiles are enabled and how they are seeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatefulPrecompilesConfig {
    /// Native minter settings; disabled when absent.
    #[serde(default, rename = "contractNativeMinterConfig")]
    pub native_minter: Option<AllowListConfig>,
    /// Fee config manager settings; disabled when absent.
    #[serde(default, rename = "feeManagerConfig")]
    pub fee_config_manager: Option<AllowListConfig>,
}

impl StatefulPrecompilesConfig {
    /// Reads the settings from chainspec extras. Missing settings disable
    /// every precompile.
    pub fn from_extras(extras: &Value) -> Result<Self, ConfigError> {
        let Some(raw) = extras.get(EXTRAS_KEY) else {
            return Ok(Self::default());
        };
        let config: Self = serde_json::from_value(raw.clone()).map_err(ConfigError::InvalidExtras)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the settings from environment variables.
    pub fn from_env() -> eyre::Result<Self> {
        let config = Self {
            native_minter: allow_list_from_env(
                NATIVE_MINTER_ADMINS_ENV,
                NATIVE_MINTER_TIMESTAMP_ENV,
            )?,
            fee_config_manager: allow_list_from_env(
                FEE_MANAGER_ADMINS_ENV,
                FEE_MANAGER_TIMESTAMP_ENV,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(config) = &self.native_minter {
            config.validate("native minter")?;
        }
        if let Some(config) = &self.fee_config_manager {
            config.validate("fee config manager")?;
        }
        Ok(())
    }
}

fn allow_list_from_env(
    admins_var: &str,
    timestamp_var: &str,
) -> eyre::Result<Option<AllowListConfig>> {
    let Ok(raw) = env::var(admins_var) else {
        return Ok(None);
    };
    let admin_addresses = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Address::from_str)
        .collect::<Result<Vec<_>, _>>()?;
    let block_timestamp =
        env::var(timestamp_var).ok().map(|s| s.trim().parse::<u64>()).transpose()?;
    Ok(Some(AllowListConfig {
        block_timestamp,
        admin_addresses,
    }))
}

/// Errors that can occur while loading a [`StatefulPrecompilesConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The extras object did not match the expected shape.
    #[error("invalid stateful precompile extras in chainspec: {0}")]
    InvalidExtras(#[from] serde_json::Error),
    /// An admin list contained the zero address.
    #[error("{precompile} admin cannot be the zero address")]
    ZeroAdmin {
        /// Precompile whose admin list was rejected.
        precompile: &'static str,
    },
}
