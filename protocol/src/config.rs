//! # Admission Configuration & Constants
//!
//! Every magic number the ante pipeline depends on lives here, plus the
//! node-level [`AnteConfig`] that an operator can override from a JSON file.
//!
//! Two kinds of values sit in this file and it is worth keeping them apart:
//!
//! - **Consensus constants** (extension type URLs, address prefix, typed-data
//!   domain). Every validator must agree on these byte-for-byte.
//! - **Node parameters** ([`AnteConfig`]). Gas costs and limits must match
//!   across validators too, but minimum gas prices are a purely local mempool
//!   policy and may differ from node to node.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

/// Bech32 human-readable prefix for account addresses.
pub const ADDRESS_HRP: &str = "nova";

/// Name of the module account that receives transaction fees.
pub const FEE_COLLECTOR_NAME: &str = "fee_collector";

/// Native fee denomination (photons, the smallest NOVA unit).
pub const DEFAULT_FEE_DENOM: &str = "photon";

// ---------------------------------------------------------------------------
// Extension option tags
// ---------------------------------------------------------------------------

/// Type URL that routes a transaction to the EVM chain.
pub const ETHEREUM_TX_TYPE_URL: &str = "/nova.evm.v1.ExtensionOptionsEthereumTx";

/// Type URL that routes a transaction to the EIP-712 (web3) chain and may
/// carry a delegated fee payer.
pub const WEB3_TX_TYPE_URL: &str = "/nova.types.v1.ExtensionOptionsWeb3Tx";

// ---------------------------------------------------------------------------
// Gas schedule defaults
// ---------------------------------------------------------------------------

/// Maximum memo length in characters.
pub const DEFAULT_MAX_MEMO_CHARACTERS: u64 = 256;

/// Maximum number of signatures (public keys) a single transaction may carry.
pub const DEFAULT_TX_SIG_LIMIT: u64 = 7;

/// Gas charged per byte of encoded transaction.
pub const DEFAULT_TX_SIZE_COST_PER_BYTE: u64 = 10;

/// Gas charged for verifying one Ed25519 signature.
pub const DEFAULT_SIG_VERIFY_COST_ED25519: u64 = 590;

/// Gas charged for verifying one secp256k1 signature. Matches the EVM's
/// intrinsic transaction cost so web3 wallets see familiar numbers.
pub const DEFAULT_SIG_VERIFY_COST_SECP256K1: u64 = 21_000;

/// Upper bound on the gas a single transaction may request.
pub const DEFAULT_MAX_TX_GAS: u64 = 30_000_000;

/// Bytes assumed per missing signature when estimating size gas in
/// simulation mode (65-byte recoverable secp256k1 is the largest we accept).
pub const SIMULATED_SIGNATURE_SIZE: u64 = 65;

// ---------------------------------------------------------------------------
// EVM / typed data
// ---------------------------------------------------------------------------

/// Default EIP-155 chain id of the NOVA EVM.
pub const DEFAULT_EVM_CHAIN_ID: u64 = 9_740;

/// EIP-712 domain name for typed-data transactions.
pub const EIP712_DOMAIN_NAME: &str = "NOVA Web3Tx";

/// EIP-712 domain version.
pub const EIP712_DOMAIN_VERSION: &str = "1.0.0";

/// EIP-712 verifying contract placeholder. There is no contract; the string
/// only pins the domain so signatures cannot be replayed elsewhere.
pub const EIP712_VERIFYING_CONTRACT: &str = "novaAdmission";

/// Number of decimal places carried by a [`DecCoin`] price.
pub const DEC_PRECISION: u32 = 18;

const DEC_ONE: u128 = 10u128.pow(DEC_PRECISION);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Node misconfiguration. These are fatal at startup, never per-transaction.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The named module account is not registered in the account store.
    #[error("{0} module account has not been set")]
    MissingModuleAccount(String),

    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON for [`AnteConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its allowed range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// DecCoin
// ---------------------------------------------------------------------------

/// A decimal amount of a denomination, used for minimum gas prices.
///
/// Stored as a fixed-point integer with [`DEC_PRECISION`] decimals. No floats
/// anywhere near money. Serialized as a compact string such as
/// `"0.025photon"`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DecCoin {
    /// Denomination.
    pub denom: String,
    /// Amount scaled by 10^18.
    pub amount: u128,
}

impl DecCoin {
    /// Build from an already scaled amount.
    pub fn from_scaled(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Whole-unit price (no fractional part).
    pub fn whole(denom: impl Into<String>, units: u64) -> Self {
        Self::from_scaled(denom, u128::from(units) * DEC_ONE)
    }

    /// `true` when the price is zero.
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Fee required to pay `gas` at this price, rounded up to a whole unit.
    ///
    /// Saturates instead of overflowing: a price that large rejects
    /// everything anyway.
    pub fn fee_for_gas(&self, gas: u64) -> u128 {
        let scaled = self.amount.saturating_mul(u128::from(gas));
        let whole = scaled / DEC_ONE;
        if scaled % DEC_ONE == 0 {
            whole
        } else {
            whole.saturating_add(1)
        }
    }
}

impl FromStr for DecCoin {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| ConfigError::Invalid(format!("missing denom in '{}'", s)))?;
        let (number, denom) = s.split_at(split);
        if number.is_empty() {
            return Err(ConfigError::Invalid(format!("missing amount in '{}'", s)));
        }
        if !denom.chars().all(|c| c.is_ascii_alphanumeric() || c == '/') {
            return Err(ConfigError::Invalid(format!("invalid denom '{}'", denom)));
        }

        let (int_part, frac_part) = match number.split_once('.') {
            Some((i, f)) => (i, f),
            None => (number, ""),
        };
        if frac_part.len() > DEC_PRECISION as usize {
            return Err(ConfigError::Invalid(format!(
                "too many decimal places in '{}' (max {})",
                s, DEC_PRECISION
            )));
        }

        let parse = |digits: &str| -> Result<u128, ConfigError> {
            if digits.is_empty() {
                return Ok(0);
            }
            if !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigError::Invalid(format!("invalid amount in '{}'", s)));
            }
            digits
                .parse::<u128>()
                .map_err(|e| ConfigError::Invalid(format!("invalid amount in '{}': {}", s, e)))
        };

        let int_value = parse(int_part)?;
        let frac_value = parse(frac_part)? * 10u128.pow(DEC_PRECISION - frac_part.len() as u32);
        let amount = int_value
            .checked_mul(DEC_ONE)
            .and_then(|v| v.checked_add(frac_value))
            .ok_or_else(|| ConfigError::Invalid(format!("amount overflow in '{}'", s)))?;

        Ok(Self {
            denom: denom.to_string(),
            amount,
        })
    }
}

impl TryFrom<String> for DecCoin {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DecCoin> for String {
    fn from(value: DecCoin) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DecCoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = self.amount / DEC_ONE;
        let frac = self.amount % DEC_ONE;
        if frac == 0 {
            write!(f, "{}{}", int, self.denom)
        } else {
            let frac = format!("{:018}", frac);
            write!(f, "{}.{}{}", int, frac.trim_end_matches('0'), self.denom)
        }
    }
}

impl fmt::Debug for DecCoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecCoin({})", self)
    }
}

// ---------------------------------------------------------------------------
// AnteConfig
// ---------------------------------------------------------------------------

/// EVM parameters the ante chains need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvmParams {
    /// EIP-155 chain id. Ethereum transactions and EIP-712 typed data must
    /// both commit to it.
    pub chain_id: u64,
    /// Denomination EVM gas is paid in.
    pub denom: String,
}

impl Default for EvmParams {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_EVM_CHAIN_ID,
            denom: DEFAULT_FEE_DENOM.to_string(),
        }
    }
}

/// Parameters of the admission pipeline.
///
/// Built once when the [`AnteHandler`](crate::ante::AnteHandler) is
/// constructed and injected into every decorator that needs it. Nothing here
/// is read from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnteConfig {
    /// Module account that receives fees.
    pub fee_collector_name: String,
    /// Maximum memo length in characters.
    pub max_memo_characters: u64,
    /// Maximum number of signer public keys per transaction.
    pub tx_sig_limit: u64,
    /// Gas per byte of encoded transaction.
    pub tx_size_cost_per_byte: u64,
    /// Gas per Ed25519 signature.
    pub sig_verify_cost_ed25519: u64,
    /// Gas per secp256k1 signature.
    pub sig_verify_cost_secp256k1: u64,
    /// Largest gas limit a transaction may declare.
    pub max_tx_gas: u64,
    /// Local mempool floor. Empty means "accept any fee".
    pub min_gas_prices: Vec<DecCoin>,
    /// EVM parameters.
    pub evm: EvmParams,
}

impl Default for AnteConfig {
    fn default() -> Self {
        Self {
            fee_collector_name: FEE_COLLECTOR_NAME.to_string(),
            max_memo_characters: DEFAULT_MAX_MEMO_CHARACTERS,
            tx_sig_limit: DEFAULT_TX_SIG_LIMIT,
            tx_size_cost_per_byte: DEFAULT_TX_SIZE_COST_PER_BYTE,
            sig_verify_cost_ed25519: DEFAULT_SIG_VERIFY_COST_ED25519,
            sig_verify_cost_secp256k1: DEFAULT_SIG_VERIFY_COST_SECP256K1,
            max_tx_gas: DEFAULT_MAX_TX_GAS,
            min_gas_prices: Vec::new(),
            evm: EvmParams::default(),
        }
    }
}

impl AnteConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Range checks. A config that fails here would reject every transaction
    /// (or none), which is never what the operator meant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fee_collector_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "fee_collector_name must not be empty".into(),
            ));
        }
        if self.tx_sig_limit == 0 {
            return Err(ConfigError::Invalid("tx_sig_limit must be > 0".into()));
        }
        if self.max_tx_gas == 0 {
            return Err(ConfigError::Invalid("max_tx_gas must be > 0".into()));
        }
        if self.evm.denom.is_empty() {
            return Err(ConfigError::Invalid("evm.denom must not be empty".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for price in &self.min_gas_prices {
            if !seen.insert(price.denom.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate min gas price denom '{}'",
                    price.denom
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
