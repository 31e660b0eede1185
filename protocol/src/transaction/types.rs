//! Core value types for NOVA transactions: coins and fees.
//!
//! All amounts are integers in the smallest unit of their denomination.
//! No floating point anywhere near money.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::verification::TxError;

// ---------------------------------------------------------------------------
// Coin
// ---------------------------------------------------------------------------

/// An amount of a single denomination.
///
/// # Examples
///
/// ```
/// use nova_admission::transaction::types::Coin;
///
/// let fee = Coin::new("photon", 10);
/// assert_eq!(fee.to_string(), "10photon");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    /// Denomination, e.g. `photon`.
    pub denom: String,
    /// Amount in the smallest unit.
    pub amount: u128,
}

impl Coin {
    /// Creates a new coin.
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Returns `true` if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| TxError::InvalidCoins(format!("missing denom in '{}'", s)))?;
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() || denom.is_empty() {
            return Err(TxError::InvalidCoins(format!("malformed coin '{}'", s)));
        }
        if !denom.starts_with(|c: char| c.is_ascii_alphabetic())
            || !denom.chars().all(|c| c.is_ascii_alphanumeric() || c == '/')
        {
            return Err(TxError::InvalidCoins(format!("invalid denom '{}'", denom)));
        }
        let amount = amount
            .parse::<u128>()
            .map_err(|e| TxError::InvalidCoins(format!("invalid amount in '{}': {}", s, e)))?;
        Ok(Coin::new(denom, amount))
    }
}

// ---------------------------------------------------------------------------
// Coins
// ---------------------------------------------------------------------------

/// A normalized multi-denomination amount.
///
/// Always sorted by denom, at most one entry per denom, and no zero entries.
/// That makes equality meaningful and keeps the encoded form (and therefore
/// the sign bytes) canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Empty amount.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// A single-denomination amount.
    pub fn single(denom: impl Into<String>, amount: u128) -> Self {
        Self::from(vec![Coin::new(denom, amount)])
    }

    /// `true` when there is nothing to move.
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Amount held in `denom` (zero when absent).
    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount)
            .unwrap_or(0)
    }

    /// `true` if, for at least one coin in `other`, this amount holds at
    /// least as much of that denom. Used by the mempool fee floor.
    pub fn is_any_gte(&self, other: &[Coin]) -> bool {
        other.iter().any(|c| self.amount_of(&c.denom) >= c.amount)
    }

    /// Iterate over the coins in denom order.
    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    /// Number of denominations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` when empty (same as [`Coins::is_zero`]).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<Coin>> for Coins {
    /// Normalizes: merges duplicate denoms (saturating), drops zeroes, sorts.
    fn from(coins: Vec<Coin>) -> Self {
        let mut merged: Vec<Coin> = Vec::with_capacity(coins.len());
        for coin in coins {
            match merged.iter_mut().find(|c| c.denom == coin.denom) {
                Some(existing) => existing.amount = existing.amount.saturating_add(coin.amount),
                None => merged.push(coin),
            }
        }
        merged.retain(|c| !c.is_zero());
        merged.sort_by(|a, b| a.denom.cmp(&b.denom));
        Self(merged)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl FromStr for Coins {
    type Err = TxError;

    /// Parses `"10photon,5atom"`. The empty string is the zero amount.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Coins::empty());
        }
        let coins = s
            .split(',')
            .map(str::parse::<Coin>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Coins::from(coins))
    }
}

// ---------------------------------------------------------------------------
// Fee
// ---------------------------------------------------------------------------

/// What a transaction offers to pay, and the gas it is allowed to burn.
///
/// Immutable once the transaction is formed: it is part of the signed
/// auth info, so changing it invalidates every signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    /// Fee amount, possibly multi-denom.
    pub amount: Coins,
    /// Declared gas limit.
    pub gas_limit: u64,
}

impl Fee {
    /// Creates a new fee.
    pub fn new(amount: Coins, gas_limit: u64) -> Self {
        Self { amount, gas_limit }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
