//! Monetary primitives for the casino engine
//!
//! This module defines:
//! - `Chips`: the fixed-point virtual currency (signed, balances may go negative)
//! - `PlayerId`: opaque player identity used to key accounts and sessions

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Subunits per whole chip (satoshi-style fixed point)
pub const SUBUNITS_PER_CHIP: i64 = 1_000_000;

/// Fixed-point chip amount in smallest units.
///
/// Signed: settlement and loan-style flows can legitimately drive a
/// balance below zero, so underflow is not an error at this layer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Chips {
    amount: i64,
}

impl Chips {
    pub const ZERO: Self = Self { amount: 0 };

    /// Create from raw subunits
    pub const fn new(amount: i64) -> Self {
        Self { amount }
    }

    /// Create from a whole-chip count
    pub const fn from_chips(chips: i64) -> Self {
        Self {
            amount: chips * SUBUNITS_PER_CHIP,
        }
    }

    pub const fn amount(&self) -> i64 {
        self.amount
    }

    pub fn to_chips(&self) -> f64 {
        self.amount as f64 / SUBUNITS_PER_CHIP as f64
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }

    /// Add with overflow checking
    pub fn checked_add(&self, other: Chips) -> Result<Chips> {
        self.amount
            .checked_add(other.amount)
            .map(Chips::new)
            .ok_or_else(|| Error::ArithmeticOverflow("chip addition overflow".to_string()))
    }

    /// Subtract with overflow checking
    pub fn checked_sub(&self, other: Chips) -> Result<Chips> {
        self.amount
            .checked_sub(other.amount)
            .map(Chips::new)
            .ok_or_else(|| Error::ArithmeticOverflow("chip subtraction overflow".to_string()))
    }

    /// Scale by a payout multiplier, rounding toward zero.
    ///
    /// Used to turn `wager * multiplier` into a concrete payout amount.
    pub fn scaled(&self, factor: f64) -> Chips {
        Chips::new((self.amount as f64 * factor) as i64)
    }

    pub const fn neg(&self) -> Chips {
        Chips::new(-self.amount)
    }
}

impl fmt::Display for Chips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} chips", self.to_chips())
    }
}

/// Opaque player identity (UUID bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    pub fn random() -> Self {
        Self(Uuid::new_v4().into_bytes())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != 32 {
            return Err(Error::InvalidInput("player id must be 32 hex chars".to_string()));
        }
        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|e| Error::InvalidInput(format!("invalid player id: {}", e)))?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chips_fixed_point() {
        let c = Chips::from_chips(5);
        assert_eq!(c.amount(), 5 * SUBUNITS_PER_CHIP);
        assert_eq!(c.to_chips(), 5.0);
    }

    #[test]
    fn test_chips_may_go_negative() {
        let c = Chips::from_chips(1).checked_sub(Chips::from_chips(3)).unwrap();
        assert_eq!(c, Chips::from_chips(-2));
    }

    #[test]
    fn test_scaled_rounds_toward_zero() {
        let wager = Chips::new(100);
        assert_eq!(wager.scaled(1.5), Chips::new(150));
        assert_eq!(wager.scaled(0.333), Chips::new(33));
    }

    #[test]
    fn test_player_id_hex_round_trip() {
        let id = PlayerId::random();
        assert_eq!(PlayerId::from_hex(&id.to_hex()).unwrap(), id);
    }
}
