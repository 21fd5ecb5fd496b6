//! Platform fee calculation.
//!
//! The marketplace retains a fixed 5% of every settlement payout. The fee is
//! rounded to the smallest currency unit and the payout is taken as the
//! remainder, so the two always sum back to the gross amount exactly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{SettleError, SettleResult};

/// Fee rate retained from every settlement payout
pub const PLATFORM_FEE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2); // 0.05

/// Decimal places of the smallest currency unit
pub const CURRENCY_SCALE: u32 = 2;

/// How a gross settlement amount divides into payout and fee
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Gross amount being settled
    pub gross: Decimal,
    /// Credit released to the engineer
    pub payout: Decimal,
    /// Fee retained by the marketplace
    pub fee: Decimal,
}

impl FeeBreakdown {
    /// Split a gross amount at the platform fee rate
    pub fn split(gross: Decimal) -> SettleResult<Self> {
        if gross <= Decimal::ZERO {
            return Err(SettleError::invalid_amount(format!(
                "settlement amount must be positive, got {}",
                gross
            )));
        }
        let fee = (gross * PLATFORM_FEE_RATE).round_dp(CURRENCY_SCALE);
        let payout = gross - fee; // Remainder to avoid rounding issues
        Ok(Self { gross, payout, fee })
    }

    /// Verify the split sums back to the gross amount
    pub fn verify_sum(&self) -> bool {
        self.payout + self.fee == self.gross
    }
}
