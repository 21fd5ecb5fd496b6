//! Contract & Escrow Settlement Engine - Core
//!
//! State machines and money math for moving a marketplace job engagement
//! through signature, escrow, and payout. It provides:
//! - **Contracts**: Draft -> PendingSignature -> Signed -> Active lifecycle
//!   with engineer-first signature ordering
//! - **Escrow**: milestone funding, submission, and approval with payout
//!   and platform-fee emission
//! - **Payroll**: timesheet submission and approval for day-rate contracts
//! - **Ledger**: append-only transaction log with per-type sign rules
//! - **Subscription**: tier upgrades, trial expiry, and the credit-limited
//!   security-net benefit
//!
//! # Settlement Invariants
//!
//! | Invariant | Core Requirement |
//! |-----------|------------------|
//! | **Engineer Signs First** | A company countersignature can only exist on top of an engineer signature |
//! | **Append-Only Ledger** | Transactions are validated on entry and never mutated or deleted |
//! | **Atomic Settlement Pair** | Payout and platform fee land together or not at all, and sum back to the gross amount |
//! | **Single Fee Point** | The 5% platform fee is computed only at settlement time, nowhere else |
//! | **Bounded Security Net** | At most 3 credits per engineer; the third forces the profile inactive |
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │               Service Layer                     │
//! │   (repositories, orchestration, notification)   │
//! ├─────────────────────────────────────────────────┤
//! │          Settlement Core (this crate)           │
//! │  (contracts, escrow, payroll, ledger, tiers)    │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is synchronous and storage-free: operations validate,
//! mutate the aggregate they are given, and return the ledger entries they
//! imply. Persisting aggregates and appending entries is the caller's job.

pub mod contract;
pub mod error;
pub mod ledger;
pub mod settlement;
pub mod subscription;
pub mod types;

// Re-export error types
pub use error::{ErrorKind, SecurityNetDenial, SettleError, SettleResult};

// Re-export all types
pub use types::*;

// Re-export contract operations
pub use contract::SignOutcome;

// Re-export ledger
pub use ledger::{
    FeeBreakdown, SettlementEmission, TransactionLog, CURRENCY_SCALE, PLATFORM_FEE_RATE,
};

// Re-export subscription engine
pub use subscription::{GateCheckResult, SecurityNetGate, SecurityNetGrant, SubscriptionEngine};

// Re-export settlement audit
pub use settlement::{SettlementAuditor, SettlementSummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_contract_id_generation() {
        let id = ContractId::generate();
        assert!(id.as_str().starts_with("ct_"));
    }

    #[test]
    fn test_fee_rate_is_five_percent() {
        assert_eq!(PLATFORM_FEE_RATE, Decimal::new(5, 2));
    }

    #[test]
    fn test_fee_split_sanity() {
        let breakdown = FeeBreakdown::split(Decimal::from(200)).unwrap();
        assert_eq!(breakdown.payout, Decimal::from(190));
        assert_eq!(breakdown.fee, Decimal::from(10));
        assert!(breakdown.verify_sum());
    }

    #[test]
    fn test_tier_price_table() {
        assert_eq!(SubscriptionTier::Basic.monthly_price(), None);
        assert_eq!(
            SubscriptionTier::Business.monthly_price(),
            Some(Decimal::from(35))
        );
    }
}
