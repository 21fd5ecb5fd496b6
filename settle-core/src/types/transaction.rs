//! Ledger entry types.
//!
//! Transactions are append-only. The sign of `amount` is the single source
//! of truth for whether an entry is a cost or a gain to `user_id`:
//! negative = debit, positive = credit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{SettleError, SettleResult};
use crate::types::common::{ContractId, TransactionId, UserId};

/// Kind of ledger entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Monthly subscription charge
    Subscription,
    /// Funds set aside for a milestone before approval
    EscrowFunding,
    /// Settlement credit released to an engineer
    Payout,
    /// Marketplace fee retained from a settlement
    PlatformFee,
    /// Profile boost purchase
    BoostPurchase,
    /// Advertising revenue share
    AdRevenue,
}

/// Which amount signs a transaction type permits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmountDirection {
    /// Amount must be <= 0
    Debit,
    /// Amount must be >= 0
    Credit,
}

impl TransactionType {
    pub fn all() -> Vec<TransactionType> {
        vec![
            TransactionType::Subscription,
            TransactionType::EscrowFunding,
            TransactionType::Payout,
            TransactionType::PlatformFee,
            TransactionType::BoostPurchase,
            TransactionType::AdRevenue,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransactionType::Subscription => "subscription",
            TransactionType::EscrowFunding => "escrow_funding",
            TransactionType::Payout => "payout",
            TransactionType::PlatformFee => "platform_fee",
            TransactionType::BoostPurchase => "boost_purchase",
            TransactionType::AdRevenue => "ad_revenue",
        }
    }

    /// Semantic direction of this entry type
    pub fn direction(&self) -> AmountDirection {
        match self {
            TransactionType::Subscription
            | TransactionType::EscrowFunding
            | TransactionType::PlatformFee
            | TransactionType::BoostPurchase => AmountDirection::Debit,
            TransactionType::Payout | TransactionType::AdRevenue => AmountDirection::Credit,
        }
    }

    pub fn permits(&self, amount: Decimal) -> bool {
        match self.direction() {
            AmountDirection::Debit => amount <= Decimal::ZERO,
            AmountDirection::Credit => amount >= Decimal::ZERO,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Append-only ledger entry. Never mutated or deleted after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    /// Wallet owner this entry affects
    pub user_id: UserId,
    /// Originating contract, when the entry belongs to one
    pub contract_id: Option<ContractId>,
    pub tx_type: TransactionType,
    /// Signed amount: negative = debit, positive = credit
    pub amount: Decimal,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        user_id: UserId,
        tx_type: TransactionType,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id: TransactionId::generate(),
            user_id,
            contract_id: None,
            tx_type,
            amount,
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_contract(mut self, contract_id: ContractId) -> Self {
        self.contract_id = Some(contract_id);
        self
    }

    /// Check the amount sign against the declared type
    pub fn validate_sign(&self) -> SettleResult<()> {
        if !self.tx_type.permits(self.amount) {
            return Err(SettleError::AmountSignMismatch {
                tx_type: self.tx_type.name().to_string(),
                amount: self.amount,
            });
        }
        Ok(())
    }

    pub fn is_debit(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn is_credit(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_directions() {
        assert_eq!(
            TransactionType::EscrowFunding.direction(),
            AmountDirection::Debit
        );
        assert_eq!(
            TransactionType::PlatformFee.direction(),
            AmountDirection::Debit
        );
        assert_eq!(
            TransactionType::Subscription.direction(),
            AmountDirection::Debit
        );
        assert_eq!(
            TransactionType::BoostPurchase.direction(),
            AmountDirection::Debit
        );
        assert_eq!(TransactionType::Payout.direction(), AmountDirection::Credit);
        assert_eq!(
            TransactionType::AdRevenue.direction(),
            AmountDirection::Credit
        );
    }

    #[test]
    fn test_validate_sign() {
        let tx = Transaction::new(
            UserId::new("eng_1"),
            TransactionType::Payout,
            Decimal::from(950),
            "Milestone payout",
        );
        assert!(tx.validate_sign().is_ok());
        assert!(tx.is_credit());

        let tx = Transaction::new(
            UserId::new("eng_1"),
            TransactionType::Payout,
            Decimal::from(-950),
            "Milestone payout",
        );
        assert_eq!(
            tx.validate_sign(),
            Err(SettleError::AmountSignMismatch {
                tx_type: "payout".to_string(),
                amount: Decimal::from(-950),
            })
        );
    }

    #[test]
    fn test_every_type_permits_zero() {
        for tx_type in TransactionType::all() {
            assert!(tx_type.permits(Decimal::ZERO), "{}", tx_type.name());
        }
    }
}
