//! Transaction Ledger
//!
//! A pure, append-only log of everything that moves value on the platform.
//! Entries are validated against their type's sign rule on the way in and
//! never mutated afterwards. Settlement (payout + fee) goes through
//! [`TransactionLog::append_settlement`], which admits the pair as a unit:
//! either both entries land or neither does.

pub mod fees;

pub use fees::{FeeBreakdown, CURRENCY_SCALE, PLATFORM_FEE_RATE};

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{SettleError, SettleResult};
use crate::types::{ContractId, Transaction, TransactionId, TransactionType, UserId};

/// The payout and fee entries emitted together when work is approved
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SettlementEmission {
    /// Gross amount the pair settles
    pub gross: Decimal,
    pub payout: Transaction,
    pub fee: Transaction,
}

impl SettlementEmission {
    /// Build the pair from a fee breakdown, both booked against the engineer
    pub fn new(
        breakdown: &FeeBreakdown,
        engineer_id: UserId,
        contract_id: ContractId,
        label: &str,
    ) -> Self {
        let payout = Transaction::new(
            engineer_id.clone(),
            TransactionType::Payout,
            breakdown.payout,
            format!("Payout: {}", label),
        )
        .with_contract(contract_id.clone());
        let fee = Transaction::new(
            engineer_id,
            TransactionType::PlatformFee,
            -breakdown.fee,
            format!("Platform fee: {}", label),
        )
        .with_contract(contract_id);
        Self {
            gross: breakdown.gross,
            payout,
            fee,
        }
    }

    /// Reconciliation: payout plus the fee magnitude equals the gross amount
    pub fn reconciles(&self) -> bool {
        self.payout.amount - self.fee.amount == self.gross
    }
}

/// Append-only transaction log
#[derive(Clone, Debug, Default)]
pub struct TransactionLog {
    entries: Vec<Transaction>,
    ids: HashSet<TransactionId>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            ids: HashSet::new(),
        }
    }

    fn admit(&mut self, transaction: Transaction) -> TransactionId {
        let id = transaction.transaction_id.clone();
        self.ids.insert(id.clone());
        self.entries.push(transaction);
        id
    }

    fn check(&self, transaction: &Transaction) -> SettleResult<()> {
        transaction.validate_sign()?;
        if self.ids.contains(&transaction.transaction_id) {
            return Err(SettleError::DuplicateTransaction {
                transaction_id: transaction.transaction_id.as_str().to_string(),
            });
        }
        Ok(())
    }

    /// Append a single validated entry
    pub fn append(&mut self, transaction: Transaction) -> SettleResult<TransactionId> {
        self.check(&transaction)?;
        Ok(self.admit(transaction))
    }

    /// Append a settlement pair atomically. Both entries are validated and
    /// reconciled against the gross amount before either becomes visible.
    pub fn append_settlement(
        &mut self,
        emission: SettlementEmission,
    ) -> SettleResult<(TransactionId, TransactionId)> {
        if emission.payout.tx_type != TransactionType::Payout
            || emission.fee.tx_type != TransactionType::PlatformFee
        {
            return Err(SettleError::invalid_state(format!(
                "settlement pair must be payout + platform_fee, got {} + {}",
                emission.payout.tx_type, emission.fee.tx_type
            )));
        }
        if !emission.reconciles() {
            return Err(SettleError::SettlementPairMismatch {
                gross: emission.gross,
                payout: emission.payout.amount,
                fee: -emission.fee.amount,
            });
        }
        self.check(&emission.payout)?;
        self.check(&emission.fee)?;

        let payout_id = self.admit(emission.payout);
        let fee_id = self.admit(emission.fee);
        Ok((payout_id, fee_id))
    }

    /// Net position of a user: the sum of every signed amount on their line
    pub fn balance_for(&self, user_id: &UserId) -> Decimal {
        self.entries
            .iter()
            .filter(|t| &t.user_id == user_id)
            .map(|t| t.amount)
            .sum()
    }

    /// Entries affecting a user, newest first
    pub fn entries_for_user(&self, user_id: &UserId) -> Vec<Transaction> {
        self.entries
            .iter()
            .rev()
            .filter(|t| &t.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Entries belonging to a contract, newest first
    pub fn entries_for_contract(&self, contract_id: &ContractId) -> Vec<Transaction> {
        self.entries
            .iter()
            .rev()
            .filter(|t| t.contract_id.as_ref() == Some(contract_id))
            .cloned()
            .collect()
    }

    /// All entries in append order
    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_log() -> TransactionLog {
        TransactionLog::new()
    }

    fn funding_tx(user: &str, amount: i64) -> Transaction {
        Transaction::new(
            UserId::new(user),
            TransactionType::EscrowFunding,
            Decimal::from(amount),
            "Escrow funding",
        )
        .with_contract(ContractId::new("ct_1"))
    }

    #[test]
    fn test_append_and_balance() {
        let mut log = create_test_log();
        log.append(funding_tx("co_1", -1000)).unwrap();
        log.append(Transaction::new(
            UserId::new("eng_1"),
            TransactionType::AdRevenue,
            Decimal::from(20),
            "Ad share",
        ))
        .unwrap();

        assert_eq!(log.balance_for(&UserId::new("co_1")), Decimal::from(-1000));
        assert_eq!(log.balance_for(&UserId::new("eng_1")), Decimal::from(20));
        assert_eq!(log.balance_for(&UserId::new("nobody")), Decimal::ZERO);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_wrong_sign_rejected() {
        let mut log = create_test_log();
        let err = log.append(funding_tx("co_1", 1000)).unwrap_err();
        assert!(matches!(err, SettleError::AmountSignMismatch { .. }));
        assert!(log.is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut log = create_test_log();
        let tx = funding_tx("co_1", -1000);
        log.append(tx.clone()).unwrap();
        let err = log.append(tx).unwrap_err();
        assert!(matches!(err, SettleError::DuplicateTransaction { .. }));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_settlement_pair_lands_atomically() {
        let mut log = create_test_log();
        let breakdown = FeeBreakdown::split(Decimal::from(1000)).unwrap();
        let emission = SettlementEmission::new(
            &breakdown,
            UserId::new("eng_1"),
            ContractId::new("ct_1"),
            "Backend API",
        );

        log.append_settlement(emission).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.balance_for(&UserId::new("eng_1")), Decimal::from(900));

        let entries = log.entries_for_contract(&ContractId::new("ct_1"));
        assert_eq!(entries.len(), 2);
        // Newest first: fee was admitted after payout
        assert_eq!(entries[0].tx_type, TransactionType::PlatformFee);
        assert_eq!(entries[1].tx_type, TransactionType::Payout);
    }

    #[test]
    fn test_tampered_pair_rejected_whole() {
        let mut log = create_test_log();
        let breakdown = FeeBreakdown::split(Decimal::from(1000)).unwrap();
        let mut emission = SettlementEmission::new(
            &breakdown,
            UserId::new("eng_1"),
            ContractId::new("ct_1"),
            "Backend API",
        );
        emission.payout.amount = Decimal::from(999);

        let err = log.append_settlement(emission).unwrap_err();
        assert!(matches!(err, SettleError::SettlementPairMismatch { .. }));
        assert!(log.is_empty());
    }

    #[test]
    fn test_entries_for_user_newest_first() {
        let mut log = create_test_log();
        log.append(funding_tx("co_1", -100)).unwrap();
        log.append(funding_tx("co_1", -200)).unwrap();

        let entries = log.entries_for_user(&UserId::new("co_1"));
        assert_eq!(entries[0].amount, Decimal::from(-200));
        assert_eq!(entries[1].amount, Decimal::from(-100));
    }
}
