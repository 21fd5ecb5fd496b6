//! Settlement Audit
//!
//! Per-contract reconciliation between what the aggregate says happened and
//! what the ledger recorded. Every funded milestone must be backed by one
//! escrow debit; every settled work item by one payout and one fee entry
//! whose magnitudes sum back to the gross amount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};

use crate::error::{SettleError, SettleResult};
use crate::types::{
    Contract, ContractId, ContractType, MilestoneStatus, TimesheetStatus, Transaction,
    TransactionType,
};

/// Reconciled money totals for one contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub contract_id: ContractId,
    /// Total placed into escrow, as a positive magnitude
    pub escrow_funded: Decimal,
    /// Gross value of settled milestones and timesheets
    pub gross_settled: Decimal,
    /// Total paid out to the engineer
    pub payouts: Decimal,
    /// Total platform fees retained, as a positive magnitude
    pub fees: Decimal,
    /// Escrow funded but not yet settled
    pub escrow_outstanding: Decimal,
    pub milestones_funded: usize,
    pub milestones_paid: usize,
    pub timesheets_settled: usize,
    /// Hex fingerprint of the totals above
    pub summary_digest: String,
}

impl SettlementSummary {
    fn compute_digest(&mut self) {
        let mut hasher = Sha256::new();
        hasher.update(self.contract_id.as_str().as_bytes());
        hasher.update(self.escrow_funded.to_string().as_bytes());
        hasher.update(self.gross_settled.to_string().as_bytes());
        hasher.update(self.payouts.to_string().as_bytes());
        hasher.update(self.fees.to_string().as_bytes());
        hasher.update(self.escrow_outstanding.to_string().as_bytes());
        hasher.update((self.milestones_funded as u64).to_be_bytes());
        hasher.update((self.milestones_paid as u64).to_be_bytes());
        hasher.update((self.timesheets_settled as u64).to_be_bytes());
        self.summary_digest = hex::encode(hasher.finalize());
    }
}

/// What the contract aggregate expects the ledger to show
#[derive(Clone, Copy, Debug, Default)]
struct ExpectedTotals {
    funded: Decimal,
    funded_count: usize,
    /// Gross of settled milestones only; timesheets never sit in escrow
    milestone_gross: Decimal,
    gross_settled: Decimal,
    settled_count: usize,
    milestones_paid: usize,
    timesheets_settled: usize,
}

/// Settlement auditor
pub struct SettlementAuditor;

impl SettlementAuditor {
    pub fn new() -> Self {
        Self
    }

    fn expected_totals(&self, contract: &Contract) -> ExpectedTotals {
        let mut totals = ExpectedTotals::default();

        for milestone in &contract.milestones {
            if milestone.status != MilestoneStatus::AwaitingFunding {
                totals.funded += milestone.amount;
                totals.funded_count += 1;
            }
            if milestone.status == MilestoneStatus::CompletedPaid {
                totals.milestone_gross += milestone.amount;
                totals.gross_settled += milestone.amount;
                totals.settled_count += 1;
                totals.milestones_paid += 1;
            }
        }

        if contract.contract_type == ContractType::DayRate {
            for timesheet in &contract.timesheets {
                if timesheet.status != TimesheetStatus::Submitted {
                    totals.gross_settled += contract.amount * timesheet.days_worked;
                    totals.settled_count += 1;
                    totals.timesheets_settled += 1;
                }
            }
        }

        totals
    }

    /// Build the summary for one contract from its ledger entries
    pub fn summarize(&self, contract: &Contract, entries: &[Transaction]) -> SettlementSummary {
        let expected = self.expected_totals(contract);

        let mut escrow_funded = Decimal::ZERO;
        let mut payouts = Decimal::ZERO;
        let mut fees = Decimal::ZERO;
        for entry in entries
            .iter()
            .filter(|t| t.contract_id.as_ref() == Some(&contract.contract_id))
        {
            match entry.tx_type {
                TransactionType::EscrowFunding => escrow_funded += -entry.amount,
                TransactionType::Payout => payouts += entry.amount,
                TransactionType::PlatformFee => fees += -entry.amount,
                _ => {}
            }
        }

        let mut summary = SettlementSummary {
            contract_id: contract.contract_id.clone(),
            escrow_funded,
            gross_settled: expected.gross_settled,
            payouts,
            fees,
            escrow_outstanding: escrow_funded - expected.milestone_gross,
            milestones_funded: expected.funded_count,
            milestones_paid: expected.milestones_paid,
            timesheets_settled: expected.timesheets_settled,
            summary_digest: String::new(),
        };
        summary.compute_digest();
        summary
    }

    /// Summarize and check the reconciliation invariants, failing closed on
    /// any drift between aggregate state and ledger.
    pub fn verify(
        &self,
        contract: &Contract,
        entries: &[Transaction],
    ) -> SettleResult<SettlementSummary> {
        let expected = self.expected_totals(contract);
        let contract_entries: Vec<&Transaction> = entries
            .iter()
            .filter(|t| t.contract_id.as_ref() == Some(&contract.contract_id))
            .collect();

        let funding_count = contract_entries
            .iter()
            .filter(|t| t.tx_type == TransactionType::EscrowFunding)
            .count();
        if funding_count != expected.funded_count {
            return Err(SettleError::invariant(
                "escrow_funding_count",
                format!(
                    "{} funded milestones but {} escrow entries for {}",
                    expected.funded_count, funding_count, contract.contract_id
                ),
            ));
        }

        let payout_count = contract_entries
            .iter()
            .filter(|t| t.tx_type == TransactionType::Payout)
            .count();
        let fee_count = contract_entries
            .iter()
            .filter(|t| t.tx_type == TransactionType::PlatformFee)
            .count();
        if payout_count != expected.settled_count || fee_count != expected.settled_count {
            return Err(SettleError::invariant(
                "settlement_pair_count",
                format!(
                    "{} settled items but {} payouts and {} fees for {}",
                    expected.settled_count, payout_count, fee_count, contract.contract_id
                ),
            ));
        }

        let summary = self.summarize(contract, entries);
        if summary.escrow_funded != expected.funded {
            return Err(SettleError::invariant(
                "escrow_funding_total",
                format!(
                    "ledger holds {} in escrow, aggregate expects {} for {}",
                    summary.escrow_funded, expected.funded, contract.contract_id
                ),
            ));
        }
        if summary.payouts + summary.fees != expected.gross_settled {
            return Err(SettleError::invariant(
                "settlement_reconciliation",
                format!(
                    "payouts {} + fees {} != gross {} for {}",
                    summary.payouts, summary.fees, expected.gross_settled, contract.contract_id
                ),
            ));
        }

        Ok(summary)
    }
}

impl Default for SettlementAuditor {
    fn default() -> Self {
        Self::new()
    }
}
