//! Contract Operations
//!
//! The settlement-bearing operations on the contract aggregate: signature
//! dispatch, milestone escrow funding and approval, and the timesheet
//! payroll flow. Operations that move money return the ledger entries they
//! imply; the caller appends them to the transaction log and persists the
//! aggregate together.

use rust_decimal::Decimal;

use crate::error::{SettleError, SettleResult};
use crate::ledger::{FeeBreakdown, SettlementEmission};
use crate::types::{
    ActorRole, Contract, ContractStatus, Milestone, MilestoneId, Signature, Timesheet, TimesheetId,
    Transaction, TransactionType, UserId,
};

/// What a successful signature call achieved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignOutcome {
    /// Engineer signature recorded; waiting on the company
    EngineerSigned,
    /// Countersignature recorded; the contract is now Active
    ContractActivated,
}

impl Contract {
    /// Attach a new milestone while drafting. Amounts must be positive.
    pub fn draft_milestone(
        &mut self,
        description: impl Into<String>,
        amount: Decimal,
    ) -> SettleResult<MilestoneId> {
        if amount <= Decimal::ZERO {
            return Err(SettleError::invalid_amount(
                "Milestone amount must be positive",
            ));
        }
        let milestone = Milestone::new(description, amount);
        let milestone_id = milestone.milestone_id.clone();
        self.add_milestone(milestone)?;
        Ok(milestone_id)
    }

    /// Record a signature on behalf of the given role.
    ///
    /// The engineer signs first; any company-side role countersigns once the
    /// engineer signature is in place.
    pub fn sign(
        &mut self,
        actor_role: ActorRole,
        signer_name: impl Into<String>,
    ) -> SettleResult<SignOutcome> {
        let signature = Signature::new(signer_name);
        if actor_role == ActorRole::Engineer {
            self.record_engineer_signature(signature)?;
            Ok(SignOutcome::EngineerSigned)
        } else if actor_role.is_company_side() {
            self.record_company_signature(signature)?;
            Ok(SignOutcome::ContractActivated)
        } else {
            Err(SettleError::role_not_permitted(
                actor_role.name(),
                "sign a contract",
            ))
        }
    }

    /// Fund a milestone into escrow.
    ///
    /// The payer must be the contract's company. Returns the escrow-funding
    /// debit to append against the payer.
    pub fn fund_milestone(
        &mut self,
        milestone_id: &MilestoneId,
        payer_id: &UserId,
    ) -> SettleResult<Transaction> {
        self.ensure_active()?;
        if payer_id != &self.company_id {
            return Err(SettleError::role_not_permitted(
                "payer",
                "fund escrow on a contract held by another company",
            ));
        }

        let milestone = self.find_milestone_mut(milestone_id)?;
        milestone.fund()?;
        let amount = milestone.amount;
        let description = milestone.description.clone();
        self.touch();

        Ok(Transaction::new(
            payer_id.clone(),
            TransactionType::EscrowFunding,
            -amount,
            format!("Escrow funding: {}", description),
        )
        .with_contract(self.contract_id.clone()))
    }

    /// Engineer submits a funded milestone for company approval. No ledger
    /// effect.
    pub fn submit_milestone_for_approval(&mut self, milestone_id: &MilestoneId) -> SettleResult<()> {
        self.ensure_active()?;
        self.find_milestone_mut(milestone_id)?.submit_for_approval()?;
        self.touch();
        Ok(())
    }

    /// Approve a submitted milestone and settle it.
    ///
    /// The milestone becomes CompletedPaid and the payout/fee pair for its
    /// amount is returned for the caller to append as a unit.
    pub fn approve_milestone_payout(
        &mut self,
        milestone_id: &MilestoneId,
    ) -> SettleResult<SettlementEmission> {
        self.ensure_active()?;

        let (amount, description) = {
            let milestone = self.find_milestone(milestone_id)?;
            (milestone.amount, milestone.description.clone())
        };
        let breakdown = FeeBreakdown::split(amount)?;

        self.find_milestone_mut(milestone_id)?.complete_paid()?;
        self.touch();

        Ok(SettlementEmission::new(
            &breakdown,
            self.engineer_id.clone(),
            self.contract_id.clone(),
            &description,
        ))
    }

    /// Engineer submits a period of day-rate work
    pub fn submit_timesheet(
        &mut self,
        period: impl Into<String>,
        days_worked: Decimal,
    ) -> SettleResult<TimesheetId> {
        self.ensure_active()?;
        self.day_rate()?;
        if days_worked <= Decimal::ZERO {
            return Err(SettleError::invalid_amount(
                "Days worked must be positive",
            ));
        }

        let timesheet = Timesheet::new(
            self.contract_id.clone(),
            self.engineer_id.clone(),
            period,
            days_worked,
        );
        let timesheet_id = timesheet.timesheet_id.clone();
        self.timesheets.push(timesheet);
        self.touch();
        Ok(timesheet_id)
    }

    /// Approve a submitted timesheet and settle it at the contract day rate.
    pub fn approve_timesheet(
        &mut self,
        timesheet_id: &TimesheetId,
    ) -> SettleResult<SettlementEmission> {
        self.ensure_active()?;
        let rate = self.day_rate()?;

        let (days_worked, period) = {
            let timesheet = self.find_timesheet(timesheet_id)?;
            (timesheet.days_worked, timesheet.period.clone())
        };
        let breakdown = FeeBreakdown::split(rate * days_worked)?;

        self.find_timesheet_mut(timesheet_id)?.approve()?;
        self.touch();

        Ok(SettlementEmission::new(
            &breakdown,
            self.engineer_id.clone(),
            self.contract_id.clone(),
            &format!("timesheet {}", period),
        ))
    }

    /// Record the payroll run for an approved timesheet. Administrative
    /// book-keeping only; settlement was emitted at approval.
    ///
    /// Accepted while the contract is Active and after it completes. A
    /// cancelled contract rejects it like every other mutation.
    pub fn mark_timesheet_paid(&mut self, timesheet_id: &TimesheetId) -> SettleResult<()> {
        if !matches!(
            self.status,
            ContractStatus::Active | ContractStatus::Completed
        ) {
            return Err(SettleError::ContractNotActive {
                contract_id: self.contract_id.as_str().to_string(),
                status: self.status.name().to_string(),
            });
        }
        self.find_timesheet_mut(timesheet_id)?.mark_paid()?;
        self.touch();
        Ok(())
    }
}
