//! Milestone escrow types.
//!
//! A milestone is owned exclusively by its contract and advances strictly
//! forward: AwaitingFunding -> FundedInProgress -> SubmittedForApproval ->
//! CompletedPaid. Once paid it is immutable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{SettleError, SettleResult};
use crate::types::common::MilestoneId;

/// Milestone escrow status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    AwaitingFunding,
    FundedInProgress,
    SubmittedForApproval,
    /// Reserved for an invoicing extension; no shipped operation reaches it
    ApprovedPendingInvoice,
    CompletedPaid,
}

impl MilestoneStatus {
    pub fn name(&self) -> &'static str {
        match self {
            MilestoneStatus::AwaitingFunding => "awaiting_funding",
            MilestoneStatus::FundedInProgress => "funded_in_progress",
            MilestoneStatus::SubmittedForApproval => "submitted_for_approval",
            MilestoneStatus::ApprovedPendingInvoice => "approved_pending_invoice",
            MilestoneStatus::CompletedPaid => "completed_paid",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MilestoneStatus::CompletedPaid)
    }

    /// Forward-only transition table
    pub fn can_transition_to(&self, new_status: MilestoneStatus) -> bool {
        matches!(
            (self, new_status),
            (
                MilestoneStatus::AwaitingFunding,
                MilestoneStatus::FundedInProgress
            ) | (
                MilestoneStatus::FundedInProgress,
                MilestoneStatus::SubmittedForApproval
            ) | (
                MilestoneStatus::SubmittedForApproval,
                MilestoneStatus::CompletedPaid
            ) | (
                MilestoneStatus::SubmittedForApproval,
                MilestoneStatus::ApprovedPendingInvoice
            ) | (
                MilestoneStatus::ApprovedPendingInvoice,
                MilestoneStatus::CompletedPaid
            )
        )
    }
}

impl std::fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A unit of statement-of-work scope funded and paid through escrow
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub milestone_id: MilestoneId,
    pub description: String,
    /// Strictly positive; currency implied by the parent contract
    pub amount: Decimal,
    pub status: MilestoneStatus,
    pub created_at: DateTime<Utc>,
    pub funded_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Milestone {
    pub fn new(description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            milestone_id: MilestoneId::generate(),
            description: description.into(),
            amount,
            status: MilestoneStatus::AwaitingFunding,
            created_at: Utc::now(),
            funded_at: None,
            paid_at: None,
        }
    }

    fn transition_to(&mut self, new_status: MilestoneStatus) -> SettleResult<()> {
        if !self.status.can_transition_to(new_status) {
            return Err(SettleError::InvalidMilestoneStatusTransition {
                from: self.status.name().to_string(),
                to: new_status.name().to_string(),
            });
        }
        self.status = new_status;
        Ok(())
    }

    /// Escrow funding received; work may begin
    pub fn fund(&mut self) -> SettleResult<()> {
        self.transition_to(MilestoneStatus::FundedInProgress)?;
        self.funded_at = Some(Utc::now());
        Ok(())
    }

    /// Engineer hands the work over for approval
    pub fn submit_for_approval(&mut self) -> SettleResult<()> {
        self.transition_to(MilestoneStatus::SubmittedForApproval)
    }

    /// Approval granted and settlement emitted; terminal
    pub fn complete_paid(&mut self) -> SettleResult<()> {
        self.transition_to(MilestoneStatus::CompletedPaid)?;
        self.paid_at = Some(Utc::now());
        Ok(())
    }
}
