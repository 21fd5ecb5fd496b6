//! Contract aggregate and signature types.
//!
//! Lifecycle: Draft -> PendingSignature -> Signed -> Active -> Completed or
//! Cancelled. The engineer signs first; the company countersignature can
//! only ever be present when the engineer signature already is. Terminal
//! contracts accept no further mutation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{SettleError, SettleResult};
use crate::types::common::{ContractId, Currency, JobId, MilestoneId, TimesheetId, UserId};
use crate::types::milestone::Milestone;
use crate::types::timesheet::Timesheet;

/// Engagement model of a contract
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    /// Fixed scope delivered through funded milestones
    StatementOfWork,
    /// Ongoing work billed through timesheets at a day rate
    DayRate,
}

impl ContractType {
    pub fn name(&self) -> &'static str {
        match self {
            ContractType::StatementOfWork => "statement_of_work",
            ContractType::DayRate => "day_rate",
        }
    }
}

impl std::fmt::Display for ContractType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Contract lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Draft,
    PendingSignature,
    /// Engineer has signed; waiting on the company countersignature
    Signed,
    Active,
    Completed,
    Cancelled,
}

impl ContractStatus {
    pub fn name(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "draft",
            ContractStatus::PendingSignature => "pending_signature",
            ContractStatus::Signed => "signed",
            ContractStatus::Active => "active",
            ContractStatus::Completed => "completed",
            ContractStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ContractStatus::Completed | ContractStatus::Cancelled)
    }

    pub fn can_transition_to(&self, new_status: ContractStatus) -> bool {
        matches!(
            (self, new_status),
            (ContractStatus::Draft, ContractStatus::PendingSignature)
                | (ContractStatus::Draft, ContractStatus::Cancelled)
                | (ContractStatus::PendingSignature, ContractStatus::Signed)
                | (ContractStatus::PendingSignature, ContractStatus::Cancelled)
                | (ContractStatus::Signed, ContractStatus::Active)
                | (ContractStatus::Signed, ContractStatus::Cancelled)
                | (ContractStatus::Active, ContractStatus::Completed)
                | (ContractStatus::Active, ContractStatus::Cancelled)
        )
    }
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A recorded signature. Immutable once set; a contract never un-signs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub signer_name: String,
    pub signed_at: DateTime<Utc>,
}

impl Signature {
    pub fn new(signer_name: impl Into<String>) -> Self {
        Self {
            signer_name: signer_name.into(),
            signed_at: Utc::now(),
        }
    }
}

/// A job engagement between a company and an engineer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub contract_id: ContractId,
    pub job_id: JobId,
    pub company_id: UserId,
    pub engineer_id: UserId,
    pub contract_type: ContractType,
    pub description: String,
    /// Fixed total for StatementOfWork; headline day rate for DayRate
    pub amount: Decimal,
    pub currency: Currency,
    pub status: ContractStatus,
    pub engineer_signature: Option<Signature>,
    pub company_signature: Option<Signature>,
    pub milestones: Vec<Milestone>,
    pub timesheets: Vec<Timesheet>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn new(
        job_id: JobId,
        company_id: UserId,
        engineer_id: UserId,
        contract_type: ContractType,
        description: impl Into<String>,
        amount: Decimal,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();
        Self {
            contract_id: ContractId::generate(),
            job_id,
            company_id,
            engineer_id,
            contract_type,
            description: description.into(),
            amount,
            currency,
            status: ContractStatus::Draft,
            engineer_signature: None,
            company_signature: None,
            milestones: Vec::new(),
            timesheets: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn transition_to(&mut self, new_status: ContractStatus) -> SettleResult<()> {
        if !self.status.can_transition_to(new_status) {
            return Err(SettleError::InvalidContractStatusTransition {
                from: self.status.name().to_string(),
                to: new_status.name().to_string(),
            });
        }
        self.status = new_status;
        self.touch();
        Ok(())
    }

    /// Day rate of a day-rate contract
    pub fn day_rate(&self) -> SettleResult<Decimal> {
        match self.contract_type {
            ContractType::DayRate => Ok(self.amount),
            ContractType::StatementOfWork => Err(SettleError::WrongContractType {
                expected: ContractType::DayRate.name().to_string(),
                actual: self.contract_type.name().to_string(),
            }),
        }
    }

    pub fn ensure_active(&self) -> SettleResult<()> {
        if self.status != ContractStatus::Active {
            return Err(SettleError::ContractNotActive {
                contract_id: self.contract_id.as_str().to_string(),
                status: self.status.name().to_string(),
            });
        }
        Ok(())
    }

    /// Signing-order invariant: a countersignature implies an engineer signature
    pub fn signature_order_holds(&self) -> bool {
        self.company_signature.is_none() || self.engineer_signature.is_some()
    }

    /// Move to PendingSignature. Allowed from Draft, and again from
    /// PendingSignature when the request is re-sent.
    pub fn mark_sent_for_signature(&mut self) -> SettleResult<()> {
        match self.status {
            ContractStatus::Draft => self.transition_to(ContractStatus::PendingSignature),
            ContractStatus::PendingSignature => {
                self.touch();
                Ok(())
            }
            _ => Err(SettleError::InvalidContractStatusTransition {
                from: self.status.name().to_string(),
                to: ContractStatus::PendingSignature.name().to_string(),
            }),
        }
    }

    /// Record the engineer signature; the contract moves to Signed
    pub fn record_engineer_signature(&mut self, signature: Signature) -> SettleResult<()> {
        if self.engineer_signature.is_some() {
            return Err(SettleError::AlreadySigned {
                role: "engineer".to_string(),
            });
        }
        self.transition_to(ContractStatus::Signed)?;
        self.engineer_signature = Some(signature);
        Ok(())
    }

    /// Record the company countersignature; the contract becomes Active.
    /// Requires the engineer signature to already be present.
    pub fn record_company_signature(&mut self, signature: Signature) -> SettleResult<()> {
        if self.engineer_signature.is_none() {
            return Err(SettleError::SignatureOutOfOrder);
        }
        if self.company_signature.is_some() {
            return Err(SettleError::AlreadySigned {
                role: "company".to_string(),
            });
        }
        self.transition_to(ContractStatus::Active)?;
        self.company_signature = Some(signature);
        Ok(())
    }

    pub fn complete(&mut self) -> SettleResult<()> {
        self.transition_to(ContractStatus::Completed)
    }

    pub fn cancel(&mut self) -> SettleResult<()> {
        self.transition_to(ContractStatus::Cancelled)
    }

    /// Attach a milestone while the contract is still being drafted
    pub fn add_milestone(&mut self, milestone: Milestone) -> SettleResult<()> {
        if self.contract_type != ContractType::StatementOfWork {
            return Err(SettleError::WrongContractType {
                expected: ContractType::StatementOfWork.name().to_string(),
                actual: self.contract_type.name().to_string(),
            });
        }
        if self.status != ContractStatus::Draft {
            return Err(SettleError::invalid_state(format!(
                "Cannot add a milestone to a {} contract",
                self.status.name()
            )));
        }
        self.milestones.push(milestone);
        self.touch();
        Ok(())
    }

    pub fn find_milestone(&self, milestone_id: &MilestoneId) -> SettleResult<&Milestone> {
        self.milestones
            .iter()
            .find(|m| &m.milestone_id == milestone_id)
            .ok_or_else(|| SettleError::MilestoneNotFound {
                milestone_id: milestone_id.as_str().to_string(),
            })
    }

    pub fn find_milestone_mut(
        &mut self,
        milestone_id: &MilestoneId,
    ) -> SettleResult<&mut Milestone> {
        self.milestones
            .iter_mut()
            .find(|m| &m.milestone_id == milestone_id)
            .ok_or_else(|| SettleError::MilestoneNotFound {
                milestone_id: milestone_id.as_str().to_string(),
            })
    }

    pub fn find_timesheet(&self, timesheet_id: &TimesheetId) -> SettleResult<&Timesheet> {
        self.timesheets
            .iter()
            .find(|t| &t.timesheet_id == timesheet_id)
            .ok_or_else(|| SettleError::TimesheetNotFound {
                timesheet_id: timesheet_id.as_str().to_string(),
            })
    }

    pub fn find_timesheet_mut(
        &mut self,
        timesheet_id: &TimesheetId,
    ) -> SettleResult<&mut Timesheet> {
        self.timesheets
            .iter_mut()
            .find(|t| &t.timesheet_id == timesheet_id)
            .ok_or_else(|| SettleError::TimesheetNotFound {
                timesheet_id: timesheet_id.as_str().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_contract(contract_type: ContractType) -> Contract {
        Contract::new(
            JobId::new("job_1"),
            UserId::new("co_1"),
            UserId::new("eng_1"),
            contract_type,
            "Platform rebuild",
            Decimal::from(5000),
            Currency::Usd,
        )
    }

    #[test]
    fn test_signing_flow() {
        let mut contract = create_test_contract(ContractType::StatementOfWork);
        assert_eq!(contract.status, ContractStatus::Draft);

        contract.mark_sent_for_signature().unwrap();
        assert_eq!(contract.status, ContractStatus::PendingSignature);

        contract
            .record_engineer_signature(Signature::new("Ada Lovelace"))
            .unwrap();
        assert_eq!(contract.status, ContractStatus::Signed);

        contract
            .record_company_signature(Signature::new("Initech Ltd"))
            .unwrap();
        assert_eq!(contract.status, ContractStatus::Active);
        assert!(contract.signature_order_holds());
    }

    #[test]
    fn test_countersign_before_engineer_rejected() {
        let mut contract = create_test_contract(ContractType::StatementOfWork);
        contract.mark_sent_for_signature().unwrap();

        let err = contract
            .record_company_signature(Signature::new("Initech Ltd"))
            .unwrap_err();
        assert_eq!(err, SettleError::SignatureOutOfOrder);
        assert_eq!(contract.status, ContractStatus::PendingSignature);
        assert!(contract.company_signature.is_none());
        assert!(contract.signature_order_holds());
    }

    #[test]
    fn test_double_signature_rejected() {
        let mut contract = create_test_contract(ContractType::StatementOfWork);
        contract.mark_sent_for_signature().unwrap();
        contract
            .record_engineer_signature(Signature::new("Ada Lovelace"))
            .unwrap();

        let err = contract
            .record_engineer_signature(Signature::new("Ada Lovelace"))
            .unwrap_err();
        assert_eq!(
            err,
            SettleError::AlreadySigned {
                role: "engineer".to_string()
            }
        );
    }

    #[test]
    fn test_signing_requires_sent_contract() {
        let mut contract = create_test_contract(ContractType::StatementOfWork);

        // Still Draft: nobody can sign yet
        let err = contract
            .record_engineer_signature(Signature::new("Ada Lovelace"))
            .unwrap_err();
        assert_eq!(
            err,
            SettleError::InvalidContractStatusTransition {
                from: "draft".to_string(),
                to: "signed".to_string(),
            }
        );
    }

    #[test]
    fn test_resend_keeps_pending_signature() {
        let mut contract = create_test_contract(ContractType::StatementOfWork);
        contract.mark_sent_for_signature().unwrap();
        contract.mark_sent_for_signature().unwrap();
        assert_eq!(contract.status, ContractStatus::PendingSignature);
    }

    #[test]
    fn test_terminal_contract_rejects_mutation() {
        let mut contract = create_test_contract(ContractType::StatementOfWork);
        contract.cancel().unwrap();
        assert!(contract.status.is_terminal());

        assert!(contract.mark_sent_for_signature().is_err());
        assert!(contract
            .record_engineer_signature(Signature::new("Ada Lovelace"))
            .is_err());
        assert!(contract.complete().is_err());
        assert!(contract
            .add_milestone(Milestone::new("Late scope", Decimal::from(100)))
            .is_err());
    }

    #[test]
    fn test_milestones_only_on_statement_of_work() {
        let mut contract = create_test_contract(ContractType::DayRate);
        let err = contract
            .add_milestone(Milestone::new("Design", Decimal::from(500)))
            .unwrap_err();
        assert!(matches!(err, SettleError::WrongContractType { .. }));

        assert!(contract.day_rate().is_ok());
        let sow = create_test_contract(ContractType::StatementOfWork);
        assert!(sow.day_rate().is_err());
    }

    #[test]
    fn test_complete_requires_active() {
        let mut contract = create_test_contract(ContractType::StatementOfWork);
        assert!(contract.complete().is_err());

        contract.mark_sent_for_signature().unwrap();
        contract
            .record_engineer_signature(Signature::new("Ada Lovelace"))
            .unwrap();
        contract
            .record_company_signature(Signature::new("Initech Ltd"))
            .unwrap();
        contract.complete().unwrap();
        assert_eq!(contract.status, ContractStatus::Completed);
    }
}
