//! Timesheet payroll types.
//!
//! Timesheets accrue against day-rate contracts and advance forward only:
//! Submitted -> Approved -> Paid.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{SettleError, SettleResult};
use crate::types::common::{ContractId, TimesheetId, UserId};

/// Timesheet status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimesheetStatus {
    Submitted,
    Approved,
    Paid,
}

impl TimesheetStatus {
    pub fn name(&self) -> &'static str {
        match self {
            TimesheetStatus::Submitted => "submitted",
            TimesheetStatus::Approved => "approved",
            TimesheetStatus::Paid => "paid",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TimesheetStatus::Paid)
    }

    pub fn can_transition_to(&self, new_status: TimesheetStatus) -> bool {
        matches!(
            (self, new_status),
            (TimesheetStatus::Submitted, TimesheetStatus::Approved)
                | (TimesheetStatus::Approved, TimesheetStatus::Paid)
        )
    }
}

impl std::fmt::Display for TimesheetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A period of day-rate work submitted by the engineer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timesheet {
    pub timesheet_id: TimesheetId,
    pub contract_id: ContractId,
    pub engineer_id: UserId,
    /// Human-readable period label, e.g. "2025-W12"
    pub period: String,
    /// Strictly positive
    pub days_worked: Decimal,
    pub status: TimesheetStatus,
    pub submitted_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Timesheet {
    pub fn new(
        contract_id: ContractId,
        engineer_id: UserId,
        period: impl Into<String>,
        days_worked: Decimal,
    ) -> Self {
        Self {
            timesheet_id: TimesheetId::generate(),
            contract_id,
            engineer_id,
            period: period.into(),
            days_worked,
            status: TimesheetStatus::Submitted,
            submitted_at: Utc::now(),
            approved_at: None,
            paid_at: None,
        }
    }

    fn transition_to(&mut self, new_status: TimesheetStatus) -> SettleResult<()> {
        if !self.status.can_transition_to(new_status) {
            return Err(SettleError::InvalidTimesheetStatusTransition {
                from: self.status.name().to_string(),
                to: new_status.name().to_string(),
            });
        }
        self.status = new_status;
        Ok(())
    }

    pub fn approve(&mut self) -> SettleResult<()> {
        self.transition_to(TimesheetStatus::Approved)?;
        self.approved_at = Some(Utc::now());
        Ok(())
    }

    /// Payroll run recorded; terminal
    pub fn mark_paid(&mut self) -> SettleResult<()> {
        self.transition_to(TimesheetStatus::Paid)?;
        self.paid_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_timesheet() -> Timesheet {
        Timesheet::new(
            ContractId::new("ct_1"),
            UserId::new("eng_1"),
            "2025-W12",
            Decimal::from(5),
        )
    }

    #[test]
    fn test_forward_path() {
        let mut ts = create_test_timesheet();
        assert_eq!(ts.status, TimesheetStatus::Submitted);

        ts.approve().unwrap();
        assert_eq!(ts.status, TimesheetStatus::Approved);
        assert!(ts.approved_at.is_some());

        ts.mark_paid().unwrap();
        assert_eq!(ts.status, TimesheetStatus::Paid);
        assert!(ts.status.is_terminal());
    }

    #[test]
    fn test_double_approval_rejected() {
        let mut ts = create_test_timesheet();
        ts.approve().unwrap();
        assert!(ts.approve().is_err());
    }

    #[test]
    fn test_paid_requires_approval() {
        let mut ts = create_test_timesheet();
        let err = ts.mark_paid().unwrap_err();
        assert_eq!(
            err,
            SettleError::InvalidTimesheetStatusTransition {
                from: "submitted".to_string(),
                to: "paid".to_string(),
            }
        );
    }
}
