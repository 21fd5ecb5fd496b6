//! Settlement Error Code Registry
//!
//! Error code format: SETTLE-{module}-{sequence}
//! - SETTLE-CONTRACT: Contract lifecycle and signature errors
//! - SETTLE-ESCROW: Milestone escrow errors
//! - SETTLE-TIME: Timesheet payroll errors
//! - SETTLE-LEDGER: Transaction ledger errors
//! - SETTLE-SUB: Subscription and security-net errors

use thiserror::Error;

/// Settlement Result type
pub type SettleResult<T> = Result<T, SettleError>;

/// Settlement Error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettleError {
    // ============================================================
    // Contract Errors (SETTLE-CONTRACT-*)
    // ============================================================
    /// [SETTLE-CONTRACT-001] Contract not found
    #[error("[SETTLE-CONTRACT-001] Contract {contract_id} not found")]
    ContractNotFound { contract_id: String },

    /// [SETTLE-CONTRACT-002] Invalid contract status transition
    #[error("[SETTLE-CONTRACT-002] Invalid contract status transition: {from} -> {to}")]
    InvalidContractStatusTransition { from: String, to: String },

    /// [SETTLE-CONTRACT-003] Countersignature before engineer signature
    #[error("[SETTLE-CONTRACT-003] Company countersignature requires an engineer signature first")]
    SignatureOutOfOrder,

    /// [SETTLE-CONTRACT-004] Party has already signed
    #[error("[SETTLE-CONTRACT-004] Contract already carries a {role} signature")]
    AlreadySigned { role: String },

    /// [SETTLE-CONTRACT-005] Contract is not active
    #[error("[SETTLE-CONTRACT-005] Contract {contract_id} is not active (status: {status})")]
    ContractNotActive { contract_id: String, status: String },

    /// [SETTLE-CONTRACT-006] Operation not defined for this contract type
    #[error("[SETTLE-CONTRACT-006] Operation requires a {expected} contract, got {actual}")]
    WrongContractType { expected: String, actual: String },

    // ============================================================
    // Milestone Escrow Errors (SETTLE-ESCROW-*)
    // ============================================================
    /// [SETTLE-ESCROW-001] Milestone not found
    #[error("[SETTLE-ESCROW-001] Milestone {milestone_id} not found")]
    MilestoneNotFound { milestone_id: String },

    /// [SETTLE-ESCROW-002] Invalid milestone status transition
    #[error("[SETTLE-ESCROW-002] Invalid milestone status transition: {from} -> {to}")]
    InvalidMilestoneStatusTransition { from: String, to: String },

    // ============================================================
    // Timesheet Errors (SETTLE-TIME-*)
    // ============================================================
    /// [SETTLE-TIME-001] Timesheet not found
    #[error("[SETTLE-TIME-001] Timesheet {timesheet_id} not found")]
    TimesheetNotFound { timesheet_id: String },

    /// [SETTLE-TIME-002] Invalid timesheet status transition
    #[error("[SETTLE-TIME-002] Invalid timesheet status transition: {from} -> {to}")]
    InvalidTimesheetStatusTransition { from: String, to: String },

    // ============================================================
    // Ledger Errors (SETTLE-LEDGER-*)
    // ============================================================
    /// [SETTLE-LEDGER-001] Amount sign does not match transaction type
    #[error("[SETTLE-LEDGER-001] Amount {amount} has the wrong sign for transaction type {tx_type}")]
    AmountSignMismatch {
        tx_type: String,
        amount: rust_decimal::Decimal,
    },

    /// [SETTLE-LEDGER-002] Settlement pair does not reconcile
    #[error("[SETTLE-LEDGER-002] Settlement pair does not reconcile: payout {payout} + fee {fee} != gross {gross}")]
    SettlementPairMismatch {
        gross: rust_decimal::Decimal,
        payout: rust_decimal::Decimal,
        fee: rust_decimal::Decimal,
    },

    /// [SETTLE-LEDGER-003] Duplicate transaction id
    #[error("[SETTLE-LEDGER-003] Transaction {transaction_id} already appended")]
    DuplicateTransaction { transaction_id: String },

    // ============================================================
    // Subscription Errors (SETTLE-SUB-*)
    // ============================================================
    /// [SETTLE-SUB-001] Engineer profile not found
    #[error("[SETTLE-SUB-001] Engineer profile {engineer_id} not found")]
    ProfileNotFound { engineer_id: String },

    /// [SETTLE-SUB-002] Tier has no purchase price
    #[error("[SETTLE-SUB-002] Tier {tier} is not purchasable")]
    TierNotPurchasable { tier: String },

    /// [SETTLE-SUB-003] Security net claim denied
    #[error("[SETTLE-SUB-003] Security net claim denied: {reason}")]
    SecurityNetDenied { reason: SecurityNetDenial },

    /// [SETTLE-SUB-004] Invalid profile status transition
    #[error("[SETTLE-SUB-004] Invalid profile status transition: {from} -> {to}")]
    InvalidProfileStatusTransition { from: String, to: String },

    // ============================================================
    // General Errors
    // ============================================================
    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Invalid state
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    /// Invalid amount
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Actor role not permitted
    #[error("Role {role} is not permitted to {action}")]
    RoleNotPermitted { role: String, action: String },

    /// Invariant violation
    #[error("Invariant violation: {invariant} - {details}")]
    InvariantViolation { invariant: String, details: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Reason codes for a rejected security-net claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityNetDenial {
    /// The benefit is reserved for paid tiers
    BasicTierExcluded,
    /// All three credits have been used
    CreditsExhausted,
    /// A conversation with a company participant already exists
    CompanyContactRecorded,
}

impl SecurityNetDenial {
    pub fn code(&self) -> &'static str {
        match self {
            SecurityNetDenial::BasicTierExcluded => "basic_tier_excluded",
            SecurityNetDenial::CreditsExhausted => "credits_exhausted",
            SecurityNetDenial::CompanyContactRecorded => "company_contact_recorded",
        }
    }
}

impl std::fmt::Display for SecurityNetDenial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Coarse error category, used by callers to decide how a failure surfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidStateTransition,
    EligibilityDenied,
    Validation,
    InvariantViolation,
    Internal,
}

impl SettleError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SettleError::ContractNotFound { .. }
            | SettleError::MilestoneNotFound { .. }
            | SettleError::TimesheetNotFound { .. }
            | SettleError::ProfileNotFound { .. }
            | SettleError::NotFound { .. } => ErrorKind::NotFound,
            SettleError::InvalidContractStatusTransition { .. }
            | SettleError::SignatureOutOfOrder
            | SettleError::AlreadySigned { .. }
            | SettleError::ContractNotActive { .. }
            | SettleError::InvalidMilestoneStatusTransition { .. }
            | SettleError::InvalidTimesheetStatusTransition { .. }
            | SettleError::InvalidProfileStatusTransition { .. }
            | SettleError::InvalidState { .. } => ErrorKind::InvalidStateTransition,
            SettleError::SecurityNetDenied { .. } => ErrorKind::EligibilityDenied,
            SettleError::WrongContractType { .. }
            | SettleError::AmountSignMismatch { .. }
            | SettleError::DuplicateTransaction { .. }
            | SettleError::TierNotPurchasable { .. }
            | SettleError::InvalidAmount { .. }
            | SettleError::RoleNotPermitted { .. } => ErrorKind::Validation,
            SettleError::SettlementPairMismatch { .. }
            | SettleError::InvariantViolation { .. } => ErrorKind::InvariantViolation,
            SettleError::SerializationError(_) => ErrorKind::Internal,
        }
    }

    /// True when the failure is expected user-facing feedback rather than a bug
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::EligibilityDenied | ErrorKind::Validation
        )
    }

    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        SettleError::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        }
    }

    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        SettleError::InvalidAmount {
            reason: reason.into(),
        }
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        SettleError::InvalidState {
            reason: reason.into(),
        }
    }

    pub fn role_not_permitted(role: impl Into<String>, action: &str) -> Self {
        SettleError::RoleNotPermitted {
            role: role.into(),
            action: action.to_string(),
        }
    }

    pub fn invariant(invariant: &str, details: impl Into<String>) -> Self {
        SettleError::InvariantViolation {
            invariant: invariant.to_string(),
            details: details.into(),
        }
    }
}

impl From<serde_json::Error> for SettleError {
    fn from(err: serde_json::Error) -> Self {
        SettleError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = SettleError::ContractNotFound {
            contract_id: "ct_1".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!err.is_recoverable());

        let err = SettleError::SecurityNetDenied {
            reason: SecurityNetDenial::CreditsExhausted,
        };
        assert_eq!(err.kind(), ErrorKind::EligibilityDenied);
        assert!(err.is_recoverable());

        let err = SettleError::SignatureOutOfOrder;
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
    }

    #[test]
    fn test_error_codes_in_messages() {
        let err = SettleError::InvalidMilestoneStatusTransition {
            from: "awaiting_funding".to_string(),
            to: "completed_paid".to_string(),
        };
        assert!(err.to_string().contains("[SETTLE-ESCROW-002]"));

        let err = SettleError::SecurityNetDenied {
            reason: SecurityNetDenial::BasicTierExcluded,
        };
        assert!(err.to_string().contains("basic_tier_excluded"));
    }
}
