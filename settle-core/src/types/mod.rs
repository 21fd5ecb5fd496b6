//! Settlement Core Type Definitions
//!
//! All types follow these naming conventions:
//! - snake_case for field names
//! - *_id suffix for primary keys
//! - status enums expose `name()` for logging and error messages

pub mod common;
pub mod contract;
pub mod conversation;
pub mod milestone;
pub mod subscription;
pub mod timesheet;
pub mod transaction;

// Re-export common types
pub use common::{
    // ID types
    ContractId, ConversationId, JobId, MilestoneId, TimesheetId, TransactionId, UserId,
    // Actor and currency enums
    ActorRole, Currency,
};

// Re-export contract types
pub use contract::{Contract, ContractStatus, ContractType, Signature};

// Re-export milestone types
pub use milestone::{Milestone, MilestoneStatus};

// Re-export timesheet types
pub use timesheet::{Timesheet, TimesheetStatus};

// Re-export ledger entry types
pub use transaction::{AmountDirection, Transaction, TransactionType};

// Re-export subscription types
pub use subscription::{
    EngineerProfile, ProfileStatus, SubscriptionTier, MAX_SECURITY_NET_CREDITS,
    SECURITY_NET_EXTENSION_DAYS, SUBSCRIPTION_PERIOD_DAYS,
};

// Re-export conversation types
pub use conversation::{Conversation, Participant};
