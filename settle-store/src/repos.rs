//! Aggregate Repositories
//!
//! Async storage seams for the settlement aggregates. Every mutation flows
//! through a repository; backends only need interior mutability and these
//! traits, the state machines themselves live in `settle-core`.
//!
//! Write ordering: the service appends ledger effects before saving the
//! mutated aggregate. A fallible backend must surface a failed save and
//! leave any already-appended entries in place: the ledger never rolls
//! back, and the stored aggregate catches up on retry.

use async_trait::async_trait;
use rust_decimal::Decimal;

use settle_core::{
    Contract, ContractId, Conversation, EngineerProfile, SettleError, SettleResult,
    SettlementEmission, Transaction, TransactionId, UserId,
};

/// Contract aggregate repository trait
#[async_trait]
pub trait ContractRepository: Send + Sync {
    /// Create or replace a contract aggregate
    async fn upsert(&self, contract: Contract) -> SettleResult<Contract>;

    /// Get contract by ID
    async fn get(&self, contract_id: &ContractId) -> SettleResult<Option<Contract>>;

    /// Get contract by ID, error if not found
    async fn get_required(&self, contract_id: &ContractId) -> SettleResult<Contract> {
        self.get(contract_id)
            .await?
            .ok_or_else(|| SettleError::ContractNotFound {
                contract_id: contract_id.to_string(),
            })
    }

    /// List contracts where the given user is the company party
    async fn list_for_company(&self, company_id: &UserId) -> SettleResult<Vec<Contract>>;

    /// List contracts where the given user is the engineer party
    async fn list_for_engineer(&self, engineer_id: &UserId) -> SettleResult<Vec<Contract>>;
}

/// Engineer profile repository trait
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Create or replace an engineer profile
    async fn upsert(&self, profile: EngineerProfile) -> SettleResult<EngineerProfile>;

    /// Get profile by engineer ID
    async fn get(&self, engineer_id: &UserId) -> SettleResult<Option<EngineerProfile>>;

    /// Get profile by engineer ID, error if not found
    async fn get_required(&self, engineer_id: &UserId) -> SettleResult<EngineerProfile> {
        self.get(engineer_id)
            .await?
            .ok_or_else(|| SettleError::ProfileNotFound {
                engineer_id: engineer_id.to_string(),
            })
    }
}

/// Transaction ledger repository trait
///
/// Append-only; entries are never updated or deleted. `append_settlement`
/// lands a payout and its platform fee as one unit or not at all.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Append a single transaction
    async fn append(&self, transaction: Transaction) -> SettleResult<TransactionId>;

    /// Append a payout + platform-fee pair atomically
    async fn append_settlement(
        &self,
        emission: SettlementEmission,
    ) -> SettleResult<(TransactionId, TransactionId)>;

    /// Net balance for a user across all entries
    async fn balance_for(&self, user_id: &UserId) -> SettleResult<Decimal>;

    /// Entries affecting a user, newest first
    async fn entries_for_user(&self, user_id: &UserId) -> SettleResult<Vec<Transaction>>;

    /// Entries referencing a contract, newest first
    async fn entries_for_contract(&self, contract_id: &ContractId) -> SettleResult<Vec<Transaction>>;
}

/// Conversation history repository trait
///
/// Read-only eligibility signal for the security-net guard chain; nothing
/// here writes conversations.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Conversations the given user participates in
    async fn list_for_user(&self, user_id: &UserId) -> SettleResult<Vec<Conversation>>;
}
