//! In-Memory Store
//!
//! Single-process implementation of every repository trait, suitable for
//! tests and embedded use. Each collection sits behind its own
//! `tokio::sync::RwLock`; the ledger wraps the core `TransactionLog` so
//! sign checks, duplicate detection, and the atomic settlement pair all
//! happen under one write lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use settle_core::{
    Contract, ContractId, Conversation, ConversationId, EngineerProfile, SettleResult,
    SettlementEmission, Transaction, TransactionId, TransactionLog, UserId,
};

use crate::repos::{
    ContractRepository, ConversationRepository, LedgerRepository, ProfileRepository,
};

/// Store occupancy counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub contracts: usize,
    pub profiles: usize,
    pub conversations: usize,
    pub ledger_entries: usize,
}

/// In-memory store backing all settlement aggregates
#[derive(Clone)]
pub struct MemoryStore {
    /// Contracts by contract ID
    contracts: Arc<RwLock<HashMap<ContractId, Contract>>>,
    /// Profiles by engineer ID
    profiles: Arc<RwLock<HashMap<UserId, EngineerProfile>>>,
    /// Conversations by conversation ID
    conversations: Arc<RwLock<HashMap<ConversationId, Conversation>>>,
    /// Append-only ledger engine
    ledger: Arc<RwLock<TransactionLog>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            contracts: Arc::new(RwLock::new(HashMap::new())),
            profiles: Arc::new(RwLock::new(HashMap::new())),
            conversations: Arc::new(RwLock::new(HashMap::new())),
            ledger: Arc::new(RwLock::new(TransactionLog::new())),
        }
    }

    /// Insert a conversation record. The settlement engine never writes
    /// conversations itself; the embedding application mirrors its messaging
    /// history in here for the eligibility checks.
    pub async fn seed_conversation(&self, conversation: Conversation) {
        self.conversations
            .write()
            .await
            .insert(conversation.conversation_id.clone(), conversation);
    }

    /// Remove all stored data
    pub async fn clear(&self) {
        self.contracts.write().await.clear();
        self.profiles.write().await.clear();
        self.conversations.write().await.clear();
        *self.ledger.write().await = TransactionLog::new();
    }

    /// Current occupancy of each collection
    pub async fn stats(&self) -> StoreStats {
        StoreStats {
            contracts: self.contracts.read().await.len(),
            profiles: self.profiles.read().await.len(),
            conversations: self.conversations.read().await.len(),
            ledger_entries: self.ledger.read().await.len(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContractRepository for MemoryStore {
    async fn upsert(&self, contract: Contract) -> SettleResult<Contract> {
        self.contracts
            .write()
            .await
            .insert(contract.contract_id.clone(), contract.clone());
        Ok(contract)
    }

    async fn get(&self, contract_id: &ContractId) -> SettleResult<Option<Contract>> {
        Ok(self.contracts.read().await.get(contract_id).cloned())
    }

    async fn list_for_company(&self, company_id: &UserId) -> SettleResult<Vec<Contract>> {
        let contracts = self.contracts.read().await;
        let mut matches: Vec<Contract> = contracts
            .values()
            .filter(|c| &c.company_id == company_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }

    async fn list_for_engineer(&self, engineer_id: &UserId) -> SettleResult<Vec<Contract>> {
        let contracts = self.contracts.read().await;
        let mut matches: Vec<Contract> = contracts
            .values()
            .filter(|c| &c.engineer_id == engineer_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn upsert(&self, profile: EngineerProfile) -> SettleResult<EngineerProfile> {
        self.profiles
            .write()
            .await
            .insert(profile.engineer_id.clone(), profile.clone());
        Ok(profile)
    }

    async fn get(&self, engineer_id: &UserId) -> SettleResult<Option<EngineerProfile>> {
        Ok(self.profiles.read().await.get(engineer_id).cloned())
    }
}

#[async_trait]
impl LedgerRepository for MemoryStore {
    async fn append(&self, transaction: Transaction) -> SettleResult<TransactionId> {
        self.ledger.write().await.append(transaction)
    }

    async fn append_settlement(
        &self,
        emission: SettlementEmission,
    ) -> SettleResult<(TransactionId, TransactionId)> {
        self.ledger.write().await.append_settlement(emission)
    }

    async fn balance_for(&self, user_id: &UserId) -> SettleResult<Decimal> {
        Ok(self.ledger.read().await.balance_for(user_id))
    }

    async fn entries_for_user(&self, user_id: &UserId) -> SettleResult<Vec<Transaction>> {
        Ok(self.ledger.read().await.entries_for_user(user_id))
    }

    async fn entries_for_contract(
        &self,
        contract_id: &ContractId,
    ) -> SettleResult<Vec<Transaction>> {
        Ok(self.ledger.read().await.entries_for_contract(contract_id))
    }
}

#[async_trait]
impl ConversationRepository for MemoryStore {
    async fn list_for_user(&self, user_id: &UserId) -> SettleResult<Vec<Conversation>> {
        let conversations = self.conversations.read().await;
        Ok(conversations
            .values()
            .filter(|c| c.involves(user_id))
            .cloned()
            .collect())
    }
}
