//! Contract & Escrow Settlement Engine - Service Layer
//!
//! Async persistence and orchestration over the `settle-core` state
//! machines. It provides:
//! - **Repositories**: async traits for contracts, profiles, the ledger,
//!   and conversation history
//! - **In-memory store**: a shared-state implementation of every repository
//!   behind one handle, used in tests and single-process deployments
//! - **Collaborator ports**: e-signature and notification traits with mock
//!   and recording implementations
//! - **Settlement service**: the orchestration facade that serializes work
//!   per aggregate, runs the core operations, appends ledger effects, and
//!   fans out notifications
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │        SettlementService (this crate)           │
//! │  per-aggregate locks, repositories, ports       │
//! ├─────────────────────────────────────────────────┤
//! │                 settle-core                     │
//! │  (contracts, escrow, payroll, ledger, tiers)    │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use settle_store::{MemoryStore, NoopNotificationSink, MockSignatureProvider, SettlementService, UserId};
//!
//! async fn example() {
//!     let service = SettlementService::with_memory_store(
//!         MemoryStore::new(),
//!         Arc::new(MockSignatureProvider::new()),
//!         Arc::new(NoopNotificationSink),
//!     );
//!     let balance = service.balance_for(&UserId::new("eng_1")).await;
//! }
//! ```

pub mod memory;
pub mod ports;
pub mod repos;
pub mod service;
pub mod telemetry;

// Re-export main types
pub use memory::{MemoryStore, StoreStats};
pub use ports::{
    ESignatureProvider, FailingNotificationSink, MockSignatureProvider, NoopNotificationSink,
    NotificationKind, NotificationSink, RecordedNotification, RecordingNotificationSink,
};
pub use repos::{ContractRepository, ConversationRepository, LedgerRepository, ProfileRepository};
pub use service::{CreateContractRequest, SettlementService};
pub use telemetry::{init_logging, LogConfig, LogFormat};

// Re-export settle-core for convenience
pub use settle_core::{
    Contract, ContractId, EngineerProfile, SettleError, SettleResult, Transaction, TransactionId,
    UserId,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
