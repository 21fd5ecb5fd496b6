//! Settlement Service
//!
//! The orchestration layer over the repositories and the core engines.
//! Every mutation follows the same order: serialize on the aggregate's lock,
//! load, run the synchronous core operation, append any ledger effect, save
//! the aggregate, then notify. Collaborator calls are spawned and never roll
//! back a committed transition. The ledger append lands before the aggregate
//! save; a save that fails afterwards surfaces the error while the appended
//! entries stand (see the write-ordering contract in `repos`).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use settle_core::{
    ActorRole, Contract, ContractId, ContractType, Currency, EngineerProfile, JobId, MilestoneId,
    SecurityNetGrant, SettleError, SettleResult, SettlementAuditor, SettlementSummary, SignOutcome,
    SubscriptionEngine, SubscriptionTier, TimesheetId, Transaction, TransactionId, TransactionType,
    UserId,
};

use crate::memory::MemoryStore;
use crate::ports::{ESignatureProvider, NotificationKind, NotificationSink};
use crate::repos::{
    ContractRepository, ConversationRepository, LedgerRepository, ProfileRepository,
};

fn contract_key(contract_id: &ContractId) -> String {
    format!("contract:{}", contract_id.as_str())
}

fn profile_key(engineer_id: &UserId) -> String {
    format!("profile:{}", engineer_id.as_str())
}

/// Per-aggregate lock registry
///
/// Serializes read-modify-write sequences on a single contract or profile.
/// Locks are created on first use and live for the aggregate's lifetime.
struct AggregateLocks {
    inner: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl AggregateLocks {
    fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.inner.read().await;
            if let Some(lock) = locks.get(key) {
                return lock.clone();
            }
        }
        let mut locks = self.inner.write().await;
        locks.entry(key.to_string()).or_default().clone()
    }
}

/// Inputs for drafting a new contract
#[derive(Clone, Debug)]
pub struct CreateContractRequest {
    /// Role the drafting actor holds
    pub actor: ActorRole,
    /// Job the engagement is for
    pub job_id: JobId,
    /// Paying party
    pub company_id: UserId,
    /// Working party
    pub engineer_id: UserId,
    /// Milestone-based or day-rate engagement
    pub contract_type: ContractType,
    /// Free-text scope description
    pub description: String,
    /// Fixed total (statement of work) or day rate (day rate)
    pub amount: Decimal,
    /// Contract currency
    pub currency: Currency,
}

/// Settlement Service
///
/// Orchestrates contract, escrow, payroll, and subscription operations over
/// the repositories. State machines and money arithmetic live in
/// `settle-core`; this layer adds persistence, per-aggregate serialization,
/// logging, and the external collaborator calls.
pub struct SettlementService {
    /// Contract aggregates
    contracts: Arc<dyn ContractRepository>,
    /// Engineer profiles
    profiles: Arc<dyn ProfileRepository>,
    /// Append-only transaction ledger
    ledger: Arc<dyn LedgerRepository>,
    /// Conversation history, read-only eligibility signal
    conversations: Arc<dyn ConversationRepository>,
    /// E-signature collaborator
    esign: Arc<dyn ESignatureProvider>,
    /// Notification collaborator
    notifier: Arc<dyn NotificationSink>,
    /// Subscription state engine
    subscription: SubscriptionEngine,
    /// Settlement audit engine
    auditor: SettlementAuditor,
    /// Per-aggregate write locks
    locks: AggregateLocks,
}

impl SettlementService {
    /// Create a new settlement service over explicit repositories
    pub fn new(
        contracts: Arc<dyn ContractRepository>,
        profiles: Arc<dyn ProfileRepository>,
        ledger: Arc<dyn LedgerRepository>,
        conversations: Arc<dyn ConversationRepository>,
        esign: Arc<dyn ESignatureProvider>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            contracts,
            profiles,
            ledger,
            conversations,
            esign,
            notifier,
            subscription: SubscriptionEngine::new(),
            auditor: SettlementAuditor::new(),
            locks: AggregateLocks::new(),
        }
    }

    /// Wire every repository to one shared in-memory store
    pub fn with_memory_store(
        store: MemoryStore,
        esign: Arc<dyn ESignatureProvider>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let store = Arc::new(store);
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            esign,
            notifier,
        )
    }

    fn spawn_notify(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        text: String,
        link: Option<String>,
    ) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(err) = notifier.notify(&user_id, kind, &text, link.as_deref()).await {
                warn!("Notification {} to {} failed: {}", kind, user_id, err);
            }
        });
    }

    fn spawn_signature_request(&self, contract_id: ContractId, engineer_email: Option<String>) {
        let esign = Arc::clone(&self.esign);
        tokio::spawn(async move {
            match engineer_email {
                Some(email) => {
                    match esign.create_signature_request(&contract_id, &email).await {
                        Ok(request_id) => info!(
                            "Signature request {} opened for contract {}",
                            request_id, contract_id
                        ),
                        Err(err) => warn!(
                            "Signature request for contract {} failed: {}",
                            contract_id, err
                        ),
                    }
                }
                None => warn!(
                    "No profile on record for the engineer on contract {}; signature request skipped",
                    contract_id
                ),
            }
        });
    }

    /// Draft a new contract. Drafting is a company-side action; the amount
    /// must be positive.
    pub async fn create_contract(&self, request: CreateContractRequest) -> SettleResult<Contract> {
        if !request.actor.is_company_side() {
            return Err(SettleError::role_not_permitted(
                request.actor.name(),
                "draft contracts",
            ));
        }
        if request.amount <= Decimal::ZERO {
            return Err(SettleError::invalid_amount(format!(
                "contract amount must be positive, got {}",
                request.amount
            )));
        }

        let contract = Contract::new(
            request.job_id,
            request.company_id,
            request.engineer_id,
            request.contract_type,
            request.description,
            request.amount,
            request.currency,
        );
        let contract = self.contracts.upsert(contract).await?;
        info!(
            "Contract {} drafted for job {} between {} and {}",
            contract.contract_id,
            contract.job_id.as_str(),
            contract.company_id,
            contract.engineer_id
        );
        Ok(contract)
    }

    /// Attach a milestone to a contract still in Draft
    pub async fn add_milestone(
        &self,
        contract_id: &ContractId,
        description: &str,
        amount: Decimal,
    ) -> SettleResult<MilestoneId> {
        let lock = self.locks.lock_for(&contract_key(contract_id)).await;
        let _guard = lock.lock().await;

        let mut contract = self.contracts.get_required(contract_id).await?;
        let milestone_id = contract.draft_milestone(description, amount)?;
        self.contracts.upsert(contract).await?;

        info!(
            "Milestone {} drafted on contract {}",
            milestone_id, contract_id
        );
        Ok(milestone_id)
    }

    /// Send a contract out for signing. The e-signature request and the
    /// engineer notification ride behind the status change; neither can roll
    /// it back.
    pub async fn send_for_signature(&self, contract_id: &ContractId) -> SettleResult<Contract> {
        let lock = self.locks.lock_for(&contract_key(contract_id)).await;
        let _guard = lock.lock().await;

        let mut contract = self.contracts.get_required(contract_id).await?;
        contract.mark_sent_for_signature()?;
        let contract = self.contracts.upsert(contract).await?;

        let engineer_email = self
            .profiles
            .get(&contract.engineer_id)
            .await
            .ok()
            .flatten()
            .map(|p| p.contact_email);
        self.spawn_signature_request(contract.contract_id.clone(), engineer_email);
        self.spawn_notify(
            contract.engineer_id.clone(),
            NotificationKind::ContractReadyToSign,
            format!(
                "Contract {} is ready for your signature",
                contract.contract_id
            ),
            Some(format!("/contracts/{}", contract.contract_id)),
        );

        info!("Contract {} sent for signature", contract.contract_id);
        Ok(contract)
    }

    /// Record a signature. The engineer signs first; a company-side
    /// countersignature activates the contract.
    pub async fn sign_contract(
        &self,
        contract_id: &ContractId,
        actor: ActorRole,
        signer_name: &str,
    ) -> SettleResult<(Contract, SignOutcome)> {
        let lock = self.locks.lock_for(&contract_key(contract_id)).await;
        let _guard = lock.lock().await;

        let mut contract = self.contracts.get_required(contract_id).await?;
        let outcome = contract.sign(actor, signer_name)?;
        let contract = self.contracts.upsert(contract).await?;

        match outcome {
            SignOutcome::EngineerSigned => {
                info!(
                    "Engineer signature recorded on contract {}",
                    contract.contract_id
                );
                self.spawn_notify(
                    contract.company_id.clone(),
                    NotificationKind::ContractSigned,
                    format!("{} signed contract {}", signer_name, contract.contract_id),
                    Some(format!("/contracts/{}", contract.contract_id)),
                );
            }
            SignOutcome::ContractActivated => {
                info!("Contract {} fully signed and active", contract.contract_id);
                self.spawn_notify(
                    contract.engineer_id.clone(),
                    NotificationKind::ContractActivated,
                    format!("Contract {} is now active", contract.contract_id),
                    Some(format!("/contracts/{}", contract.contract_id)),
                );
            }
        }
        Ok((contract, outcome))
    }

    /// Close out an active contract
    pub async fn complete_contract(&self, contract_id: &ContractId) -> SettleResult<Contract> {
        let lock = self.locks.lock_for(&contract_key(contract_id)).await;
        let _guard = lock.lock().await;

        let mut contract = self.contracts.get_required(contract_id).await?;
        contract.complete()?;
        let contract = self.contracts.upsert(contract).await?;
        info!("Contract {} completed", contract.contract_id);
        Ok(contract)
    }

    /// Cancel a contract that has not completed
    pub async fn cancel_contract(&self, contract_id: &ContractId) -> SettleResult<Contract> {
        let lock = self.locks.lock_for(&contract_key(contract_id)).await;
        let _guard = lock.lock().await;

        let mut contract = self.contracts.get_required(contract_id).await?;
        contract.cancel()?;
        let contract = self.contracts.upsert(contract).await?;
        info!("Contract {} cancelled", contract.contract_id);
        Ok(contract)
    }

    /// Fund a milestone into escrow. The escrow debit lands in the ledger
    /// before the aggregate is saved; a refused append leaves the stored
    /// contract untouched.
    pub async fn fund_milestone(
        &self,
        contract_id: &ContractId,
        milestone_id: &MilestoneId,
        payer_id: &UserId,
    ) -> SettleResult<TransactionId> {
        let lock = self.locks.lock_for(&contract_key(contract_id)).await;
        let _guard = lock.lock().await;

        let mut contract = self.contracts.get_required(contract_id).await?;
        let funding = contract.fund_milestone(milestone_id, payer_id)?;
        let tx_id = self.ledger.append(funding).await?;
        self.contracts.upsert(contract).await?;

        info!(
            "Milestone {} funded on contract {}; escrow debit {}",
            milestone_id, contract_id, tx_id
        );
        Ok(tx_id)
    }

    /// Move a funded milestone to the approval queue
    pub async fn submit_milestone_for_approval(
        &self,
        contract_id: &ContractId,
        milestone_id: &MilestoneId,
    ) -> SettleResult<Contract> {
        let lock = self.locks.lock_for(&contract_key(contract_id)).await;
        let _guard = lock.lock().await;

        let mut contract = self.contracts.get_required(contract_id).await?;
        contract.submit_milestone_for_approval(milestone_id)?;
        let contract = self.contracts.upsert(contract).await?;

        info!(
            "Milestone {} submitted for approval on contract {}",
            milestone_id, contract_id
        );
        Ok(contract)
    }

    /// Approve a submitted milestone: the payout and platform fee land as
    /// one atomic pair and the milestone reaches its terminal paid state.
    pub async fn approve_milestone_payout(
        &self,
        contract_id: &ContractId,
        milestone_id: &MilestoneId,
    ) -> SettleResult<(TransactionId, TransactionId)> {
        let lock = self.locks.lock_for(&contract_key(contract_id)).await;
        let _guard = lock.lock().await;

        let mut contract = self.contracts.get_required(contract_id).await?;
        let emission = contract.approve_milestone_payout(milestone_id)?;
        let payout_amount = emission.payout.amount;
        let engineer_id = contract.engineer_id.clone();

        let (payout_id, fee_id) = self.ledger.append_settlement(emission).await?;
        self.contracts.upsert(contract).await?;

        self.spawn_notify(
            engineer_id,
            NotificationKind::PayoutSettled,
            format!(
                "Payout of {} settled for contract {}",
                payout_amount, contract_id
            ),
            Some(format!("/contracts/{}", contract_id)),
        );
        info!(
            "Milestone {} settled on contract {}: payout {}, fee {}",
            milestone_id, contract_id, payout_id, fee_id
        );
        Ok((payout_id, fee_id))
    }

    /// Submit a timesheet against an active day-rate contract. Only the
    /// contract's engineer may submit.
    pub async fn submit_timesheet(
        &self,
        contract_id: &ContractId,
        engineer_id: &UserId,
        period: &str,
        days_worked: Decimal,
    ) -> SettleResult<TimesheetId> {
        let lock = self.locks.lock_for(&contract_key(contract_id)).await;
        let _guard = lock.lock().await;

        let mut contract = self.contracts.get_required(contract_id).await?;
        if engineer_id != &contract.engineer_id {
            return Err(SettleError::role_not_permitted(
                "engineer",
                "submit timesheets on another engineer's contract",
            ));
        }
        let timesheet_id = contract.submit_timesheet(period, days_worked)?;
        self.contracts.upsert(contract).await?;

        info!(
            "Timesheet {} submitted on contract {}",
            timesheet_id, contract_id
        );
        Ok(timesheet_id)
    }

    /// Approve a timesheet and settle it: gross = day rate x days worked,
    /// emitted as the same atomic payout + fee pair as milestone approval.
    pub async fn approve_timesheet(
        &self,
        contract_id: &ContractId,
        timesheet_id: &TimesheetId,
    ) -> SettleResult<(TransactionId, TransactionId)> {
        let lock = self.locks.lock_for(&contract_key(contract_id)).await;
        let _guard = lock.lock().await;

        let mut contract = self.contracts.get_required(contract_id).await?;
        let emission = contract.approve_timesheet(timesheet_id)?;
        let payout_amount = emission.payout.amount;
        let engineer_id = contract.engineer_id.clone();

        let (payout_id, fee_id) = self.ledger.append_settlement(emission).await?;
        self.contracts.upsert(contract).await?;

        self.spawn_notify(
            engineer_id,
            NotificationKind::PayoutSettled,
            format!(
                "Payout of {} settled for contract {}",
                payout_amount, contract_id
            ),
            Some(format!("/contracts/{}", contract_id)),
        );
        info!(
            "Timesheet {} settled on contract {}: payout {}, fee {}",
            timesheet_id, contract_id, payout_id, fee_id
        );
        Ok((payout_id, fee_id))
    }

    /// Record the payroll run for an approved timesheet. Settlement already
    /// happened at approval; this is the administrative terminal step.
    pub async fn mark_timesheet_paid(
        &self,
        contract_id: &ContractId,
        timesheet_id: &TimesheetId,
    ) -> SettleResult<Contract> {
        let lock = self.locks.lock_for(&contract_key(contract_id)).await;
        let _guard = lock.lock().await;

        let mut contract = self.contracts.get_required(contract_id).await?;
        contract.mark_timesheet_paid(timesheet_id)?;
        let contract = self.contracts.upsert(contract).await?;

        info!(
            "Timesheet {} marked paid on contract {}",
            timesheet_id, contract_id
        );
        Ok(contract)
    }

    /// Register a new engineer profile
    pub async fn register_engineer(
        &self,
        engineer_id: UserId,
        display_name: &str,
        contact_email: &str,
    ) -> SettleResult<EngineerProfile> {
        let lock = self.locks.lock_for(&profile_key(&engineer_id)).await;
        let _guard = lock.lock().await;

        if self.profiles.get(&engineer_id).await?.is_some() {
            return Err(SettleError::invalid_state(format!(
                "Engineer profile {} already registered",
                engineer_id
            )));
        }
        let profile = EngineerProfile::new(engineer_id, display_name, contact_email);
        let profile = self.profiles.upsert(profile).await?;
        info!("Engineer profile {} registered", profile.engineer_id);
        Ok(profile)
    }

    /// Grant a free trial of a paid tier
    pub async fn start_trial(
        &self,
        engineer_id: &UserId,
        tier: SubscriptionTier,
        days: i64,
    ) -> SettleResult<EngineerProfile> {
        let lock = self.locks.lock_for(&profile_key(engineer_id)).await;
        let _guard = lock.lock().await;

        let mut profile = self.profiles.get_required(engineer_id).await?;
        let trial_end = self
            .subscription
            .start_trial(&mut profile, tier, days, Utc::now())?;
        let profile = self.profiles.upsert(profile).await?;
        info!(
            "Trial of {} started for {} until {}",
            tier, engineer_id, trial_end
        );
        Ok(profile)
    }

    /// Login-time trial check: downgrade to Basic when the trial ran out.
    /// Returns whether anything changed.
    pub async fn check_trial_expiry(&self, engineer_id: &UserId) -> SettleResult<bool> {
        let lock = self.locks.lock_for(&profile_key(engineer_id)).await;
        let _guard = lock.lock().await;

        let mut profile = self.profiles.get_required(engineer_id).await?;
        let downgraded = self.subscription.check_trial_expiry(&mut profile, Utc::now());
        if downgraded {
            self.profiles.upsert(profile).await?;
            info!("Trial expired for {}; tier downgraded to basic", engineer_id);
        }
        Ok(downgraded)
    }

    /// Purchase a paid tier. The monthly charge is appended against the
    /// engineer before the profile is saved.
    pub async fn upgrade_subscription(
        &self,
        engineer_id: &UserId,
        to_tier: SubscriptionTier,
    ) -> SettleResult<EngineerProfile> {
        let lock = self.locks.lock_for(&profile_key(engineer_id)).await;
        let _guard = lock.lock().await;

        let mut profile = self.profiles.get_required(engineer_id).await?;
        let charge = self.subscription.upgrade(&mut profile, to_tier, Utc::now())?;
        let charge_id = self.ledger.append(charge).await?;
        let profile = self.profiles.upsert(profile).await?;

        info!(
            "Subscription {} purchased by {}; charge {}",
            to_tier, engineer_id, charge_id
        );
        Ok(profile)
    }

    /// Claim one security-net credit. The guard chain runs against the
    /// engineer's conversation history; a granted claim extends the
    /// subscription and may deactivate the profile on the final credit.
    pub async fn claim_security_net(&self, engineer_id: &UserId) -> SettleResult<SecurityNetGrant> {
        let lock = self.locks.lock_for(&profile_key(engineer_id)).await;
        let _guard = lock.lock().await;

        let mut profile = self.profiles.get_required(engineer_id).await?;
        let conversations = self.conversations.list_for_user(engineer_id).await?;
        let grant = self
            .subscription
            .claim_security_net(&mut profile, &conversations, Utc::now())?;
        self.profiles.upsert(profile).await?;

        info!(
            "Security net credit {} consumed by {}; subscription extended to {}",
            grant.credits_used, engineer_id, grant.subscription_end_date
        );
        if grant.deactivated {
            info!(
                "Profile {} deactivated after final security net credit",
                engineer_id
            );
        }
        Ok(grant)
    }

    /// Bring an inactive profile back into search results
    pub async fn reactivate_profile(&self, engineer_id: &UserId) -> SettleResult<EngineerProfile> {
        let lock = self.locks.lock_for(&profile_key(engineer_id)).await;
        let _guard = lock.lock().await;

        let mut profile = self.profiles.get_required(engineer_id).await?;
        self.subscription.reactivate(&mut profile)?;
        let profile = self.profiles.upsert(profile).await?;
        info!("Profile {} reactivated", engineer_id);
        Ok(profile)
    }

    /// Record a profile boost purchase as a ledger debit
    pub async fn record_boost_purchase(
        &self,
        engineer_id: &UserId,
        amount: Decimal,
        description: &str,
    ) -> SettleResult<TransactionId> {
        if amount <= Decimal::ZERO {
            return Err(SettleError::invalid_amount(format!(
                "boost purchase amount must be positive, got {}",
                amount
            )));
        }
        let tx = Transaction::new(
            engineer_id.clone(),
            TransactionType::BoostPurchase,
            -amount,
            description,
        );
        let tx_id = self.ledger.append(tx).await?;
        info!("Boost purchase {} recorded for {}", tx_id, engineer_id);
        Ok(tx_id)
    }

    /// Record ad revenue sharing as a ledger credit
    pub async fn record_ad_revenue(
        &self,
        user_id: &UserId,
        amount: Decimal,
        description: &str,
    ) -> SettleResult<TransactionId> {
        if amount <= Decimal::ZERO {
            return Err(SettleError::invalid_amount(format!(
                "ad revenue amount must be positive, got {}",
                amount
            )));
        }
        let tx = Transaction::new(
            user_id.clone(),
            TransactionType::AdRevenue,
            amount,
            description,
        );
        let tx_id = self.ledger.append(tx).await?;
        info!("Ad revenue {} recorded for {}", tx_id, user_id);
        Ok(tx_id)
    }

    /// Get a contract with its milestones and timesheets
    pub async fn get_contract(&self, contract_id: &ContractId) -> SettleResult<Contract> {
        self.contracts.get_required(contract_id).await
    }

    /// Contracts where the given user is the company party, newest first
    pub async fn contracts_for_company(&self, company_id: &UserId) -> SettleResult<Vec<Contract>> {
        self.contracts.list_for_company(company_id).await
    }

    /// Contracts where the given user is the engineer party, newest first
    pub async fn contracts_for_engineer(
        &self,
        engineer_id: &UserId,
    ) -> SettleResult<Vec<Contract>> {
        self.contracts.list_for_engineer(engineer_id).await
    }

    /// Get an engineer profile
    pub async fn get_profile(&self, engineer_id: &UserId) -> SettleResult<EngineerProfile> {
        self.profiles.get_required(engineer_id).await
    }

    /// Net ledger balance for a user
    pub async fn balance_for(&self, user_id: &UserId) -> SettleResult<Decimal> {
        self.ledger.balance_for(user_id).await
    }

    /// Ledger entries affecting a user, newest first
    pub async fn statement_for(&self, user_id: &UserId) -> SettleResult<Vec<Transaction>> {
        self.ledger.entries_for_user(user_id).await
    }

    /// Ledger entries referencing a contract, newest first
    pub async fn transactions_for_contract(
        &self,
        contract_id: &ContractId,
    ) -> SettleResult<Vec<Transaction>> {
        self.ledger.entries_for_contract(contract_id).await
    }

    /// Reconcile a contract against its ledger entries
    pub async fn settlement_summary(
        &self,
        contract_id: &ContractId,
    ) -> SettleResult<SettlementSummary> {
        let contract = self.contracts.get_required(contract_id).await?;
        let entries = self.ledger.entries_for_contract(contract_id).await?;
        Ok(self.auditor.summarize(&contract, &entries))
    }

    /// Reconcile a contract and fail on any drift between the aggregate and
    /// the ledger
    pub async fn verify_settlement(
        &self,
        contract_id: &ContractId,
    ) -> SettleResult<SettlementSummary> {
        let contract = self.contracts.get_required(contract_id).await?;
        let entries = self.ledger.entries_for_contract(contract_id).await?;
        self.auditor.verify(&contract, &entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MockSignatureProvider, RecordingNotificationSink};

    fn create_test_service() -> SettlementService {
        SettlementService::with_memory_store(
            MemoryStore::new(),
            Arc::new(MockSignatureProvider::new()),
            Arc::new(RecordingNotificationSink::new()),
        )
    }

    fn create_test_request() -> CreateContractRequest {
        CreateContractRequest {
            actor: ActorRole::Company,
            job_id: JobId::new("job_1"),
            company_id: UserId::new("com_1"),
            engineer_id: UserId::new("eng_1"),
            contract_type: ContractType::StatementOfWork,
            description: "Search service rebuild".to_string(),
            amount: Decimal::from(5000),
            currency: Currency::Usd,
        }
    }

    #[tokio::test]
    async fn test_create_contract_requires_company_side_actor() {
        let service = create_test_service();
        let mut request = create_test_request();
        request.actor = ActorRole::Engineer;

        let err = service.create_contract(request).await.unwrap_err();
        assert_eq!(
            err,
            SettleError::role_not_permitted("engineer", "draft contracts")
        );
    }

    #[tokio::test]
    async fn test_create_contract_rejects_non_positive_amount() {
        let service = create_test_service();
        let mut request = create_test_request();
        request.amount = Decimal::ZERO;

        assert!(service.create_contract(request).await.is_err());
    }

    #[tokio::test]
    async fn test_register_twice_rejected() {
        let service = create_test_service();
        service
            .register_engineer(UserId::new("eng_1"), "Ada Lovelace", "ada@example.com")
            .await
            .unwrap();

        let err = service
            .register_engineer(UserId::new("eng_1"), "Ada Lovelace", "ada@example.com")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[tokio::test]
    async fn test_submit_timesheet_checks_engineer_identity() {
        let service = create_test_service();
        let mut request = create_test_request();
        request.contract_type = ContractType::DayRate;
        request.amount = Decimal::from(600);
        let contract = service.create_contract(request).await.unwrap();
        let contract_id = contract.contract_id.clone();

        service.send_for_signature(&contract_id).await.unwrap();
        service
            .sign_contract(&contract_id, ActorRole::Engineer, "Ada Lovelace")
            .await
            .unwrap();
        service
            .sign_contract(&contract_id, ActorRole::Company, "Initech Ltd")
            .await
            .unwrap();

        let err = service
            .submit_timesheet(
                &contract_id,
                &UserId::new("eng_2"),
                "2025-W31",
                Decimal::from(5),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SettleError::role_not_permitted(
                "engineer",
                "submit timesheets on another engineer's contract"
            )
        );
    }

    #[tokio::test]
    async fn test_lock_registry_reuses_entries() {
        let locks = AggregateLocks::new();
        let a = locks.lock_for("contract:ct_1").await;
        let b = locks.lock_for("contract:ct_1").await;
        let c = locks.lock_for("contract:ct_2").await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
