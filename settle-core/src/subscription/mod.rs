//! Subscription Engine
//!
//! Tier management for engineer profiles: the login-time trial downgrade,
//! paid upgrades charged through the ledger, the credit-limited
//! security-net benefit, and reactivation.

pub mod gates;

pub use gates::{GateCheckResult, SecurityNetGate};

use chrono::{DateTime, Utc};

use crate::error::SettleResult;
use crate::types::{
    Conversation, EngineerProfile, ProfileStatus, SubscriptionTier, Transaction, TransactionType,
};

/// What a granted security-net claim changed on the profile
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecurityNetGrant {
    pub credits_used: u8,
    pub subscription_end_date: DateTime<Utc>,
    /// The final credit removes the profile from active search
    pub deactivated: bool,
}

/// Subscription engine
pub struct SubscriptionEngine {
    security_net_gate: SecurityNetGate,
}

impl SubscriptionEngine {
    pub fn new() -> Self {
        Self {
            security_net_gate: SecurityNetGate::new(),
        }
    }

    pub fn security_net_gate(&self) -> &SecurityNetGate {
        &self.security_net_gate
    }

    /// Login-time downgrade guard. Idempotent; returns whether the profile
    /// changed.
    pub fn check_trial_expiry(&self, profile: &mut EngineerProfile, now: DateTime<Utc>) -> bool {
        profile.apply_trial_expiry(now)
    }

    /// Grant a free trial of a paid tier, used by registration flows
    pub fn start_trial(
        &self,
        profile: &mut EngineerProfile,
        tier: SubscriptionTier,
        days: i64,
        now: DateTime<Utc>,
    ) -> SettleResult<DateTime<Utc>> {
        profile.start_trial(tier, days, now)
    }

    /// Upgrade to a paid tier. Returns the subscription charge to append
    /// against the engineer.
    pub fn upgrade(
        &self,
        profile: &mut EngineerProfile,
        to_tier: SubscriptionTier,
        now: DateTime<Utc>,
    ) -> SettleResult<Transaction> {
        let price = profile.apply_upgrade(to_tier, now)?;
        Ok(Transaction::new(
            profile.engineer_id.clone(),
            TransactionType::Subscription,
            -price,
            format!("{} subscription (monthly)", to_tier.name()),
        ))
    }

    /// Grant one security-net credit if the guard chain passes
    pub fn claim_security_net(
        &self,
        profile: &mut EngineerProfile,
        conversations: &[Conversation],
        now: DateTime<Utc>,
    ) -> SettleResult<SecurityNetGrant> {
        self.security_net_gate
            .check_claim(profile, conversations)
            .into_result()?;

        let subscription_end_date = profile.apply_security_net_credit(now)?;
        Ok(SecurityNetGrant {
            credits_used: profile.security_net_credits_used,
            subscription_end_date,
            deactivated: profile.status == ProfileStatus::Inactive,
        })
    }

    /// Bring an inactive profile back into search results
    pub fn reactivate(&self, profile: &mut EngineerProfile) -> SettleResult<()> {
        profile.reactivate()
    }
}

impl Default for SubscriptionEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SecurityNetDenial, SettleError};
    use crate::types::{ActorRole, ConversationId, UserId, SECURITY_NET_EXTENSION_DAYS};
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn create_test_profile(tier: SubscriptionTier) -> EngineerProfile {
        EngineerProfile::new(UserId::new("eng_1"), "Ada Lovelace", "ada@example.com")
            .with_tier(tier)
    }

    #[test]
    fn test_upgrade_emits_subscription_charge() {
        let engine = SubscriptionEngine::new();
        let now = Utc::now();
        let mut profile = create_test_profile(SubscriptionTier::Basic);

        let charge = engine
            .upgrade(&mut profile, SubscriptionTier::Professional, now)
            .unwrap();
        assert_eq!(charge.tx_type, TransactionType::Subscription);
        assert_eq!(charge.amount, Decimal::from(-7));
        assert_eq!(charge.user_id, UserId::new("eng_1"));
        assert!(charge.validate_sign().is_ok());
        assert_eq!(profile.tier, SubscriptionTier::Professional);
    }

    #[test]
    fn test_first_claim_extends_and_stays_active() {
        let engine = SubscriptionEngine::new();
        let now = Utc::now();
        let mut profile = create_test_profile(SubscriptionTier::Professional);
        profile.subscription_end_date = Some(now + Duration::days(5));

        let grant = engine.claim_security_net(&mut profile, &[], now).unwrap();
        assert_eq!(grant.credits_used, 1);
        assert_eq!(
            grant.subscription_end_date,
            now + Duration::days(5 + SECURITY_NET_EXTENSION_DAYS)
        );
        assert!(!grant.deactivated);
        assert_eq!(profile.status, ProfileStatus::Active);
    }

    #[test]
    fn test_third_claim_deactivates_and_fourth_fails() {
        let engine = SubscriptionEngine::new();
        let now = Utc::now();
        let mut profile = create_test_profile(SubscriptionTier::Professional);

        engine.claim_security_net(&mut profile, &[], now).unwrap();
        engine.claim_security_net(&mut profile, &[], now).unwrap();
        let third = engine.claim_security_net(&mut profile, &[], now).unwrap();
        assert_eq!(third.credits_used, 3);
        assert!(third.deactivated);
        assert_eq!(profile.status, ProfileStatus::Inactive);

        let err = engine
            .claim_security_net(&mut profile, &[], now)
            .unwrap_err();
        assert_eq!(
            err,
            SettleError::SecurityNetDenied {
                reason: SecurityNetDenial::CreditsExhausted
            }
        );
        assert_eq!(profile.security_net_credits_used, 3);
    }

    #[test]
    fn test_company_contact_blocks_claim() {
        let engine = SubscriptionEngine::new();
        let now = Utc::now();
        let mut profile = create_test_profile(SubscriptionTier::Business);
        let conversations = vec![Conversation::new(ConversationId::new("cv_1"))
            .with_participant(UserId::new("eng_1"), ActorRole::Engineer)
            .with_participant(UserId::new("co_1"), ActorRole::Company)];

        let err = engine
            .claim_security_net(&mut profile, &conversations, now)
            .unwrap_err();
        assert_eq!(
            err,
            SettleError::SecurityNetDenied {
                reason: SecurityNetDenial::CompanyContactRecorded
            }
        );
        assert_eq!(profile.security_net_credits_used, 0);
    }

    #[test]
    fn test_reactivate_round_trip() {
        let engine = SubscriptionEngine::new();
        let now = Utc::now();
        let mut profile = create_test_profile(SubscriptionTier::Professional);

        for _ in 0..3 {
            engine.claim_security_net(&mut profile, &[], now).unwrap();
        }
        assert_eq!(profile.status, ProfileStatus::Inactive);

        engine.reactivate(&mut profile).unwrap();
        assert_eq!(profile.status, ProfileStatus::Active);

        // Reactivation restores visibility, never credits
        assert_eq!(profile.security_net_credits_used, 3);
        assert!(engine.reactivate(&mut profile).is_err());
    }

    #[test]
    fn test_trial_expiry_delegates() {
        let engine = SubscriptionEngine::new();
        let now = Utc::now();
        let mut profile = create_test_profile(SubscriptionTier::Skills)
            .with_trial_until(now - Duration::days(2));

        assert!(engine.check_trial_expiry(&mut profile, now));
        assert_eq!(profile.tier, SubscriptionTier::Basic);
        assert!(!engine.check_trial_expiry(&mut profile, now));
    }
}
