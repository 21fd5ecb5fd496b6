//! Subscription tiers and the engineer profile aggregate.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{SettleError, SettleResult};
use crate::types::common::UserId;

/// Days a paid subscription runs after an upgrade
pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;
/// Days a security-net claim adds to the subscription end date
pub const SECURITY_NET_EXTENSION_DAYS: i64 = 30;
/// Lifetime cap on security-net credits per engineer
pub const MAX_SECURITY_NET_CREDITS: u8 = 3;

/// Subscription level gating feature access and pricing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Basic,
    Professional,
    Skills,
    Business,
}

impl SubscriptionTier {
    pub fn all() -> Vec<SubscriptionTier> {
        vec![
            SubscriptionTier::Basic,
            SubscriptionTier::Professional,
            SubscriptionTier::Skills,
            SubscriptionTier::Business,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            SubscriptionTier::Basic => "basic",
            SubscriptionTier::Professional => "professional",
            SubscriptionTier::Skills => "skills",
            SubscriptionTier::Business => "business",
        }
    }

    /// Monthly price; Basic is the free tier and has none
    pub fn monthly_price(&self) -> Option<Decimal> {
        match self {
            SubscriptionTier::Basic => None,
            SubscriptionTier::Professional => Some(Decimal::from(7)),
            SubscriptionTier::Skills => Some(Decimal::from(15)),
            SubscriptionTier::Business => Some(Decimal::from(35)),
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, SubscriptionTier::Basic)
    }
}

impl Default for SubscriptionTier {
    fn default() -> Self {
        SubscriptionTier::Basic
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Engineer profile visibility status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    Active,
    Inactive,
    /// Administrative lock; no operation here reaches it
    Suspended,
}

impl ProfileStatus {
    pub fn name(&self) -> &'static str {
        match self {
            ProfileStatus::Active => "active",
            ProfileStatus::Inactive => "inactive",
            ProfileStatus::Suspended => "suspended",
        }
    }

    pub fn can_transition_to(&self, new_status: ProfileStatus) -> bool {
        matches!(
            (self, new_status),
            (ProfileStatus::Active, ProfileStatus::Inactive)
                | (ProfileStatus::Inactive, ProfileStatus::Active)
                | (ProfileStatus::Active, ProfileStatus::Suspended)
        )
    }
}

impl std::fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Engineer profile carrying the subscription state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineerProfile {
    pub engineer_id: UserId,
    pub display_name: String,
    pub contact_email: String,
    pub tier: SubscriptionTier,
    pub trial_end_date: Option<DateTime<Utc>>,
    pub subscription_end_date: Option<DateTime<Utc>>,
    /// Monotonically non-decreasing, capped at MAX_SECURITY_NET_CREDITS
    pub security_net_credits_used: u8,
    pub status: ProfileStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EngineerProfile {
    pub fn new(
        engineer_id: UserId,
        display_name: impl Into<String>,
        contact_email: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            engineer_id,
            display_name: display_name.into(),
            contact_email: contact_email.into(),
            tier: SubscriptionTier::Basic,
            trial_end_date: None,
            subscription_end_date: None,
            security_net_credits_used: 0,
            status: ProfileStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_tier(mut self, tier: SubscriptionTier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_trial_until(mut self, trial_end_date: DateTime<Utc>) -> Self {
        self.trial_end_date = Some(trial_end_date);
        self
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Downgrade to Basic when the trial ran out. Idempotent; returns
    /// whether anything changed.
    pub fn apply_trial_expiry(&mut self, now: DateTime<Utc>) -> bool {
        if self.tier == SubscriptionTier::Basic {
            return false;
        }
        match self.trial_end_date {
            Some(end) if end < now => {
                self.tier = SubscriptionTier::Basic;
                self.touch();
                true
            }
            _ => false,
        }
    }

    /// Grant a free trial of a paid tier; returns the trial end date
    pub fn start_trial(
        &mut self,
        tier: SubscriptionTier,
        days: i64,
        now: DateTime<Utc>,
    ) -> SettleResult<DateTime<Utc>> {
        if !tier.is_paid() {
            return Err(SettleError::TierNotPurchasable {
                tier: tier.name().to_string(),
            });
        }
        if days <= 0 {
            return Err(SettleError::invalid_amount(format!(
                "trial length must be positive, got {} days",
                days
            )));
        }
        let trial_end = now + Duration::days(days);
        self.tier = tier;
        self.trial_end_date = Some(trial_end);
        self.touch();
        Ok(trial_end)
    }

    /// Switch to a paid tier; returns the monthly price charged
    pub fn apply_upgrade(
        &mut self,
        to_tier: SubscriptionTier,
        now: DateTime<Utc>,
    ) -> SettleResult<Decimal> {
        let price = to_tier
            .monthly_price()
            .ok_or_else(|| SettleError::TierNotPurchasable {
                tier: to_tier.name().to_string(),
            })?;
        self.tier = to_tier;
        self.subscription_end_date = Some(now + Duration::days(SUBSCRIPTION_PERIOD_DAYS));
        self.trial_end_date = None;
        self.touch();
        Ok(price)
    }

    /// Consume one security-net credit: extend the subscription end date and
    /// deactivate the profile when the last credit is used. Eligibility has
    /// already been checked by the guard chain; the cap still holds here.
    pub fn apply_security_net_credit(&mut self, now: DateTime<Utc>) -> SettleResult<DateTime<Utc>> {
        if self.security_net_credits_used >= MAX_SECURITY_NET_CREDITS {
            return Err(SettleError::invariant(
                "security_net_credit_cap",
                format!(
                    "credits already at {} for {}",
                    self.security_net_credits_used, self.engineer_id
                ),
            ));
        }
        let base = self.subscription_end_date.unwrap_or(now);
        let extended = base + Duration::days(SECURITY_NET_EXTENSION_DAYS);
        self.security_net_credits_used += 1;
        self.subscription_end_date = Some(extended);
        if self.security_net_credits_used >= MAX_SECURITY_NET_CREDITS {
            self.status = ProfileStatus::Inactive;
        }
        self.touch();
        Ok(extended)
    }

    /// Bring an inactive profile back into search results
    pub fn reactivate(&mut self) -> SettleResult<()> {
        if self.status != ProfileStatus::Inactive {
            return Err(SettleError::InvalidProfileStatusTransition {
                from: self.status.name().to_string(),
                to: ProfileStatus::Active.name().to_string(),
            });
        }
        self.status = ProfileStatus::Active;
        self.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_profile() -> EngineerProfile {
        EngineerProfile::new(UserId::new("eng_1"), "Ada Lovelace", "ada@example.com")
    }

    #[test]
    fn test_price_table() {
        assert_eq!(SubscriptionTier::Basic.monthly_price(), None);
        assert_eq!(
            SubscriptionTier::Professional.monthly_price(),
            Some(Decimal::from(7))
        );
        assert_eq!(
            SubscriptionTier::Skills.monthly_price(),
            Some(Decimal::from(15))
        );
        assert_eq!(
            SubscriptionTier::Business.monthly_price(),
            Some(Decimal::from(35))
        );
    }

    #[test]
    fn test_trial_expiry_downgrades_once() {
        let now = Utc::now();
        let mut profile = create_test_profile()
            .with_tier(SubscriptionTier::Professional)
            .with_trial_until(now - Duration::days(1));

        assert!(profile.apply_trial_expiry(now));
        assert_eq!(profile.tier, SubscriptionTier::Basic);

        // Already downgraded: second call changes nothing
        assert!(!profile.apply_trial_expiry(now));
        assert_eq!(profile.tier, SubscriptionTier::Basic);
    }

    #[test]
    fn test_trial_still_running_is_kept() {
        let now = Utc::now();
        let mut profile = create_test_profile()
            .with_tier(SubscriptionTier::Skills)
            .with_trial_until(now + Duration::days(3));

        assert!(!profile.apply_trial_expiry(now));
        assert_eq!(profile.tier, SubscriptionTier::Skills);
    }

    #[test]
    fn test_start_trial_sets_tier_and_end_date() {
        let now = Utc::now();
        let mut profile = create_test_profile();

        let trial_end = profile
            .start_trial(SubscriptionTier::Professional, 14, now)
            .unwrap();
        assert_eq!(trial_end, now + Duration::days(14));
        assert_eq!(profile.tier, SubscriptionTier::Professional);
        assert_eq!(profile.trial_end_date, Some(trial_end));

        assert!(profile.start_trial(SubscriptionTier::Basic, 14, now).is_err());
        assert!(profile
            .start_trial(SubscriptionTier::Skills, 0, now)
            .is_err());
    }

    #[test]
    fn test_upgrade_sets_period_and_clears_trial() {
        let now = Utc::now();
        let mut profile = create_test_profile().with_trial_until(now + Duration::days(3));

        let price = profile
            .apply_upgrade(SubscriptionTier::Business, now)
            .unwrap();
        assert_eq!(price, Decimal::from(35));
        assert_eq!(profile.tier, SubscriptionTier::Business);
        assert_eq!(
            profile.subscription_end_date,
            Some(now + Duration::days(SUBSCRIPTION_PERIOD_DAYS))
        );
        assert_eq!(profile.trial_end_date, None);
    }

    #[test]
    fn test_basic_is_not_purchasable() {
        let now = Utc::now();
        let mut profile = create_test_profile();
        let err = profile
            .apply_upgrade(SubscriptionTier::Basic, now)
            .unwrap_err();
        assert_eq!(
            err,
            SettleError::TierNotPurchasable {
                tier: "basic".to_string()
            }
        );
    }

    #[test]
    fn test_security_net_extends_from_current_end() {
        let now = Utc::now();
        let mut profile = create_test_profile().with_tier(SubscriptionTier::Professional);
        profile.subscription_end_date = Some(now + Duration::days(10));

        let extended = profile.apply_security_net_credit(now).unwrap();
        assert_eq!(extended, now + Duration::days(10 + SECURITY_NET_EXTENSION_DAYS));
        assert_eq!(profile.security_net_credits_used, 1);
        assert_eq!(profile.status, ProfileStatus::Active);
    }

    #[test]
    fn test_third_credit_deactivates() {
        let now = Utc::now();
        let mut profile = create_test_profile().with_tier(SubscriptionTier::Professional);

        profile.apply_security_net_credit(now).unwrap();
        profile.apply_security_net_credit(now).unwrap();
        assert_eq!(profile.status, ProfileStatus::Active);

        profile.apply_security_net_credit(now).unwrap();
        assert_eq!(profile.security_net_credits_used, 3);
        assert_eq!(profile.status, ProfileStatus::Inactive);

        // The cap holds even if the guard chain were bypassed
        assert!(profile.apply_security_net_credit(now).is_err());
        assert_eq!(profile.security_net_credits_used, 3);
    }

    #[test]
    fn test_reactivate_only_from_inactive() {
        let mut profile = create_test_profile();
        assert!(profile.reactivate().is_err());

        profile.status = ProfileStatus::Inactive;
        profile.reactivate().unwrap();
        assert_eq!(profile.status, ProfileStatus::Active);
    }
}
