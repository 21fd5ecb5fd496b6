//! Security-Net Eligibility Gates
//!
//! A claim must pass a short-circuiting guard chain: paid tier, credits
//! remaining, and no recorded company contact. Each guard reports a
//! distinct denial reason for user-facing messaging.

use crate::error::{SecurityNetDenial, SettleError, SettleResult};
use crate::types::{Conversation, EngineerProfile, UserId, MAX_SECURITY_NET_CREDITS};

/// Gate check result
#[derive(Clone, Debug)]
pub struct GateCheckResult {
    pub passed: bool,
    pub error: Option<SettleError>,
}

impl GateCheckResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            error: None,
        }
    }

    pub fn fail(error: SettleError) -> Self {
        Self {
            passed: false,
            error: Some(error),
        }
    }

    pub fn deny(reason: SecurityNetDenial) -> Self {
        Self::fail(SettleError::SecurityNetDenied { reason })
    }

    pub fn into_result(self) -> SettleResult<()> {
        match (self.passed, self.error) {
            (true, _) => Ok(()),
            (false, Some(error)) => Err(error),
            (false, None) => Err(SettleError::invalid_state("Gate failed without a reason")),
        }
    }
}

/// Security-net eligibility gate
pub struct SecurityNetGate;

impl SecurityNetGate {
    pub fn new() -> Self {
        Self
    }

    /// Guard 1: the benefit is paid-tier only
    pub fn require_paid_tier(&self, profile: &EngineerProfile) -> GateCheckResult {
        if profile.tier.is_paid() {
            GateCheckResult::pass()
        } else {
            GateCheckResult::deny(SecurityNetDenial::BasicTierExcluded)
        }
    }

    /// Guard 2: the lifetime credit pool is not exhausted
    pub fn require_credits_available(&self, profile: &EngineerProfile) -> GateCheckResult {
        if profile.security_net_credits_used >= MAX_SECURITY_NET_CREDITS {
            GateCheckResult::deny(SecurityNetDenial::CreditsExhausted)
        } else {
            GateCheckResult::pass()
        }
    }

    /// Guard 3: no conversation links the engineer to a Company-role
    /// participant. The benefit exists to de-risk subscribers no company
    /// has discovered yet.
    pub fn require_no_company_contact(
        &self,
        engineer_id: &UserId,
        conversations: &[Conversation],
    ) -> GateCheckResult {
        let contacted = conversations
            .iter()
            .any(|c| c.involves(engineer_id) && c.has_company_participant());
        if contacted {
            GateCheckResult::deny(SecurityNetDenial::CompanyContactRecorded)
        } else {
            GateCheckResult::pass()
        }
    }

    /// Run the full chain, stopping at the first failing guard
    pub fn check_claim(
        &self,
        profile: &EngineerProfile,
        conversations: &[Conversation],
    ) -> GateCheckResult {
        let result = self.require_paid_tier(profile);
        if !result.passed {
            return result;
        }

        let result = self.require_credits_available(profile);
        if !result.passed {
            return result;
        }

        self.require_no_company_contact(&profile.engineer_id, conversations)
    }
}

impl Default for SecurityNetGate {
    fn default() -> Self {
        Self::new()
    }
}
