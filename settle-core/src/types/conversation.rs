//! Conversation read-model used as the security-net eligibility signal.
//!
//! This subsystem never mutates conversations; it only scans them for
//! company-role contact.

use serde::{Deserialize, Serialize};

use crate::types::common::{ActorRole, ConversationId, UserId};

/// A message-thread participant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    pub role: ActorRole,
}

impl Participant {
    pub fn new(user_id: UserId, role: ActorRole) -> Self {
        Self { user_id, role }
    }
}

/// A message thread between marketplace users
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: ConversationId,
    pub participants: Vec<Participant>,
}

impl Conversation {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            participants: Vec::new(),
        }
    }

    pub fn with_participant(mut self, user_id: UserId, role: ActorRole) -> Self {
        self.participants.push(Participant::new(user_id, role));
        self
    }

    pub fn involves(&self, user_id: &UserId) -> bool {
        self.participants.iter().any(|p| &p.user_id == user_id)
    }

    /// True when any participant acts in the Company role
    pub fn has_company_participant(&self) -> bool {
        self.participants
            .iter()
            .any(|p| p.role == ActorRole::Company)
    }
}
