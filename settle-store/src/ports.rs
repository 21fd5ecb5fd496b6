//! Collaborator Ports
//!
//! The e-signature provider and the notification sink live outside this
//! subsystem; these traits abstract their call contracts, allowing for
//! recording implementations in testing and real clients in production.
//! Both are fire-and-forget from the service's point of view: a failed call
//! is logged and never rolls back a state transition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use settle_core::{ContractId, SettleError, SettleResult, UserId};

/// Notification category, used by delivery channels to pick a template
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A contract is waiting for the engineer's signature
    ContractReadyToSign,
    /// The engineer signed; the company can countersign
    ContractSigned,
    /// Both parties signed; the contract is active
    ContractActivated,
    /// A payout settled against the engineer's balance
    PayoutSettled,
}

impl NotificationKind {
    pub fn name(&self) -> &'static str {
        match self {
            NotificationKind::ContractReadyToSign => "contract_ready_to_sign",
            NotificationKind::ContractSigned => "contract_signed",
            NotificationKind::ContractActivated => "contract_activated",
            NotificationKind::PayoutSettled => "payout_settled",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// E-signature provider port
///
/// Called when a contract goes out for signing. The returned request id is
/// logged, not stored; state-machine correctness never depends on the
/// provider answering.
#[async_trait]
pub trait ESignatureProvider: Send + Sync {
    /// Open a signature request for the given signer
    async fn create_signature_request(
        &self,
        contract_id: &ContractId,
        signer_email: &str,
    ) -> SettleResult<String>;
}

/// Notification sink port
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification to a user
    async fn notify(
        &self,
        user_id: &UserId,
        kind: NotificationKind,
        text: &str,
        link: Option<&str>,
    ) -> SettleResult<()>;
}

/// Mock e-signature provider
///
/// Produces deterministic request ids derived from the contract id and
/// records every request for test assertions.
#[derive(Default)]
pub struct MockSignatureProvider {
    requests: Mutex<Vec<(ContractId, String)>>,
}

impl MockSignatureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests opened so far, in call order
    pub async fn requests(&self) -> Vec<(ContractId, String)> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ESignatureProvider for MockSignatureProvider {
    async fn create_signature_request(
        &self,
        contract_id: &ContractId,
        signer_email: &str,
    ) -> SettleResult<String> {
        let request_id = format!("sigreq_{}", contract_id.as_str());
        info!(
            "Mock signature request {} created for {}",
            request_id, signer_email
        );
        self.requests
            .lock()
            .await
            .push((contract_id.clone(), signer_email.to_string()));
        Ok(request_id)
    }
}

/// A notification captured by `RecordingNotificationSink`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedNotification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub text: String,
    pub link: Option<String>,
}

/// Notification sink that records instead of delivering
#[derive(Default)]
pub struct RecordingNotificationSink {
    sent: Mutex<Vec<RecordedNotification>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications captured so far, in call order
    pub async fn sent(&self) -> Vec<RecordedNotification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn notify(
        &self,
        user_id: &UserId,
        kind: NotificationKind,
        text: &str,
        link: Option<&str>,
    ) -> SettleResult<()> {
        self.sent.lock().await.push(RecordedNotification {
            user_id: user_id.clone(),
            kind,
            text: text.to_string(),
            link: link.map(String::from),
        });
        Ok(())
    }
}

/// Notification sink that discards everything
pub struct NoopNotificationSink;

#[async_trait]
impl NotificationSink for NoopNotificationSink {
    async fn notify(
        &self,
        _user_id: &UserId,
        _kind: NotificationKind,
        _text: &str,
        _link: Option<&str>,
    ) -> SettleResult<()> {
        Ok(())
    }
}

/// Notification sink that always fails, for delivery-failure tests
pub struct FailingNotificationSink;

#[async_trait]
impl NotificationSink for FailingNotificationSink {
    async fn notify(
        &self,
        user_id: &UserId,
        kind: NotificationKind,
        _text: &str,
        _link: Option<&str>,
    ) -> SettleResult<()> {
        Err(SettleError::invalid_state(format!(
            "delivery channel down: {} to {}",
            kind, user_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_signature_provider_is_deterministic() {
        let provider = MockSignatureProvider::new();
        let contract_id = ContractId::new("ct_42");

        let first = provider
            .create_signature_request(&contract_id, "ada@example.com")
            .await
            .unwrap();
        let second = provider
            .create_signature_request(&contract_id, "ada@example.com")
            .await
            .unwrap();

        assert_eq!(first, "sigreq_ct_42");
        assert_eq!(first, second);
        assert_eq!(provider.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_recording_sink_captures_order() {
        let sink = RecordingNotificationSink::new();
        sink.notify(
            &UserId::new("eng_1"),
            NotificationKind::ContractReadyToSign,
            "Contract ready",
            Some("/contracts/ct_1"),
        )
        .await
        .unwrap();
        sink.notify(
            &UserId::new("com_1"),
            NotificationKind::ContractSigned,
            "Engineer signed",
            None,
        )
        .await
        .unwrap();

        let sent = sink.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].kind, NotificationKind::ContractReadyToSign);
        assert_eq!(sent[0].link.as_deref(), Some("/contracts/ct_1"));
        assert_eq!(sent[1].user_id, UserId::new("com_1"));
    }

    #[tokio::test]
    async fn test_failing_sink_reports_failure() {
        let sink = FailingNotificationSink;
        let err = sink
            .notify(
                &UserId::new("eng_1"),
                NotificationKind::ContractActivated,
                "Active",
                None,
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("delivery channel down"));
    }
}
