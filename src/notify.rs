use async_trait::async_trait;

use crate::error::LeaveResult;

/// Outbound notification about a lifecycle transition. Delivery is
/// fire-and-forget; a failure is logged and never rolls back the
/// transition that produced it.
#[derive(Debug, Clone)]
pub struct LeaveNotice {
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

/// External mail/notification collaborator.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notice: LeaveNotice) -> LeaveResult<()>;
}

/// Default sender for environments without a mail relay: records the notice
/// in the log and succeeds.
#[derive(Debug, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl NotificationSender for LoggingNotifier {
    async fn send(&self, notice: LeaveNotice) -> LeaveResult<()> {
        tracing::info!(
            to = %notice.to_email,
            subject = %notice.subject,
            "leave notification (logged, not delivered)"
        );
        Ok(())
    }
}
