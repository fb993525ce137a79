use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::info;

use crate::application::NotificationService;
use crate::domain::NotificationError;

/// Notification service that records verification requests in the log
/// instead of sending mail.
#[derive(Debug, Default)]
pub struct LogNotifier {
    sent: Mutex<Vec<String>>,
}

impl LogNotifier {
    /// Addresses that have been sent a verification email, oldest first.
    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl NotificationService for LogNotifier {
    async fn send_verification(&self, email: &str) -> Result<(), NotificationError> {
        info!(email, "verification email sent");
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_each_send() {
        let notifier = LogNotifier::default();
        notifier.send_verification("a@example.com").await.unwrap();
        notifier.send_verification("b@example.com").await.unwrap();
        assert_eq!(notifier.sent(), vec!["a@example.com", "b@example.com"]);
    }
}
