use async_trait::async_trait;

use crate::error::NotifyError;

/// A destination that accepts plain text messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message.
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;

    /// Release the channel. Later `notify` calls may fail with
    /// [`NotifyError::Closed`].
    async fn close(&self) {}
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for Box<N> {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        (**self).notify(message).await
    }

    async fn close(&self) {
        (**self).close().await;
    }
}

/// Logs each message instead of delivering it.
#[derive(Debug, Clone)]
pub struct DryRunNotifier {
    label: String,
}

impl DryRunNotifier {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
        }
    }
}

#[async_trait]
impl Notifier for DryRunNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        tracing::info!(destination = %self.label, message, "dry-run: would send");
        Ok(())
    }
}
