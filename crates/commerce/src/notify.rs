//! Outbound order notifications.
//!
//! Notifications go out after the order change is committed. A failed
//! notification is logged and counted but never fails the operation.

use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::order::OrderStatus;
use crate::value_objects::Money;

/// Something a customer or the back office should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    OrderPlaced {
        order_id: AggregateId,
        order_number: String,
        email: String,
        total: Money,
    },
    OrderCancelled {
        order_id: AggregateId,
        order_number: String,
        reason: String,
    },
    OrderStatusChanged {
        order_id: AggregateId,
        order_number: String,
        from: OrderStatus,
        to: OrderStatus,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::OrderPlaced { .. } => "order_placed",
            Notification::OrderCancelled { .. } => "order_cancelled",
            Notification::OrderStatusChanged { .. } => "order_status_changed",
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),
}

/// Delivery channel for notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        (**self).notify(notification).await
    }
}

/// Writes each notification as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        match notification {
            Notification::OrderPlaced {
                order_number,
                email,
                total,
                ..
            } => tracing::info!(%order_number, %email, %total, "notify: order placed"),
            Notification::OrderCancelled {
                order_number,
                reason,
                ..
            } => tracing::info!(%order_number, %reason, "notify: order cancelled"),
            Notification::OrderStatusChanged {
                order_number,
                from,
                to,
                ..
            } => tracing::info!(%order_number, %from, %to, "notify: order status changed"),
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<Notification>,
    failing: bool,
}

/// Records notifications for inspection; can be switched to fail.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following delivery fail (or succeed again).
    pub async fn set_failing(&self, failing: bool) {
        self.state.write().await.failing = failing;
    }

    /// Notifications delivered so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.state.read().await.sent.clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut state = self.state.write().await;
        if state.failing {
            return Err(NotifyError::Unavailable("mailer offline".to_string()));
        }
        state.sent.push(notification.clone());
        Ok(())
    }
}

/// Delivers `notification`, swallowing failures.
pub async fn dispatch<N: Notifier + ?Sized>(notifier: &N, notification: Notification) {
    if let Err(error) = notifier.notify(&notification).await {
        tracing::warn!(%error, kind = notification.kind(), "notification failed");
        metrics::counter!("notifications_failed_total", "kind" => notification.kind())
            .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cancelled() -> Notification {
        Notification::OrderCancelled {
            order_id: AggregateId::new(),
            order_number: "ORD-20260101-ABCDEF12".to_string(),
            reason: "changed mind".to_string(),
        }
    }

    #[tokio::test]
    async fn records_delivered_notifications() {
        let notifier = InMemoryNotifier::new();
        dispatch(&notifier, cancelled()).await;

        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind(), "order_cancelled");
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let notifier = InMemoryNotifier::new();
        notifier.set_failing(true).await;
        dispatch(&notifier, cancelled()).await;
        assert!(notifier.sent().await.is_empty());

        notifier.set_failing(false).await;
        dispatch(&notifier, cancelled()).await;
        assert_eq!(notifier.sent().await.len(), 1);
    }

    #[tokio::test]
    async fn log_notifier_never_fails() {
        assert!(LogNotifier.notify(&cancelled()).await.is_ok());
    }
}
