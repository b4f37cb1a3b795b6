//! Fire-and-forget notification delivery.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::models::Notification;

use super::registry::ChannelRegistry;

/// Delivers notifications to whichever recipients are currently reachable.
///
/// Delivery never fails the caller: unreachable recipients are skipped and
/// channels that reject a message are dropped from the registry.
#[derive(Clone)]
pub struct NotificationDispatcher {
    registry: Arc<dyn ChannelRegistry>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher over `registry`.
    pub fn new(registry: Arc<dyn ChannelRegistry>) -> Self {
        Self { registry }
    }

    /// The registry recipients are looked up in.
    pub fn registry(&self) -> &Arc<dyn ChannelRegistry> {
        &self.registry
    }

    /// Delivers `notification` to `recipient` if they are reachable.
    ///
    /// Returns whether the notification was handed to a channel.
    pub fn notify(&self, recipient: &str, notification: &Notification) -> bool {
        let Some(channel) = self.registry.lookup(recipient) else {
            debug!(
                recipient,
                kind = ?notification.kind,
                leave_request_id = notification.leave_request_id,
                "recipient not reachable, notification skipped"
            );
            return false;
        };
        match channel.deliver(notification) {
            Ok(()) => {
                debug!(
                    recipient,
                    kind = ?notification.kind,
                    leave_request_id = notification.leave_request_id,
                    "notification delivered"
                );
                true
            }
            Err(e) => {
                warn!(recipient, error = %e, "notification delivery failed, dropping channel");
                self.registry.unregister(recipient);
                false
            }
        }
    }

    /// Delivers each `(recipient, notification)` pair in order.
    pub fn notify_all(&self, outbox: &[(String, Notification)]) {
        for (recipient, notification) in outbox {
            self.notify(recipient, notification);
        }
    }
}
