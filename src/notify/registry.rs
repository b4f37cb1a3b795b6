//! Reachability registry for notification recipients.
//!
//! A recipient is reachable while a channel is registered under their
//! `emp_id`. The registry is owned by the process and handed to the
//! dispatcher; nothing reaches it through global state.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc::UnboundedSender;

use crate::error::{HrError, HrResult};
use crate::models::Notification;

/// A live delivery channel to one recipient.
pub trait NotificationChannel: Send + Sync {
    /// Hands the notification to the channel without blocking.
    ///
    /// Returns `UpstreamUnavailable` when the recipient has gone away.
    fn deliver(&self, notification: &Notification) -> HrResult<()>;
}

impl NotificationChannel for UnboundedSender<Notification> {
    fn deliver(&self, notification: &Notification) -> HrResult<()> {
        self.send(notification.clone())
            .map_err(|_| HrError::UpstreamUnavailable {
                service: "notification channel".to_string(),
                message: "receiver closed".to_string(),
            })
    }
}

/// Shared handle to a registered channel.
pub type ChannelHandle = Arc<dyn NotificationChannel>;

/// Maps recipients to their live channels.
pub trait ChannelRegistry: Send + Sync {
    /// Registers `handle` for `emp_id`, replacing any previous channel.
    fn register_channel(&self, emp_id: &str, handle: ChannelHandle);

    /// The channel registered for `emp_id`, if any.
    fn lookup(&self, emp_id: &str) -> Option<ChannelHandle>;

    /// Removes the channel registered for `emp_id`.
    fn unregister(&self, emp_id: &str);
}

/// A process-local [`ChannelRegistry`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use hr_backoffice::notify::{ChannelRegistry, InMemoryChannelRegistry};
/// use hr_backoffice::models::Notification;
///
/// let registry = InMemoryChannelRegistry::default();
/// let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<Notification>();
/// registry.register_channel("MGR001", Arc::new(tx));
/// assert!(registry.lookup("MGR001").is_some());
///
/// registry.unregister("MGR001");
/// assert!(registry.lookup("MGR001").is_none());
/// ```
#[derive(Default)]
pub struct InMemoryChannelRegistry {
    channels: RwLock<HashMap<String, ChannelHandle>>,
}

impl InMemoryChannelRegistry {
    /// Number of reachable recipients.
    pub fn len(&self) -> usize {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no recipient is reachable.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChannelRegistry for InMemoryChannelRegistry {
    fn register_channel(&self, emp_id: &str, handle: ChannelHandle) {
        self.channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(emp_id.to_string(), handle);
    }

    fn lookup(&self, emp_id: &str) -> Option<ChannelHandle> {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(emp_id)
            .cloned()
    }

    fn unregister(&self, emp_id: &str) {
        self.channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(emp_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LeaveStatus, NotificationKind};
    use tokio::sync::mpsc::unbounded_channel;

    fn notification() -> Notification {
        Notification {
            kind: NotificationKind::LeaveStatusUpdate,
            leave_request_id: 1,
            approval_id: Some(1),
            level: Some(1),
            status: LeaveStatus::Approved,
            message: "approved".to_string(),
        }
    }

    #[test]
    fn test_register_replaces_previous_channel() {
        let registry = InMemoryChannelRegistry::default();
        let (first, mut first_rx) = unbounded_channel();
        let (second, mut second_rx) = unbounded_channel();

        registry.register_channel("EMP001", Arc::new(first));
        registry.register_channel("EMP001", Arc::new(second));
        assert_eq!(registry.len(), 1);

        let handle = registry.lookup("EMP001").unwrap();
        handle.deliver(&notification()).unwrap();
        assert!(first_rx.try_recv().is_err());
        assert_eq!(second_rx.try_recv().unwrap(), notification());
    }

    #[test]
    fn test_closed_sender_is_upstream_unavailable() {
        let (tx, rx) = unbounded_channel::<Notification>();
        drop(rx);

        let err = tx.deliver(&notification()).unwrap_err();
        assert_eq!(err.code(), "UPSTREAM_UNAVAILABLE");
    }

    #[test]
    fn test_lookup_unknown_recipient() {
        let registry = InMemoryChannelRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.lookup("EMP404").is_none());
    }
}
