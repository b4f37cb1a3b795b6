//! Notification delivery.
//!
//! The [`NotificationDispatcher`] is invoked only after the triggering
//! transaction has committed. It looks the recipient up in a
//! [`ChannelRegistry`] and hands the message over if a channel is present.

mod dispatcher;
mod registry;

pub use dispatcher::NotificationDispatcher;
pub use registry::{ChannelHandle, ChannelRegistry, InMemoryChannelRegistry, NotificationChannel};
