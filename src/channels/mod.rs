//! Outbound message delivery.

pub mod messenger;
pub mod notifier;
pub mod outbox;

pub use messenger::MessengerNotifier;
pub use notifier::{LogNotifier, Notifier, OutboundMessage};
pub use outbox::Outbox;
