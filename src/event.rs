//! Gateway event system.

use tokio::sync::broadcast;

/// Events emitted by the gateway components.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// Gateway has started serving.
    Started {
        /// Bound listen address.
        addr: String,
    },

    /// Gateway is shutting down.
    ShuttingDown,

    /// A payment reference was issued.
    PaymentInitiated {
        /// Reference identifier.
        reference_id: String,
        /// Whether the store write succeeded.
        persisted: bool,
    },

    /// A payment reference reached a terminal status.
    PaymentSettled {
        /// Reference identifier.
        reference_id: String,
        /// New status.
        status: String,
    },

    /// A form submission was stored.
    SubmissionStored {
        /// Form identifier.
        form_id: String,
        /// Submission identifier.
        submission_id: String,
    },

    /// A bounty form was created.
    FormCreated {
        /// Form identifier.
        form_id: String,
    },

    /// An address opted into notifications.
    NotificationRegistered {
        /// Wallet address.
        address: String,
    },

    /// An identity proof was checked.
    IdentityVerified {
        /// Action tag.
        action: String,
        /// Verification outcome.
        success: bool,
    },

    /// Error occurred.
    Error {
        /// Error message.
        message: String,
    },
}

/// Channel for receiving gateway events.
pub type GatewayEventsChannel = broadcast::Receiver<GatewayEvent>;

/// Sender for gateway events.
pub type GatewayEventsSender = broadcast::Sender<GatewayEvent>;

/// Create a new event channel pair.
#[must_use]
pub fn create_event_channel() -> (GatewayEventsSender, GatewayEventsChannel) {
    broadcast::channel(256)
}
