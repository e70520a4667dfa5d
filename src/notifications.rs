//! Notification opt-in registrar.

use crate::error::{Error, Result};
use crate::event::{GatewayEvent, GatewayEventsSender};
use crate::store::FlagStore;
use std::sync::Arc;
use tracing::info;

/// Value stored for an opted-in address.
const OPTED_IN: &str = "true";

/// Records which addresses opted into notifications.
pub struct NotificationRegistrar {
    flags: Arc<dyn FlagStore>,
    events: GatewayEventsSender,
}

impl NotificationRegistrar {
    /// Create a new registrar.
    #[must_use]
    pub fn new(flags: Arc<dyn FlagStore>, events: GatewayEventsSender) -> Self {
        Self { flags, events }
    }

    /// Opt `address` in. Repeating the call rewrites the same value.
    ///
    /// The address format is not checked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for an empty address, or the store's error.
    pub async fn register(&self, address: &str) -> Result<()> {
        let address = address.trim();
        if address.is_empty() {
            return Err(Error::InvalidInput("address is required".to_string()));
        }

        self.flags.set_flag(&flag_key(address), OPTED_IN).await?;
        let _ = self.events.send(GatewayEvent::NotificationRegistered {
            address: address.to_string(),
        });

        info!("Notifications enabled for {address}");
        Ok(())
    }

    /// Whether `address` opted in.
    ///
    /// # Errors
    ///
    /// Returns the store's error.
    pub async fn is_registered(&self, address: &str) -> Result<bool> {
        Ok(self
            .flags
            .get_flag(&flag_key(address.trim()))
            .await?
            .is_some_and(|v| v == OPTED_IN))
    }
}

fn flag_key(address: &str) -> String {
    format!("notifications:{address}")
}
