use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::gateway::{ChatId, Gateway};

/// Process-lifetime cache of the administrator's chat id.
///
/// Filled either when the admin writes to the bot or by looking the admin's
/// handle up through the gateway. Failed lookups are not cached.
pub struct AdminIdentity {
    handle: String,
    gateway: Arc<dyn Gateway>,
    chat: RwLock<Option<ChatId>>,
}

impl AdminIdentity {
    /// `handle` must already be normalised (lowercase, no `@`).
    pub fn new(handle: impl Into<String>, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            handle: handle.into(),
            gateway,
            chat: RwLock::new(None),
        }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Cached value, without attempting a lookup
    pub async fn get(&self) -> Option<ChatId> {
        *self.chat.read().await
    }

    /// Record the chat the admin just wrote from
    pub async fn remember(&self, chat: ChatId) {
        let mut slot = self.chat.write().await;
        if *slot != Some(chat) {
            info!("Admin @{} chat id set to {}", self.handle, chat);
        }
        *slot = Some(chat);
    }

    /// Return the admin chat id, looking it up by handle if not yet known
    pub async fn resolve(&self) -> Option<ChatId> {
        if let Some(chat) = self.get().await {
            return Some(chat);
        }

        match self.gateway.chat_by_handle(&self.handle).await {
            Ok(chat) => {
                let mut slot = self.chat.write().await;
                // A concurrent admin message may have filled the slot meanwhile.
                let chat = *slot.get_or_insert(chat);
                info!("Resolved admin @{} to chat id {}", self.handle, chat);
                Some(chat)
            }
            Err(e) => {
                warn!(
                    "Could not resolve @{} to a chat id yet ({}). \
                     The admin has to start the bot at least once.",
                    self.handle, e
                );
                None
            }
        }
    }
}
