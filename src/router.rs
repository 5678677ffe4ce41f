use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, info};

use crate::admin::AdminIdentity;
use crate::event::{ContactRecord, InboundEvent, Sender};
use crate::gateway::{ChatId, Gateway, Keyboard, OutgoingContact};
use crate::replies::{forward_caption, Reply, SHARE_PHONE_LABEL};

/// Switches between the two historical behaviours of the contact handler
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RoutingPolicy {
    /// Refuse contact cards that do not belong to the sender
    #[serde(default = "default_true")]
    pub verify_ownership: bool,
    /// Attach a one-shot "share phone number" button to instruction replies
    #[serde(default = "default_true")]
    pub share_phone_button: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            verify_ownership: true,
            share_phone_button: true,
        }
    }
}

/// What to do with one inbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Admin said /start: greet them
    AdminStart,
    /// Answer the sender, nothing else
    Reply { reply: Reply, keyboard: bool },
    /// Forward the contact to the admin and confirm to the sender
    Forward,
}

/// Decide how an event is handled. Pure; touches neither gateway nor cache.
pub fn classify(event: &InboundEvent, admin_handle: &str, policy: &RoutingPolicy) -> Route {
    let from_admin = event.sender().is_admin(admin_handle);
    let reply = |reply, keyboard| Route::Reply { reply, keyboard };

    match event {
        InboundEvent::Start { .. } if from_admin => Route::AdminStart,
        InboundEvent::Start { .. } => reply(Reply::ShareContactPrompt, policy.share_phone_button),
        InboundEvent::Contact { .. } if from_admin => reply(Reply::AdminContactIgnored, false),
        InboundEvent::Contact { sender, contact }
            if policy.verify_ownership && contact.owner_id != Some(sender.user_id) =>
        {
            reply(Reply::ContactNotOwned, policy.share_phone_button)
        }
        InboundEvent::Contact { .. } => Route::Forward,
        InboundEvent::Other { text: Some(_), .. } if from_admin => {
            reply(Reply::AdminWaiting, false)
        }
        InboundEvent::Other { .. } => reply(
            Reply::UsageHint,
            policy.share_phone_button && !from_admin,
        ),
    }
}

/// Routes inbound events: greets, instructs, and forwards contact cards to
/// the administrator. Never fails; gateway errors end up as replies and logs.
pub struct ContactRouter {
    gateway: Arc<dyn Gateway>,
    admin: Arc<AdminIdentity>,
    policy: RoutingPolicy,
}

impl ContactRouter {
    pub fn new(gateway: Arc<dyn Gateway>, admin: Arc<AdminIdentity>, policy: RoutingPolicy) -> Self {
        Self {
            gateway,
            admin,
            policy,
        }
    }

    #[cfg(test)]
    pub fn admin(&self) -> &AdminIdentity {
        &self.admin
    }

    pub async fn handle(&self, event: InboundEvent) {
        let sender = event.sender();
        debug!(
            "Inbound {} from {} (chat {})",
            event.kind(),
            sender.display(),
            sender.chat
        );

        if sender.is_admin(self.admin.handle()) {
            self.admin.remember(sender.chat).await;
        }

        match classify(&event, self.admin.handle(), &self.policy) {
            Route::AdminStart => self.reply(sender.chat, Reply::AdminGreeting, false).await,
            Route::Reply { reply, keyboard } => self.reply(sender.chat, reply, keyboard).await,
            Route::Forward => {
                if let InboundEvent::Contact { sender, contact } = &event {
                    self.forward(sender, contact).await;
                }
            }
        }
    }

    async fn forward(&self, sender: &Sender, contact: &ContactRecord) {
        let Some(admin_chat) = self.admin.resolve().await else {
            self.reply(sender.chat, Reply::AdminUnresolved, false).await;
            return;
        };

        let outgoing = OutgoingContact {
            phone_number: contact.phone_number.clone(),
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            vcard: contact.vcard.clone(),
            caption: Some(forward_caption(sender)),
        };

        match self.gateway.send_contact(admin_chat, &outgoing).await {
            Ok(()) => {
                info!("Forwarded contact from {} to admin", sender.display());
                self.reply(sender.chat, Reply::ForwardConfirmed, false).await;
            }
            Err(e) => {
                error!(
                    "Failed to forward contact from {} to admin chat {}: {}",
                    sender.display(),
                    admin_chat,
                    e
                );
                let reply = if e.is_not_found() {
                    Reply::AdminNotFound
                } else {
                    Reply::ForwardFailed
                };
                self.reply(sender.chat, reply, false).await;
            }
        }
    }

    async fn reply(&self, chat: ChatId, reply: Reply, keyboard: bool) {
        let keyboard = keyboard.then(|| Keyboard::SharePhone {
            label: SHARE_PHONE_LABEL.to_string(),
        });
        let text = reply.text(self.admin.handle());
        if let Err(e) = self.gateway.send_text(chat, &text, keyboard).await {
            error!("Failed to send {:?} reply to chat {}: {}", reply, chat, e);
        }
    }
}
