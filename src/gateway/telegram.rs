use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    ButtonRequest, KeyboardButton, KeyboardMarkup, Recipient, ReplyParameters,
};
use teloxide::{ApiError, RequestError};
use tracing::warn;

use crate::error::GatewayError;
use crate::event::{is_start_command, ContactRecord, InboundEvent, Sender};
use crate::gateway::{self, Gateway, Keyboard, OutgoingContact};

/// Gateway backed by the Telegram Bot API
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn map_error(err: RequestError) -> GatewayError {
    match &err {
        RequestError::Api(ApiError::ChatNotFound | ApiError::UserNotFound) => {
            GatewayError::NotFound(err.to_string())
        }
        _ => GatewayError::Api(err.to_string()),
    }
}

fn keyboard_markup(keyboard: Keyboard) -> KeyboardMarkup {
    match keyboard {
        Keyboard::SharePhone { label } => KeyboardMarkup::new(vec![vec![
            KeyboardButton::new(label).request(ButtonRequest::Contact),
        ]])
        .resize_keyboard()
        .one_time_keyboard(),
    }
}

#[async_trait]
impl Gateway for TelegramGateway {
    async fn send_text(
        &self,
        chat: gateway::ChatId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), GatewayError> {
        let mut request = self.bot.send_message(ChatId(chat.0), text);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard_markup(keyboard));
        }
        request.await.map_err(map_error)?;
        Ok(())
    }

    async fn send_contact(
        &self,
        chat: gateway::ChatId,
        contact: &OutgoingContact,
    ) -> Result<(), GatewayError> {
        let mut request = self.bot.send_contact(
            ChatId(chat.0),
            contact.phone_number.clone(),
            contact.first_name.clone(),
        );
        if let Some(last_name) = &contact.last_name {
            request = request.last_name(last_name.clone());
        }
        if let Some(vcard) = &contact.vcard {
            request = request.vcard(vcard.clone());
        }
        let sent = request.await.map_err(map_error)?;

        // Contact cards carry no caption, so it goes out as a reply to the card.
        if let Some(caption) = &contact.caption {
            if let Err(e) = self
                .bot
                .send_message(ChatId(chat.0), caption.clone())
                .reply_parameters(ReplyParameters::new(sent.id))
                .await
            {
                warn!("Contact delivered to {} but caption failed: {}", chat, e);
            }
        }
        Ok(())
    }

    async fn chat_by_handle(&self, handle: &str) -> Result<gateway::ChatId, GatewayError> {
        let chat = self
            .bot
            .get_chat(Recipient::ChannelUsername(format!("@{handle}")))
            .await
            .map_err(map_error)?;
        Ok(gateway::ChatId(chat.id.0))
    }
}

/// Convert a Telegram message into a routable event.
///
/// Returns `None` for messages without a human sender (channel posts,
/// service messages from anonymous admins).
pub fn inbound_event(msg: &Message) -> Option<InboundEvent> {
    let user = msg.from.as_ref()?;
    let sender = Sender {
        user_id: user.id.0,
        handle: user.username.clone(),
        chat: gateway::ChatId(msg.chat.id.0),
    };

    if let Some(contact) = msg.contact() {
        return Some(InboundEvent::Contact {
            sender,
            contact: ContactRecord {
                phone_number: contact.phone_number.clone(),
                first_name: contact.first_name.clone(),
                last_name: contact.last_name.clone(),
                vcard: contact.vcard.clone(),
                owner_id: contact.user_id.map(|id| id.0),
            },
        });
    }

    match msg.text() {
        Some(text) if is_start_command(text) => Some(InboundEvent::Start { sender }),
        text => Some(InboundEvent::Other {
            sender,
            text: text.map(str::to_string),
        }),
    }
}
