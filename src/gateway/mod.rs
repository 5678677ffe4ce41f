pub mod telegram;

use async_trait::async_trait;

use crate::error::GatewayError;

/// Platform chat identifier used to address outbound messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reply keyboard attached to an outgoing text message
#[derive(Debug, Clone, PartialEq)]
pub enum Keyboard {
    /// One-shot button that asks the client to share its own phone number
    SharePhone { label: String },
}

/// Contact card sent to a chat
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingContact {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub vcard: Option<String>,
    pub caption: Option<String>,
}

/// Outbound capabilities of the bot platform consumed by the router
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), GatewayError>;

    /// Send a contact card. The caption may go out as a separate message
    /// replying to the card; failing to send it does not fail the call.
    async fn send_contact(&self, chat: ChatId, contact: &OutgoingContact)
        -> Result<(), GatewayError>;

    /// Look up a chat by its public handle (without the leading `@`)
    async fn chat_by_handle(&self, handle: &str) -> Result<ChatId, GatewayError>;
}
