//! Texts the bot sends back to users.

use crate::event::Sender;

pub const SHARE_PHONE_LABEL: &str = "📱 Share my phone number";

/// Every user-facing outcome of routing an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    AdminGreeting,
    ShareContactPrompt,
    AdminContactIgnored,
    ContactNotOwned,
    AdminUnresolved,
    AdminNotFound,
    ForwardFailed,
    ForwardConfirmed,
    AdminWaiting,
    UsageHint,
}

impl Reply {
    pub fn text(self, admin_handle: &str) -> String {
        match self {
            Reply::AdminGreeting => {
                "👋 Hello, admin! Every contact users send me will be forwarded here.".to_string()
            }
            Reply::ShareContactPrompt => format!(
                "🟢 Hi! Please send me the contact card you want to pass on to the administrator @{admin_handle}."
            ),
            Reply::AdminContactIgnored => {
                "✅ Got your card, but you are the administrator, so nothing is forwarded."
                    .to_string()
            }
            Reply::ContactNotOwned => {
                "❗️ Please share your own contact card, not someone else's.".to_string()
            }
            Reply::AdminUnresolved => {
                "❗️ Could not deliver the contact. The administrator has not started the bot yet. Please try again later."
                    .to_string()
            }
            Reply::AdminNotFound => format!(
                "❗️ Could not deliver the contact: administrator @{admin_handle} was not found. Please report this to the administrator."
            ),
            Reply::ForwardFailed => {
                "❗️ Could not forward the contact. Please try again later.".to_string()
            }
            Reply::ForwardConfirmed => {
                "✅ Your contact has been sent to the administrator.".to_string()
            }
            Reply::AdminWaiting => "⏳ Waiting for users to share their phone numbers.".to_string(),
            Reply::UsageHint => {
                "ℹ️ Please send only a contact card. Press /start to begin again.".to_string()
            }
        }
    }
}

/// Caption attached to a forwarded contact
pub fn forward_caption(sender: &Sender) -> String {
    format!("📩 New contact from {}", sender.display())
}
