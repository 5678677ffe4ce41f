use crate::gateway::ChatId;

/// Who sent an inbound message
#[derive(Debug, Clone, PartialEq)]
pub struct Sender {
    /// Numeric user id
    pub user_id: u64,
    /// Public handle without the leading `@`, if the user has one
    pub handle: Option<String>,
    /// Chat the message arrived in; replies go here
    pub chat: ChatId,
}

impl Sender {
    /// Case-insensitive handle comparison; `admin_handle` is already lowercase.
    pub fn is_admin(&self, admin_handle: &str) -> bool {
        self.handle
            .as_deref()
            .map(|handle| handle.trim_start_matches('@').to_lowercase() == admin_handle)
            .unwrap_or(false)
    }

    /// How the sender is named in a forward caption
    pub fn display(&self) -> String {
        match &self.handle {
            Some(handle) => format!("@{}", handle.trim_start_matches('@')),
            None => format!("id {}", self.user_id),
        }
    }
}

/// Contact card shared by a user
#[derive(Debug, Clone, PartialEq)]
pub struct ContactRecord {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub vcard: Option<String>,
    /// Account the card belongs to, when it belongs to a platform user
    pub owner_id: Option<u64>,
}

/// Inbound message, classified by kind
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Start {
        sender: Sender,
    },
    Contact {
        sender: Sender,
        contact: ContactRecord,
    },
    Other {
        sender: Sender,
        text: Option<String>,
    },
}

impl InboundEvent {
    pub fn sender(&self) -> &Sender {
        match self {
            InboundEvent::Start { sender }
            | InboundEvent::Contact { sender, .. }
            | InboundEvent::Other { sender, .. } => sender,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Start { .. } => "start",
            InboundEvent::Contact { .. } => "contact",
            InboundEvent::Other { .. } => "message",
        }
    }
}

/// True for `/start`, `/start@somebot` and `/start <payload>`
pub fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    let command = command.split('@').next().unwrap_or_default();
    command == "/start"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(handle: Option<&str>) -> Sender {
        Sender {
            user_id: 42,
            handle: handle.map(str::to_string),
            chat: ChatId(42),
        }
    }

    #[test]
    fn test_admin_match_ignores_case() {
        assert!(sender(Some("Ops_Admin")).is_admin("ops_admin"));
        assert!(sender(Some("ops_admin")).is_admin("ops_admin"));
        assert!(!sender(Some("ops_admin2")).is_admin("ops_admin"));
    }

    #[test]
    fn test_sender_without_handle_is_never_admin() {
        assert!(!sender(None).is_admin("ops_admin"));
        assert!(!sender(None).is_admin(""));
    }

    #[test]
    fn test_display_prefers_handle() {
        assert_eq!(sender(Some("ann_k")).display(), "@ann_k");
        assert_eq!(sender(None).display(), "id 42");
    }

    #[test]
    fn test_start_command_variants() {
        assert!(is_start_command("/start"));
        assert!(is_start_command("/start@contact_bot"));
        assert!(is_start_command("/start ref-123"));
        assert!(!is_start_command("/starts"));
        assert!(!is_start_command("start"));
        assert!(!is_start_command("hello /start"));
        assert!(!is_start_command(""));
    }
}
