//! Conversation state: transcript, step, reviewed fields, and stake input.

use serde::{Deserialize, Serialize};
use stakeguard_invoice::ExtractedInvoice;
use std::fmt;

/// Opening assistant message of every session
pub const GREETING: &str = "Hi there! I'll help you create an invoice. Please tell me about the work or items you're providing, the amount, and the deadline for payment.";

/// Who wrote a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Placeholder for the Confirm/Edit buttons rather than text
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_action: bool,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            is_action: false,
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            is_action: false,
        }
    }

    /// Create the assistant action placeholder (Confirm/Edit)
    pub fn action() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            is_action: true,
        }
    }
}

/// Position in the chat -> review -> stake flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Chat,
    Review,
    Stake,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Chat => "chat",
            Step::Review => "review",
            Step::Stake => "stake",
        }
    }

    /// Heading shown for the step
    pub fn title(&self) -> &'static str {
        match self {
            Step::Chat => "AI Invoice Assistant",
            Step::Review => "Review Invoice Details",
            Step::Stake => "Stake to Create Invoice",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of one invoice-creation conversation.
///
/// Transitions never mutate a state in place: the controller clones it and
/// returns the successor. Messages are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    pub(crate) messages: Vec<ChatMessage>,
    pub(crate) step: Step,
    pub(crate) extracted_data: Option<ExtractedInvoice>,
    pub(crate) stake_amount: String,
    /// An extraction or commit is in flight
    pub(crate) processing: bool,
    /// The invoice was committed; no further actions are accepted
    pub(crate) closed: bool,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    /// Fresh conversation in the `chat` step, seeded with the greeting
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
            step: Step::Chat,
            extracted_data: None,
            stake_amount: String::new(),
            processing: false,
            closed: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn extracted_data(&self) -> Option<&ExtractedInvoice> {
        self.extracted_data.as_ref()
    }

    /// Last stake amount entered, as typed
    pub fn stake_amount(&self) -> &str {
        &self.stake_amount
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Most recent message, if any
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub(crate) fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub(crate) fn say(&mut self, content: impl Into<String>) {
        self.push(ChatMessage::assistant(content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_seeded() {
        let state = ConversationState::new();
        assert_eq!(state.step(), Step::Chat);
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].role, Role::Assistant);
        assert_eq!(state.messages()[0].content, GREETING);
        assert!(state.extracted_data().is_none());
        assert!(!state.is_processing());
        assert!(!state.is_closed());
    }

    #[test]
    fn test_message_serialization() {
        let value = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(value, serde_json::json!({ "role": "user", "content": "hi" }));

        let value = serde_json::to_value(ChatMessage::action()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "role": "assistant", "content": "", "isAction": true })
        );
    }

    #[test]
    fn test_state_serialization_keys() {
        let value = serde_json::to_value(ConversationState::new()).unwrap();
        assert_eq!(value["step"], serde_json::json!("chat"));
        assert_eq!(value["extractedData"], serde_json::Value::Null);
        assert_eq!(value["stakeAmount"], serde_json::json!(""));
    }
}
