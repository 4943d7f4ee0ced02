//! Session event types

use serde::{Deserialize, Serialize};
use stakeguard_invoice::Invoice;

use crate::conversation::{ChatMessage, ConversationState, Step};

/// Events emitted while a session processes actions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A message was added to the transcript
    MessageAppended { message: ChatMessage },

    /// The conversation moved to another step
    StepChanged { from: Step, to: Step },

    /// An extraction or commit went in flight
    ProcessingStarted,

    /// The in-flight extraction or commit finished
    ProcessingFinished,

    /// An invoice was committed and recorded
    InvoiceCreated { invoice: Invoice },

    /// No further actions will be accepted
    Closed,
}

impl SessionEvent {
    /// Check if this is a terminal event
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::Closed)
    }

    /// Events describing the change from `before` to `after`, in the order a
    /// renderer should apply them.
    pub(crate) fn diff(before: &ConversationState, after: &ConversationState) -> Vec<SessionEvent> {
        let mut events: Vec<SessionEvent> = after
            .messages()
            .iter()
            .skip(before.messages().len())
            .cloned()
            .map(|message| SessionEvent::MessageAppended { message })
            .collect();

        if before.step() != after.step() {
            events.push(SessionEvent::StepChanged {
                from: before.step(),
                to: after.step(),
            });
        }
        match (before.is_processing(), after.is_processing()) {
            (false, true) => events.push(SessionEvent::ProcessingStarted),
            (true, false) => events.push(SessionEvent::ProcessingFinished),
            _ => {}
        }
        events
    }

    pub(crate) fn invoice_created(invoice: Invoice) -> Self {
        SessionEvent::InvoiceCreated { invoice }
    }
}
