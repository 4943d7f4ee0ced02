//! Plain-text rendering of the conversation for the terminal

use stakeguard_session::{ChatMessage, Role, SessionEvent, Step};

/// How the Confirm/Edit buttons are shown in a terminal
pub const ACTION_HINT: &str = "[Confirm: /confirm] [Edit: /edit]";

/// Render a transcript entry. User messages are not echoed back.
pub fn render_message(message: &ChatMessage) -> Option<String> {
    match message.role {
        Role::User => None,
        Role::Assistant if message.is_action => Some(ACTION_HINT.to_string()),
        Role::Assistant => Some(message.content.clone()),
    }
}

pub fn render_step(step: Step) -> String {
    format!("== {} ==", step.title())
}

/// Render a session event, if it has anything to show
pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::MessageAppended { message } => render_message(message),
        SessionEvent::StepChanged { to, .. } => Some(render_step(*to)),
        SessionEvent::InvoiceCreated { invoice } => Some(format!(
            "[Invoice {} recorded: {} ${:.2}, stake {}]",
            crate::utils::short_id(&invoice.id),
            invoice.title,
            invoice.amount,
            invoice.stake_amount
        )),
        SessionEvent::Closed => {
            Some("Session complete. Type /new to create another invoice.".to_string())
        }
        SessionEvent::ProcessingStarted | SessionEvent::ProcessingFinished => None,
    }
}
