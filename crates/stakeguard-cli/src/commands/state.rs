//! /state command - dump the conversation as JSON

use super::CommandResult;
use stakeguard_session::Session;

pub struct StateCommand;

impl StateCommand {
    pub fn execute(session: &Session) -> CommandResult {
        let state = session.state();
        let json = serde_json::json!({
            "sessionId": session.id(),
            "state": state,
        });
        match serde_json::to_string_pretty(&json) {
            Ok(text) => CommandResult::Message(text),
            Err(e) => CommandResult::Message(format!("Failed to serialize state: {}", e)),
        }
    }
}
