//! Slash commands for interactive mode

mod invoices;
mod state;

pub use invoices::InvoicesCommand;
pub use state::StateCommand;

use stakeguard_invoice::InvoiceLedger;
use stakeguard_session::{Action, Session};

/// Result of executing a slash command
#[derive(Debug)]
pub enum CommandResult {
    /// Apply an action to the conversation
    Dispatch(Action),
    /// Show a message to the user (not part of the conversation)
    Message(String),
    /// Discard the conversation and start a fresh one
    NewSession,
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(input: &str, session: &Session, ledger: &InvoiceLedger) -> Option<CommandResult> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "confirm" | "yes" | "y" => CommandResult::Dispatch(Action::Confirm),

        "edit" | "e" => CommandResult::Dispatch(Action::Edit),

        "back" => CommandResult::Dispatch(Action::Back),

        "stake" => {
            if args.is_empty() {
                CommandResult::Message("Usage: /stake <amount>".to_string())
            } else {
                CommandResult::Dispatch(Action::Commit {
                    stake_amount: args.to_string(),
                })
            }
        }

        "invoices" | "i" => InvoicesCommand::execute(ledger.summary(), &ledger.list()),

        "state" => StateCommand::execute(session),

        "new" | "n" => CommandResult::NewSession,

        "quit" | "exit" | "q" => CommandResult::Exit,

        _ => CommandResult::Unknown(command),
    })
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?        Show this help message
  /confirm, /y         Accept the extracted details
  /edit, /e            Discard the details and describe the work again
  /back                Return from staking to the review step
  /stake <amount>      Stake and create the invoice
  /invoices, /i        Show the invoice dashboard
  /state               Dump the conversation state as JSON
  /new, /n             Start a new invoice conversation
  /quit, /exit, /q     Exit stakeguard

Anything else you type is sent to the assistant.

Examples:
  Logo design. $500 due by June 10
  /confirm
  /stake 50"#
        .to_string()
}
