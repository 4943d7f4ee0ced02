//! Error types for stakeguard-session

use thiserror::Error;

use crate::conversation::Step;

/// Result type alias using stakeguard-session Error
pub type Result<T> = std::result::Result<T, Error>;

/// Actions the conversation refuses outright.
///
/// Extraction gaps, transport failures, invalid stakes and rejected commits
/// are not errors: they become assistant messages in the transcript.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An extraction or commit is still in flight
    #[error("Another request is still being processed")]
    Busy,

    /// The invoice was already committed
    #[error("Session is closed")]
    Closed,

    /// Blank user input
    #[error("Message is empty")]
    EmptyMessage,

    /// The action has no meaning in the current step
    #[error("Action '{action}' is not available in the {step} step")]
    InvalidAction { action: &'static str, step: Step },

    /// A completion arrived with nothing in flight
    #[error("No extraction or commit is in flight")]
    NothingInFlight,
}

impl Error {
    /// Whether retrying the same action later can succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Busy)
    }
}
