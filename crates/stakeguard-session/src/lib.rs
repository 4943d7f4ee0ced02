//! stakeguard-session: conversational invoice creation
//!
//! This crate provides the chat -> review -> stake state machine that turns a
//! conversation into a committed, staked invoice, and the session driver that
//! runs extraction and commit against pluggable capabilities.

pub mod commit;
pub mod controller;
pub mod conversation;
pub mod error;
pub mod events;
pub mod session;

pub use commit::{
    CommitBoundary, CommitError, CommitReceipt, CommitRequest, HttpCommitBoundary, SimulatedCommit,
};
pub use controller::{Action, ConfirmMode, ControllerConfig, Effect, Transition, parse_stake};
pub use conversation::{ChatMessage, ConversationState, GREETING, Role, Step};
pub use error::{Error, Result};
pub use events::SessionEvent;
pub use session::{DispatchOutcome, Session};
