//! The chat -> review -> stake state machine.
//!
//! Every transition is a pure function from one [`ConversationState`] to the
//! next. Work that has to leave the process (extraction, commit) is returned as
//! an [`Effect`]; the state is marked as processing until the effect's outcome
//! is fed back through [`ConversationState::resolve_extraction`] or
//! [`ConversationState::resolve_commit`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stakeguard_invoice::{ExtractedInvoice, Invoice};

use crate::{
    commit::{CommitError, CommitReceipt, CommitRequest},
    conversation::{ChatMessage, ConversationState, Step},
    error::{Error, Result},
};

/// How a complete extraction is confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmMode {
    /// Move to `review` as soon as all fields are found
    #[default]
    Immediate,
    /// Stay in `chat` until the user answers "yes"/"correct"
    FreeText,
}

/// Controller settings
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub confirm_mode: ConfirmMode,
    /// Name of the staked token in prompts
    pub stake_unit: String,
    /// Fraction of the invoice amount suggested as stake
    pub recommended_stake_ratio: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            confirm_mode: ConfirmMode::Immediate,
            stake_unit: "trbtc".to_string(),
            recommended_stake_ratio: 0.1,
        }
    }
}

/// User input to the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Free-text chat message
    SendMessage { text: String },
    /// Accept the extracted details
    Confirm,
    /// Discard the extracted details and restate them
    Edit,
    /// Return from `stake` to `review`
    Back,
    /// Stake and create the invoice
    Commit { stake_amount: String },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SendMessage { .. } => "send_message",
            Action::Confirm => "confirm",
            Action::Edit => "edit",
            Action::Back => "back",
            Action::Commit { .. } => "commit",
        }
    }
}

/// Outside work requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Run the extractor on the user's message
    Extract { text: String },
    /// Submit the invoice through the commit boundary
    Commit {
        invoice: Invoice,
        request: CommitRequest,
    },
}

/// Successor state plus the effect (if any) it is waiting on
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: ConversationState,
    pub effect: Option<Effect>,
}

const CONFIRMED_BY_TEXT: &str = "Perfect! Let's proceed to creating your invoice. You'll need to stake some {unit} as a guarantee that you'll fulfill the work.";
const RETRY_DETAILS: &str =
    "Let's try again. Please provide the service details, amount, and deadline for your invoice.";
const REVISE_DETAILS: &str =
    "Let's revise the details. Please provide the updated service information, amount, and deadline.";
const INVALID_STAKE: &str = "Please enter a valid stake amount.";
const COMMIT_SUCCEEDED: &str = "Success! Your invoice has been created and added to your dashboard. You can now send it to your client.";

impl ConversationState {
    /// Apply a user action.
    ///
    /// Rejected without any change while an effect is in flight or after the
    /// session has closed.
    pub fn apply(&self, action: Action, config: &ControllerConfig, today: NaiveDate) -> Result<Transition> {
        if self.closed {
            return Err(Error::Closed);
        }
        if self.processing {
            return Err(Error::Busy);
        }

        let mut next = self.clone();
        let effect = match (self.step, action) {
            (Step::Chat, Action::SendMessage { text }) => next.on_chat_message(text, config)?,
            // Confirm/Edit buttons shown under a free-text confirmation prompt
            (Step::Chat, Action::Confirm) if self.extracted_data.is_some() => {
                next.enter_stake(config);
                None
            }
            (Step::Chat, Action::Edit) if self.extracted_data.is_some() => {
                next.revise();
                None
            }
            (Step::Review, Action::Confirm) => {
                next.enter_stake(config);
                None
            }
            (Step::Review, Action::Edit) => {
                next.revise();
                None
            }
            (Step::Stake, Action::Commit { stake_amount }) => next.on_commit(stake_amount, config, today)?,
            (Step::Stake, Action::Back) => {
                next.step = Step::Review;
                None
            }
            (step, action) => {
                return Err(Error::InvalidAction {
                    action: action.name(),
                    step,
                });
            }
        };

        tracing::debug!(
            "Transition {} -> {} (effect: {})",
            self.step,
            next.step,
            effect.is_some()
        );
        Ok(Transition { state: next, effect })
    }

    /// Apply the outcome of an [`Effect::Extract`].
    ///
    /// A transport failure is reported in the transcript and leaves the
    /// conversation where it was.
    pub fn resolve_extraction(
        &self,
        outcome: stakeguard_invoice::Result<ExtractedInvoice>,
        config: &ControllerConfig,
    ) -> Result<ConversationState> {
        if !self.processing {
            return Err(Error::NothingInFlight);
        }
        let mut next = self.clone();
        next.processing = false;

        match outcome {
            Ok(extracted) if extracted.is_complete() => {
                next.say(summary_message(&extracted));
                next.extracted_data = Some(extracted);
                match config.confirm_mode {
                    ConfirmMode::Immediate => next.step = Step::Review,
                    ConfirmMode::FreeText => next.push(ChatMessage::action()),
                }
            }
            Ok(extracted) => next.say(missing_fields_message(&extracted)),
            Err(e) => next.say(format!(
                "Sorry, I couldn't extract the invoice details right now ({}). Please try again.",
                e
            )),
        }
        Ok(next)
    }

    /// Apply the outcome of an [`Effect::Commit`].
    ///
    /// Success closes the session; a rejection keeps it in `stake` so the
    /// user can retry.
    pub fn resolve_commit(&self, outcome: std::result::Result<CommitReceipt, CommitError>) -> Result<ConversationState> {
        if !self.processing {
            return Err(Error::NothingInFlight);
        }
        let mut next = self.clone();
        next.processing = false;

        match outcome {
            Ok(_) => {
                next.say(COMMIT_SUCCEEDED);
                next.closed = true;
            }
            Err(e) => next.say(format!(
                "The transaction failed: {}. You can adjust the stake amount and try again.",
                e.reason
            )),
        }
        Ok(next)
    }

    fn on_chat_message(&mut self, text: String, config: &ControllerConfig) -> Result<Option<Effect>> {
        if text.trim().is_empty() {
            return Err(Error::EmptyMessage);
        }
        self.push(ChatMessage::user(text.clone()));

        if self.extracted_data.is_none() {
            self.processing = true;
            return Ok(Some(Effect::Extract { text }));
        }

        let lower = text.to_lowercase();
        if lower.contains("yes") || lower.contains("correct") {
            self.say(CONFIRMED_BY_TEXT.replace("{unit}", &config.stake_unit));
            self.step = Step::Review;
        } else {
            self.extracted_data = None;
            self.say(RETRY_DETAILS);
        }
        Ok(None)
    }

    fn enter_stake(&mut self, config: &ControllerConfig) {
        let amount = self
            .extracted_data
            .as_ref()
            .and_then(|e| e.amount)
            .unwrap_or_default();
        self.say(format!(
            "Please enter the amount of {unit} you want to stake for this invoice. We recommend staking at least {pct}% of the invoice value ({recommended:.3} {unit}).",
            unit = config.stake_unit,
            pct = percent(config.recommended_stake_ratio),
            recommended = amount * config.recommended_stake_ratio,
        ));
        self.step = Step::Stake;
    }

    fn revise(&mut self) {
        self.extracted_data = None;
        self.step = Step::Chat;
        self.say(REVISE_DETAILS);
    }

    fn on_commit(&mut self, stake_amount: String, config: &ControllerConfig, today: NaiveDate) -> Result<Option<Effect>> {
        self.stake_amount = stake_amount;

        let Some(stake) = parse_stake(&self.stake_amount) else {
            self.say(INVALID_STAKE);
            return Ok(None);
        };
        let Some(extracted) = self.extracted_data.as_ref() else {
            return Err(Error::InvalidAction {
                action: "commit",
                step: self.step,
            });
        };

        let invoice = Invoice::from_extracted(extracted, stake, today);
        let request = CommitRequest::new(extracted, stake, today);
        self.say(format!(
            "Great! I'm creating your invoice and staking {} {}...",
            self.stake_amount.trim(),
            config.stake_unit
        ));
        self.processing = true;
        Ok(Some(Effect::Commit { invoice, request }))
    }
}

/// A stake must be a finite decimal greater than zero.
pub fn parse_stake(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// `ratio` as a percentage, rounded to two decimals so `0.07` prints as `7`
fn percent(ratio: f64) -> f64 {
    (ratio * 10_000.0).round() / 100.0
}

fn summary_message(extracted: &ExtractedInvoice) -> String {
    format!(
        "Great! I've extracted the following details:\n\n\
         - Service: {}\n\
         - Description: {}\n\
         - Amount: ${}\n\
         - Deadline: {}\n\n\
         Is this correct? If yes, we can proceed to creating the invoice. If not, please provide the correct information.",
        extracted.title,
        extracted.description,
        extracted.amount.unwrap_or_default(),
        extracted.deadline.as_deref().unwrap_or_default(),
    )
}

fn missing_fields_message(extracted: &ExtractedInvoice) -> String {
    let mut message = String::from("I need a bit more information. Could you please provide:\n\n");
    for field in extracted.missing_fields() {
        message.push_str("- ");
        message.push_str(field.prompt());
        message.push('\n');
    }
    message
}
