//! Session driver: runs the controller's effects against real capabilities

use parking_lot::Mutex;
use std::sync::Arc;
use stakeguard_invoice::{Extractor, Invoice, InvoiceSink};
use tokio::sync::broadcast;

use crate::{
    commit::CommitBoundary,
    controller::{Action, ControllerConfig, Effect},
    conversation::{ChatMessage, ConversationState, Step},
    error::Result,
    events::SessionEvent,
};

/// What a single dispatched action produced
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Messages appended while handling the action, including effect results
    pub appended: Vec<ChatMessage>,
    /// Step after the action settled
    pub step: Step,
    pub closed: bool,
    /// The invoice recorded by a successful commit
    pub invoice: Option<Invoice>,
}

impl DispatchOutcome {
    fn settled(appended: Vec<ChatMessage>, state: &ConversationState, invoice: Option<Invoice>) -> Self {
        Self {
            appended,
            step: state.step(),
            closed: state.is_closed(),
            invoice,
        }
    }
}

/// One invoice-creation conversation.
///
/// The state lives behind a mutex that is only held while a transition is
/// computed, never across an extraction or commit. While an effect is in
/// flight the state is marked as processing, so a concurrent dispatch is
/// rejected with [`crate::Error::Busy`] instead of racing it.
///
/// Effects run on their own task. Dropping a `dispatch` future does not
/// cancel an extraction or commit that already started; the session still
/// settles once it finishes.
pub struct Session {
    id: String,
    inner: Arc<Inner>,
}

struct Inner {
    config: ControllerConfig,
    state: Mutex<ConversationState>,
    extractor: Arc<dyn Extractor>,
    committer: Arc<dyn CommitBoundary>,
    sink: Arc<dyn InvoiceSink>,
    event_tx: broadcast::Sender<SessionEvent>,
}

impl Session {
    /// Create a session seeded with the greeting
    pub fn new(
        config: ControllerConfig,
        extractor: Arc<dyn Extractor>,
        committer: Arc<dyn CommitBoundary>,
        sink: Arc<dyn InvoiceSink>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(ConversationState::new()),
                extractor,
                committer,
                sink,
                event_tx,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> ConversationState {
        self.inner.state.lock().clone()
    }

    /// Apply an action and run whatever effect it requests to completion.
    ///
    /// Invoice sink append happens only after the commit boundary succeeded.
    pub async fn dispatch(&self, action: Action) -> Result<DispatchOutcome> {
        let today = chrono::Utc::now().date_naive();
        tracing::debug!("Session {} dispatching {}", self.id, action.name());

        let (appended, after, effect) = {
            let mut state = self.inner.state.lock();
            let transition = state.apply(action, &self.inner.config, today)?;
            let after = transition.state.clone();
            let before = std::mem::replace(&mut *state, transition.state);
            let appended = after.messages()[before.messages().len()..].to_vec();
            self.inner.publish(&before, &after);
            (appended, after, transition.effect)
        };

        let Some(effect) = effect else {
            return Ok(DispatchOutcome::settled(appended, &after, None));
        };

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.run(effect, appended).await });
        match task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                // Only happens when the runtime is shutting down
                tracing::warn!("Session {} effect task cancelled: {}", self.id, e);
                let state = self.state();
                Ok(DispatchOutcome::settled(Vec::new(), &state, None))
            }
        }
    }

    /// Send a chat message
    pub async fn send_message(&self, text: impl Into<String>) -> Result<DispatchOutcome> {
        self.dispatch(Action::SendMessage { text: text.into() }).await
    }

    pub async fn confirm(&self) -> Result<DispatchOutcome> {
        self.dispatch(Action::Confirm).await
    }

    pub async fn edit(&self) -> Result<DispatchOutcome> {
        self.dispatch(Action::Edit).await
    }

    pub async fn back(&self) -> Result<DispatchOutcome> {
        self.dispatch(Action::Back).await
    }

    /// Stake `stake_amount` (as typed) and create the invoice
    pub async fn commit(&self, stake_amount: impl Into<String>) -> Result<DispatchOutcome> {
        self.dispatch(Action::Commit {
            stake_amount: stake_amount.into(),
        })
        .await
    }
}

impl Inner {
    /// Run an in-flight effect and feed its outcome back into the state.
    /// `appended` holds the messages the dispatching action already added.
    async fn run(&self, effect: Effect, mut appended: Vec<ChatMessage>) -> Result<DispatchOutcome> {
        match effect {
            Effect::Extract { text } => {
                let outcome = self.extractor.extract(&text).await;
                if let Err(e) = &outcome {
                    tracing::warn!("Extraction failed: {}", e);
                }
                let after = self.settle(&mut appended, |state| state.resolve_extraction(outcome, &self.config))?;
                Ok(DispatchOutcome::settled(appended, &after, None))
            }
            Effect::Commit { invoice, request } => {
                let outcome = self.committer.commit(&request).await;
                let committed = match &outcome {
                    Ok(receipt) => {
                        tracing::info!("Invoice {} committed ({})", invoice.id, receipt.reference);
                        true
                    }
                    Err(e) => {
                        tracing::warn!("Commit of invoice {} failed: {}", invoice.id, e);
                        false
                    }
                };
                let after = self.settle(&mut appended, |state| state.resolve_commit(outcome))?;

                if !committed {
                    return Ok(DispatchOutcome::settled(appended, &after, None));
                }
                self.sink.append(invoice.clone());
                let _ = self.event_tx.send(SessionEvent::invoice_created(invoice.clone()));
                let _ = self.event_tx.send(SessionEvent::Closed);
                Ok(DispatchOutcome::settled(appended, &after, Some(invoice)))
            }
        }
    }

    /// Replace the state with the resolution of the in-flight effect,
    /// collecting the messages the resolution added.
    fn settle(
        &self,
        appended: &mut Vec<ChatMessage>,
        resolve: impl FnOnce(&ConversationState) -> Result<ConversationState>,
    ) -> Result<ConversationState> {
        let mut state = self.state.lock();
        let next = resolve(&state)?;
        let before = std::mem::replace(&mut *state, next.clone());
        appended.extend_from_slice(&next.messages()[before.messages().len()..]);
        self.publish(&before, &next);
        Ok(next)
    }

    fn publish(&self, before: &ConversationState, after: &ConversationState) {
        for event in SessionEvent::diff(before, after) {
            let _ = self.event_tx.send(event);
        }
    }
}
