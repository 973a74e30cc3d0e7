//! The editing surface for one fitted item's mutation.
//!
//! ```text
//! input(text) ──▶ DebounceController ──▶ validate ──▶ watch::Receiver (UI hints)
//!                                                        │
//! confirm() ──▶ validate current text ──▶ MutationSession::commit ──▶ MutationStore
//! ```
//!
//! Confirmation always validates the text currently in the field instead of
//! reusing the last debounced verdict, so a verdict for older text can never
//! be committed.

use crate::config::EditorConfig;
use crate::debounce::{DebounceController, ValidationOutcome};
use crate::multiplier::Multiplier;
use crate::provider::{AttributeCatalog, MutationStore, MutationUpdate, ProviderError};
use crate::range::{AttributeId, ItemId};
use crate::session::{MutationSession, SessionError};
use crate::validate::Verdict;
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::watch;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("Cannot confirm {text:?}")]
    NotConfirmable { text: String, verdict: Verdict },
}

/// Persisted mutation state handed back by the store when an item is reopened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMutation {
    pub mutation_item: ItemId,
    pub values: BTreeMap<AttributeId, Multiplier>,
}

/// Input field state while one attribute is open.
struct OpenInput {
    attribute_id: AttributeId,
    text: String,
    debounce: DebounceController,
}

pub struct MutationEditor<S: MutationStore> {
    item_id: ItemId,
    session: MutationSession,
    store: S,
    config: EditorConfig,
    input: Option<OpenInput>,
}

impl<S: MutationStore> MutationEditor<S> {
    pub fn new(item_id: ItemId, store: S, config: EditorConfig) -> Self {
        Self {
            item_id,
            session: MutationSession::new(),
            store,
            config,
            input: None,
        }
    }

    /// Reopen an item, restoring the mutation it was saved with.
    pub fn open(
        item_id: ItemId,
        store: S,
        config: EditorConfig,
        catalog: &impl AttributeCatalog,
        stored: Option<&StoredMutation>,
    ) -> Result<Self, EditorError> {
        let mut editor = Self::new(item_id, store, config);
        if let Some(stored) = stored {
            let ranges = catalog.mutable_attributes(stored.mutation_item)?;
            editor.session = MutationSession::restore(stored.mutation_item, ranges, &stored.values);
        }
        Ok(editor)
    }

    /// Attach `mutation_item`, discarding any previous mutation values.
    #[instrument(skip_all, name = "select_mutation", fields(item = self.item_id))]
    pub fn select_mutation_item(
        &mut self,
        mutation_item: ItemId,
        catalog: &impl AttributeCatalog,
    ) -> Result<(), EditorError> {
        let ranges = catalog.mutable_attributes(mutation_item)?;
        self.input = None;
        self.session.select_mutation_item(mutation_item, ranges);
        self.persist()
    }

    /// Open the input field for one attribute. The receiver yields debounced
    /// verdicts for the text typed into it.
    pub fn begin_editing(
        &mut self,
        attribute_id: AttributeId,
    ) -> Result<watch::Receiver<Option<ValidationOutcome>>, EditorError> {
        if self.session.selected_mutation_item().is_none() {
            return Err(SessionError::NoSelection.into());
        }
        self.session.begin_editing(attribute_id)?;

        let range = self
            .session
            .editing_range()
            .cloned()
            .ok_or(SessionError::UnknownAttribute(attribute_id))?;
        let debounce = DebounceController::from_config(range, &self.config);
        let receiver = debounce.subscribe();
        self.input = Some(OpenInput {
            attribute_id,
            text: String::new(),
            debounce,
        });
        Ok(receiver)
    }

    /// The user changed the text in the open input field.
    pub fn input(&mut self, text: &str) -> Result<(), EditorError> {
        let input = self.input.as_mut().ok_or(SessionError::NoActiveEdit)?;
        input.text = text.to_string();
        input.debounce.submit(text);
        Ok(())
    }

    /// Whether the last debounced verdict allows confirming.
    pub fn is_confirmable(&self) -> bool {
        self.input
            .as_ref()
            .is_some_and(|input| input.debounce.is_confirmable())
    }

    /// Commit the text in the open field. On an invalid entry the field stays open.
    #[instrument(skip_all, name = "confirm_mutation", fields(item = self.item_id))]
    pub fn confirm(&mut self) -> Result<Multiplier, EditorError> {
        let input = self.input.as_mut().ok_or(SessionError::NoActiveEdit)?;
        let text = input.text.clone();
        let outcome = input.debounce.validate_now(&text);

        let value = match outcome.verdict {
            Verdict::Valid(value) => value,
            verdict => return Err(EditorError::NotConfirmable { text, verdict }),
        };

        self.session.commit_editing_value(value)?;
        if let Some(input) = self.input.take() {
            log::info!(
                "Item {}: attribute {} set to {}",
                self.item_id,
                input.attribute_id,
                value
            );
        }

        if self.config.persist_on_commit {
            self.persist()?;
        }
        Ok(value)
    }

    /// Close the input field without changing any value.
    pub fn cancel_editing(&mut self) {
        self.input = None;
        self.session.cancel_editing();
    }

    /// Detach the mutation from the item and persist the removal.
    pub fn remove_mutation(&mut self) -> Result<(), EditorError> {
        self.input = None;
        self.session.clear_mutation();
        self.persist()
    }

    /// Snapshot handed to the store.
    pub fn update(&self) -> MutationUpdate {
        MutationUpdate {
            item_id: self.item_id,
            mutation_item: self.session.selected_mutation_item(),
            values: self.session.export_mutated_values(),
        }
    }

    pub fn persist(&mut self) -> Result<(), EditorError> {
        let update = self.update();
        self.store.persist(&update)?;
        log::debug!("Persisted mutation for item {}: {:?}", self.item_id, update);
        Ok(())
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn session(&self) -> &MutationSession {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn editing_text(&self) -> Option<&str> {
        self.input.as_ref().map(|input| input.text.as_str())
    }
}
