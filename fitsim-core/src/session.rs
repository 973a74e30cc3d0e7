//! Mutation state for one item on the editing surface.
//!
//! A session tracks which mutation item is attached, the current multiplier of
//! every attribute it can adjust, and which attribute (if any) the user is
//! editing. Every value stored here lies inside its attribute's range: commits
//! re-check bounds rather than trusting the caller.
//!
//! Misuse (committing with nothing selected, editing an unknown attribute)
//! returns an error and leaves the session untouched.

use crate::multiplier::Multiplier;
use crate::range::{AttributeId, AttributeRange, ItemId};
use crate::validate::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No attribute is being edited")]
    NoActiveEdit,
    #[error("Attribute {0} is not adjusted by the selected mutation")]
    UnknownAttribute(AttributeId),
    #[error("Attribute {attribute_id}: {source}")]
    OutOfRange {
        attribute_id: AttributeId,
        source: ValidationError,
    },
    #[error("No mutation item selected")]
    NoSelection,
}

/// One adjustable attribute and its committed multiplier, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutatedAttributeValue {
    pub range: AttributeRange,
    pub current: Option<Multiplier>,
}

impl MutatedAttributeValue {
    pub fn attribute_id(&self) -> AttributeId {
        self.range.attribute_id()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationSession {
    selected: Option<ItemId>,
    attributes: Vec<MutatedAttributeValue>,
    editing: Option<AttributeId>,
}

impl MutationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the session a user left behind from persisted values.
    ///
    /// Stored entries for attributes the mutation no longer adjusts, or values
    /// outside the current bounds, are skipped with a warning. Everything else
    /// is reproduced exactly.
    pub fn restore(
        mutation_item: ItemId,
        ranges: Vec<AttributeRange>,
        stored: &BTreeMap<AttributeId, Multiplier>,
    ) -> Self {
        let mut session = Self::new();
        session.select_mutation_item(mutation_item, ranges);
        for (&attribute_id, &value) in stored {
            if let Err(e) = session.apply_stored_value(attribute_id, value) {
                log::warn!(
                    "Skipping stored value {} for mutation {}: {}",
                    value,
                    mutation_item,
                    e
                );
            }
        }
        session
    }

    /// Attach a mutation item. Replaces every attribute; none has a value yet.
    pub fn select_mutation_item(&mut self, mutation_item: ItemId, ranges: Vec<AttributeRange>) {
        log::debug!(
            "Selected mutation {} ({} attributes)",
            mutation_item,
            ranges.len()
        );
        self.selected = Some(mutation_item);
        self.attributes = ranges
            .into_iter()
            .map(|range| MutatedAttributeValue {
                range,
                current: None,
            })
            .collect();
        self.editing = None;
    }

    pub fn begin_editing(&mut self, attribute_id: AttributeId) -> Result<(), SessionError> {
        if self.find(attribute_id).is_none() {
            log::warn!("begin_editing: attribute {} not in session", attribute_id);
            return Err(SessionError::UnknownAttribute(attribute_id));
        }
        self.editing = Some(attribute_id);
        Ok(())
    }

    /// Store `value` for the attribute being edited and close the editor.
    ///
    /// On error nothing changes, including the editing cursor.
    pub fn commit_editing_value(&mut self, value: Multiplier) -> Result<(), SessionError> {
        let Some(attribute_id) = self.editing else {
            log::warn!("commit_editing_value: no attribute is being edited");
            return Err(SessionError::NoActiveEdit);
        };
        self.set_value(attribute_id, value)?;
        self.editing = None;
        Ok(())
    }

    pub fn cancel_editing(&mut self) {
        self.editing = None;
    }

    /// Detach the mutation entirely.
    pub fn clear_mutation(&mut self) {
        log::debug!("Cleared mutation {:?}", self.selected);
        self.selected = None;
        self.attributes.clear();
        self.editing = None;
    }

    /// Set a value without going through the editing cursor (used when loading).
    pub fn apply_stored_value(
        &mut self,
        attribute_id: AttributeId,
        value: Multiplier,
    ) -> Result<(), SessionError> {
        self.set_value(attribute_id, value)
    }

    /// Committed multipliers, keyed by attribute.
    pub fn export_mutated_values(&self) -> BTreeMap<AttributeId, Multiplier> {
        self.attributes
            .iter()
            .filter_map(|attr| attr.current.map(|value| (attr.attribute_id(), value)))
            .collect()
    }

    pub fn selected_mutation_item(&self) -> Option<ItemId> {
        self.selected
    }

    pub fn attributes(&self) -> &[MutatedAttributeValue] {
        &self.attributes
    }

    pub fn editing_attribute(&self) -> Option<AttributeId> {
        self.editing
    }

    /// Range of the attribute currently being edited.
    pub fn editing_range(&self) -> Option<&AttributeRange> {
        self.editing.and_then(|id| self.range_of(id))
    }

    pub fn range_of(&self, attribute_id: AttributeId) -> Option<&AttributeRange> {
        self.find(attribute_id).map(|attr| &attr.range)
    }

    pub fn value_of(&self, attribute_id: AttributeId) -> Option<Multiplier> {
        self.find(attribute_id).and_then(|attr| attr.current)
    }

    fn find(&self, attribute_id: AttributeId) -> Option<&MutatedAttributeValue> {
        self.attributes
            .iter()
            .find(|attr| attr.attribute_id() == attribute_id)
    }

    fn set_value(&mut self, attribute_id: AttributeId, value: Multiplier) -> Result<(), SessionError> {
        let attr = self
            .attributes
            .iter_mut()
            .find(|attr| attr.attribute_id() == attribute_id)
            .ok_or(SessionError::UnknownAttribute(attribute_id))?;

        if !attr.range.contains(value) {
            return Err(SessionError::OutOfRange {
                attribute_id,
                source: ValidationError::out_of_range(&attr.range),
            });
        }

        attr.current = Some(value);
        Ok(())
    }
}
