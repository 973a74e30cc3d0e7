//! Test support: in-memory collaborators and range helpers.

use crate::multiplier::Multiplier;
use crate::provider::{MutationStore, MutationUpdate, ProviderError, RecomputePipeline};
use crate::range::{AttributeId, AttributeRange};

pub const ATTR_A: AttributeId = 20;
pub const ATTR_B: AttributeId = 552;
pub const ATTR_C: AttributeId = 158;

/// Build a range from decimal bounds. Panics on invalid bounds.
pub fn range(attribute_id: AttributeId, name: &str, min: f64, max: f64) -> AttributeRange {
    AttributeRange::new(
        attribute_id,
        name,
        Multiplier::from_f64(min),
        Multiplier::from_f64(max),
    )
    .expect("test ranges must have valid bounds")
}

/// Records every persisted update and recomputation request.
#[derive(Debug, Default)]
pub struct RecordingStore {
    pub updates: Vec<MutationUpdate>,
    pub recompute_count: usize,
    /// When set, `persist` fails with this message.
    pub fail_with: Option<String>,
}

impl RecordingStore {
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn last_update(&self) -> Option<&MutationUpdate> {
        self.updates.last()
    }
}

impl MutationStore for RecordingStore {
    fn persist(&mut self, update: &MutationUpdate) -> Result<(), ProviderError> {
        if let Some(message) = &self.fail_with {
            return Err(ProviderError::Storage(message.clone()));
        }
        self.updates.push(update.clone());
        Ok(())
    }
}

impl RecomputePipeline for RecordingStore {
    fn recompute(&mut self) {
        self.recompute_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_recording_store() {
        let mut store = RecordingStore::default();
        let update = MutationUpdate {
            item_id: 1,
            mutation_item: None,
            values: BTreeMap::new(),
        };
        store.persist(&update).unwrap();
        store.recompute();
        assert_eq!(store.last_update(), Some(&update));
        assert_eq!(store.recompute_count, 1);

        let mut failing = RecordingStore::failing("disk full");
        assert!(matches!(
            failing.persist(&update),
            Err(ProviderError::Storage(m)) if m == "disk full"
        ));
        assert!(failing.updates.is_empty());
    }
}
