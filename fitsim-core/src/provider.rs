//! Collaborators the editing engine talks to but does not own.
//!
//! - [`AttributeCatalog`]: which attributes a mutation item adjusts, and by how much.
//! - [`MutationStore`]: persists the mutation attached to a fitted item.
//! - [`RecomputePipeline`]: recalculates ship attributes after counts change.
//!
//! [`JsonCatalog`] is a file-backed catalog for headless use.

use crate::multiplier::Multiplier;
use crate::range::{AttributeId, AttributeRange, ItemId, RangeError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Unknown mutation item {0}")]
    UnknownItem(ItemId),
    #[error("Invalid attribute range: {0}")]
    InvalidRange(#[from] RangeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Snapshot of the mutation attached to one fitted item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationUpdate {
    pub item_id: ItemId,
    pub mutation_item: Option<ItemId>,
    pub values: BTreeMap<AttributeId, Multiplier>,
}

pub trait AttributeCatalog {
    /// Adjustable attributes of `mutation_item`, in display order.
    fn mutable_attributes(&self, mutation_item: ItemId)
        -> Result<Vec<AttributeRange>, ProviderError>;
}

pub trait MutationStore {
    fn persist(&mut self, update: &MutationUpdate) -> Result<(), ProviderError>;
}

pub trait RecomputePipeline {
    fn recompute(&mut self);
}

/// Catalog loaded from JSON: `{ "<mutation item id>": [AttributeRange, ...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonCatalog {
    mutations: HashMap<ItemId, Vec<AttributeRange>>,
}

impl JsonCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate every range. One bad range rejects the whole catalog.
    pub fn from_json_str(json: &str) -> Result<Self, ProviderError> {
        let raw: HashMap<ItemId, Vec<AttributeRange>> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for (mutation_item, ranges) in raw {
            let ranges = ranges
                .into_iter()
                .map(AttributeRange::validated)
                .collect::<Result<Vec<_>, _>>()?;
            catalog.mutations.insert(mutation_item, ranges);
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, ProviderError> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&json)?;
        log::info!(
            "Loaded {} mutation items from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn with_mutation(mut self, mutation_item: ItemId, ranges: Vec<AttributeRange>) -> Self {
        self.mutations.insert(mutation_item, ranges);
        self
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

impl AttributeCatalog for JsonCatalog {
    fn mutable_attributes(
        &self,
        mutation_item: ItemId,
    ) -> Result<Vec<AttributeRange>, ProviderError> {
        self.mutations
            .get(&mutation_item)
            .cloned()
            .ok_or(ProviderError::UnknownItem(mutation_item))
    }
}
