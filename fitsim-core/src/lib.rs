//! # Fitting Simulator Core
//!
//! Attribute-mutation editing engine for a ship-fitting simulator.
//!
//! A mutation item ("mutaplasmid") attached to a fitted module lets the player
//! adjust some of its attributes within fixed multiplier bounds. This crate
//! owns the rules for editing those values one attribute at a time, plus the
//! total/active counters of multi-unit entities such as drone stacks.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────────┐   ┌──────────┐   ┌─────────────────┐
//! │ text input │──▶│ DebounceController│──▶│ validate │──▶│ MutationSession │
//! └────────────┘   └──────────────────┘   └──────────┘   └────────┬────────┘
//!                                                                 │ export
//!                  ┌──────────────────────┐                ┌──────▼──────┐
//!  count edits ───▶│ QuantitySynchronizer │── teardown ───▶│  provider   │
//!                  └──────────────────────┘                │ (external)  │
//!                                                          └─────────────┘
//! ```
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Multiplier`] | Fixed-point attribute factor, exact to 0.01% |
//! | [`AttributeRange`] | Bounds and display metadata of one adjustable attribute |
//! | [`validate()`] | Pure check of percentage text against a range |
//! | [`DebounceController`] | Single in-flight delayed validation |
//! | [`MutationSession`] | Selected mutation, values and editing cursor |
//! | [`QuantitySynchronizer`] | Total/active counter invariant and change flags |
//! | [`MutationEditor`] | Wires the above to the external store |

pub mod config;
pub mod debounce;
pub mod editor;
pub mod multiplier;
pub mod percentage;
pub mod provider;
pub mod quantity;
pub mod range;
pub mod session;
pub mod testing;
pub mod validate;

pub use config::{ConfigError, EditorConfig};
pub use debounce::{DebounceController, ValidationOutcome};
pub use editor::{EditorError, MutationEditor, StoredMutation};
pub use multiplier::Multiplier;
pub use percentage::{format_percentage, to_multiplier, to_percentage};
pub use provider::{
    AttributeCatalog, JsonCatalog, MutationStore, MutationUpdate, ProviderError,
    RecomputePipeline,
};
pub use quantity::{CountPair, QuantitySynchronizer, SyncReport};
pub use range::{AttributeId, AttributeRange, ItemId, RangeError};
pub use session::{MutatedAttributeValue, MutationSession, SessionError};
pub use validate::{validate, ValidationError, Verdict};
