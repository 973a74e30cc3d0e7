//! Total/active counters for multi-unit entities such as drone stacks.
//!
//! Invariant: `total >= 1` and `0 <= active <= min(total, cap)`, where `cap`
//! comes from the simulation context (e.g. drone bandwidth or control range)
//! and may change between edits.
//!
//! Recomputing ship attributes is expensive, so edits only record what changed.
//! The caller decides on [`QuantitySynchronizer::teardown`] whether a
//! recomputation is needed.

use crate::provider::RecomputePipeline;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountPair {
    total: u32,
    active: u32,
}

impl CountPair {
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn active(&self) -> u32 {
        self.active
    }
}

/// What changed during one editing session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub total_changed: bool,
    /// Compared with the active count at construction, not with the previous edit.
    pub active_changed_from_baseline: bool,
}

impl SyncReport {
    pub fn needs_recompute(&self) -> bool {
        self.total_changed || self.active_changed_from_baseline
    }
}

#[derive(Debug, Clone)]
pub struct QuantitySynchronizer {
    counts: CountPair,
    cap: u32,
    baseline_active: u32,
    total_changed: bool,
}

impl QuantitySynchronizer {
    /// Start an editing session. Inputs are clamped into the invariant and the
    /// clamped active count becomes the baseline.
    pub fn new(total: u32, active: u32, cap: u32) -> Self {
        let total = total.max(1);
        let active = active.min(total).min(cap);
        Self {
            counts: CountPair { total, active },
            cap,
            baseline_active: active,
            total_changed: false,
        }
    }

    pub fn counts(&self) -> CountPair {
        self.counts
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn baseline_active(&self) -> u32 {
        self.baseline_active
    }

    /// Upper bound for the active count right now.
    pub fn max_active(&self) -> u32 {
        self.counts.total.min(self.cap)
    }

    /// Set the total quantity. Values below 1 are raised to 1; active is
    /// pulled down if it no longer fits.
    pub fn set_total(&mut self, new_total: i64) {
        let total = clamp_to_u32(new_total).max(1);
        self.counts.total = total;
        self.counts.active = self.counts.active.min(self.max_active());
        self.total_changed = true;
        log::debug!(
            "Quantity set to {} (active {})",
            self.counts.total,
            self.counts.active
        );
    }

    /// Set the active count, clamped into `[0, min(total, cap)]`.
    pub fn set_active(&mut self, new_active: i64) {
        let requested = clamp_to_u32(new_active);
        let active = requested.min(self.max_active());
        if active != requested {
            log::debug!(
                "Active count {} clamped to {} (total {}, cap {})",
                new_active,
                active,
                self.counts.total,
                self.cap
            );
        }
        self.counts.active = active;
    }

    /// The surrounding simulation changed how many units may be active.
    pub fn set_active_cap(&mut self, cap: u32) {
        self.cap = cap;
        self.counts.active = self.counts.active.min(self.max_active());
    }

    pub fn report(&self) -> SyncReport {
        SyncReport {
            total_changed: self.total_changed,
            active_changed_from_baseline: self.counts.active != self.baseline_active,
        }
    }

    /// Close the editing session, recomputing ship attributes only if
    /// something actually changed.
    pub fn teardown(self, pipeline: &mut impl RecomputePipeline) -> SyncReport {
        let report = self.report();
        if report.needs_recompute() {
            log::info!(
                "Counts changed ({:?}); recomputing ship attributes",
                report
            );
            pipeline.recompute();
        }
        report
    }
}

fn clamp_to_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingStore;
    use proptest::prelude::*;

    #[test]
    fn test_shrinking_total_pulls_active_down() {
        let mut sync = QuantitySynchronizer::new(10, 8, 10);
        sync.set_total(5);
        assert_eq!(sync.counts().total(), 5);
        assert_eq!(sync.counts().active(), 5);
        assert!(sync.report().total_changed);

        // Active is now 5 against a baseline of 8
        sync.set_active(5);
        assert!(sync.report().active_changed_from_baseline);
    }

    #[test]
    fn test_growing_total_keeps_active() {
        let mut sync = QuantitySynchronizer::new(5, 3, 10);
        sync.set_total(8);
        assert_eq!(sync.counts().active(), 3);
        assert!(!sync.report().active_changed_from_baseline);
    }

    #[test]
    fn test_set_total_always_marks_changed() {
        let mut sync = QuantitySynchronizer::new(5, 3, 10);
        assert!(!sync.report().total_changed);
        sync.set_total(5);
        assert!(sync.report().total_changed);
    }

    #[test]
    fn test_set_active_clamps() {
        let mut sync = QuantitySynchronizer::new(10, 2, 5);
        sync.set_active(9);
        assert_eq!(sync.counts().active(), 5);
        sync.set_active(-3);
        assert_eq!(sync.counts().active(), 0);
        sync.set_total(0);
        assert_eq!(sync.counts().total(), 1);
    }

    #[test]
    fn test_returning_to_baseline_is_not_a_change() {
        let mut sync = QuantitySynchronizer::new(10, 4, 10);
        sync.set_active(7);
        assert!(sync.report().active_changed_from_baseline);
        sync.set_active(4);
        assert!(!sync.report().active_changed_from_baseline);
    }

    #[test]
    fn test_cap_change_clamps_active() {
        let mut sync = QuantitySynchronizer::new(10, 8, 10);
        sync.set_active_cap(3);
        assert_eq!(sync.counts().active(), 3);
        assert_eq!(sync.max_active(), 3);
        assert!(sync.report().active_changed_from_baseline);
    }

    #[test]
    fn test_new_clamps_inputs() {
        let sync = QuantitySynchronizer::new(0, 7, 5);
        assert_eq!(sync.counts().total(), 1);
        assert_eq!(sync.counts().active(), 1);
        assert_eq!(sync.baseline_active(), 1);
    }

    #[test]
    fn test_teardown_recomputes_only_on_change() {
        let mut pipeline = RecordingStore::default();

        let untouched = QuantitySynchronizer::new(5, 5, 5);
        let report = untouched.teardown(&mut pipeline);
        assert!(!report.needs_recompute());
        assert_eq!(pipeline.recompute_count, 0);

        let mut edited = QuantitySynchronizer::new(5, 5, 5);
        edited.set_active(2);
        let report = edited.teardown(&mut pipeline);
        assert!(report.needs_recompute());
        assert_eq!(pipeline.recompute_count, 1);
    }

    #[derive(Debug, Clone)]
    enum Edit {
        Total(i64),
        Active(i64),
        Cap(u32),
    }

    fn edit() -> impl Strategy<Value = Edit> {
        prop_oneof![
            any::<i64>().prop_map(Edit::Total),
            any::<i64>().prop_map(Edit::Active),
            (0u32..50).prop_map(Edit::Cap),
        ]
    }

    proptest! {
        #[test]
        fn prop_counts_stay_consistent(
            total in 0u32..100,
            active in 0u32..100,
            cap in 0u32..100,
            edits in proptest::collection::vec(edit(), 1..40)
        ) {
            let mut sync = QuantitySynchronizer::new(total, active, cap);
            for edit in edits {
                match edit {
                    Edit::Total(t) => sync.set_total(t),
                    Edit::Active(a) => sync.set_active(a),
                    Edit::Cap(c) => sync.set_active_cap(c),
                }
                let counts = sync.counts();
                prop_assert!(counts.total() >= 1);
                prop_assert!(counts.active() <= counts.total().min(sync.cap()));
            }
        }
    }
}
