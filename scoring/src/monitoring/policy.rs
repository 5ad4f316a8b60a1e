use std::collections::HashSet;

use super::marker::{Component, Operation};

/// Where a timing marker was found for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerLevel {
    Operation,
    Component,
}

/// Identity of a marker: the address of its static, so two markers that
/// happen to share a name stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MarkerId(usize);

impl MarkerId {
    fn of<T>(marker: &T) -> Self {
        Self(std::ptr::from_ref(marker) as usize)
    }
}

/// Collects markers during startup. Frozen into a [`TimingPolicy`] by
/// [`TimingPolicyBuilder::build`]; the marker set cannot change afterwards.
#[derive(Debug, Default)]
pub struct TimingPolicyBuilder {
    components: HashSet<MarkerId>,
    operations: HashSet<MarkerId>,
}

impl TimingPolicyBuilder {
    /// Measure latency of every operation of `component`.
    pub fn monitor_component(mut self, component: &'static Component) -> Self {
        self.components.insert(MarkerId::of(component));
        self
    }

    /// Measure latency of one operation only.
    pub fn monitor_operation(mut self, operation: &'static Operation) -> Self {
        self.operations.insert(MarkerId::of(operation));
        self
    }

    pub fn build(self) -> TimingPolicy {
        TimingPolicy {
            components: self.components,
            operations: self.operations,
        }
    }
}

/// Decides per invocation whether latency is measured.
///
/// Operation markers win, then component markers; anything unmarked runs
/// with timing disabled. Immutable once built, so concurrent readers need no
/// locking.
#[derive(Debug, Clone, Default)]
pub struct TimingPolicy {
    components: HashSet<MarkerId>,
    operations: HashSet<MarkerId>,
}

impl TimingPolicy {
    pub fn builder() -> TimingPolicyBuilder {
        TimingPolicyBuilder::default()
    }

    /// Policy with no markers at all.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn resolve(&self, operation: &Operation) -> Option<MarkerLevel> {
        if self.operations.contains(&MarkerId::of(operation)) {
            return Some(MarkerLevel::Operation);
        }
        if self.components.contains(&MarkerId::of(operation.component)) {
            return Some(MarkerLevel::Component);
        }
        None
    }

    pub fn is_timing_enabled(&self, operation: &Operation) -> bool {
        self.resolve(operation).is_some()
    }
}
