//! Key-manager telemetry trait.
//!
//! Defines a trait for recording security-relevant key-manager events so a
//! larger mesh stack can route them to its own metrics backend without this
//! crate depending on one. [`TracingTelemetry`] is the default
//! implementation, logging via `tracing`.

/// Key-manager telemetry recorder.
pub trait KeyManagerTelemetry: Send + Sync {
    /// A key-sequence rotation (manual or automatic) was accepted.
    fn record_rotation(&self, new_sequence: u32, automatic: bool);

    /// A manual sequence advance was rejected by the switch-guard check.
    fn record_guard_rejection(&self, requested_sequence: u32, hours_since_rotation: u32, guard_hours: u32);

    /// The master key was replaced.
    fn record_master_key_replaced(&self);

    /// A frame-counter increment crossed its stored threshold and triggered
    /// a persistence `Store()` call.
    fn record_persistence_trigger(&self, counter_name: &'static str, value: u32);
}

/// Default [`KeyManagerTelemetry`] that logs structured events via
/// `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl KeyManagerTelemetry for TracingTelemetry {
    fn record_rotation(&self, new_sequence: u32, automatic: bool) {
        tracing::info!(new_sequence, automatic, "key sequence rotated");
    }

    fn record_guard_rejection(&self, requested_sequence: u32, hours_since_rotation: u32, guard_hours: u32) {
        tracing::debug!(
            requested_sequence,
            hours_since_rotation,
            guard_hours,
            "key switch guard rejected premature rotation"
        );
    }

    fn record_master_key_replaced(&self) {
        tracing::warn!("master key replaced; all peer frame counters reset");
    }

    fn record_persistence_trigger(&self, counter_name: &'static str, value: u32) {
        tracing::trace!(counter_name, value, "frame counter crossed stored threshold, persisting");
    }
}
