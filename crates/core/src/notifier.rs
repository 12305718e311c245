//! Change-event bus contract.
//!
//! The key manager never holds a reference to a concrete event bus; it is
//! handed anything implementing [`Notifier`]. `ChangedFlags` mirrors
//! OpenThread's `OT_CHANGED_*` mask so a single `signal` call can report more
//! than one kind of change atomically (see `SetMasterKey`, which always
//! signals `MASTER_KEY | KEY_SEQUENCE_COUNTER` together).

use bitflags::bitflags;

bitflags! {
    /// Set of security-relevant state changes an observer can be told about.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChangedFlags: u8 {
        const MASTER_KEY           = 0b0000_0001;
        const PSKC                 = 0b0000_0010;
        const KEY_SEQUENCE_COUNTER = 0b0000_0100;
        const SECURITY_POLICY      = 0b0000_1000;
    }
}

/// Publish side of the change-event bus.
///
/// Implementations must be idempotent-safe for [`Notifier::signal_if_first`]:
/// once a given flag has ever been delivered via either method, later
/// `signal_if_first` calls for that flag are no-ops, but `has_signaled` keeps
/// reporting `true` regardless of which method most recently fired.
pub trait Notifier {
    /// Unconditionally deliver `flags` to subscribers.
    fn signal(&mut self, flags: ChangedFlags);

    /// Deliver `flags`, but only for the bits that have never been signalled
    /// before (by either `signal` or `signal_if_first`) since construction.
    fn signal_if_first(&mut self, flags: ChangedFlags);

    /// True if `flags` (all of them) have been delivered at least once.
    fn has_signaled(&self, flags: ChangedFlags) -> bool;
}

/// Reference `Notifier` backed by an in-memory "ever signalled" mask.
///
/// Suitable for single-node test harnesses and as a starting point for a
/// real pub/sub bridge; it does not itself fan out to any subscribers.
#[derive(Debug, Default, Clone)]
pub struct InMemoryNotifier {
    ever_signalled: ChangedFlags,
    last: ChangedFlags,
    signal_count: u32,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self {
            ever_signalled: ChangedFlags::empty(),
            last: ChangedFlags::empty(),
            signal_count: 0,
        }
    }

    /// Flags delivered by the most recent `signal`/`signal_if_first` call.
    pub fn last_signalled(&self) -> ChangedFlags {
        self.last
    }

    /// Total number of times `signal`/`signal_if_first` actually delivered
    /// a non-empty set of flags. Tests use this to assert "exactly once".
    pub fn signal_count(&self) -> u32 {
        self.signal_count
    }
}

impl Notifier for InMemoryNotifier {
    fn signal(&mut self, flags: ChangedFlags) {
        if flags.is_empty() {
            return;
        }
        self.ever_signalled |= flags;
        self.last = flags;
        self.signal_count += 1;
    }

    fn signal_if_first(&mut self, flags: ChangedFlags) {
        let fresh = flags - self.ever_signalled;
        if fresh.is_empty() {
            return;
        }
        self.ever_signalled |= fresh;
        self.last = fresh;
        self.signal_count += 1;
    }

    fn has_signaled(&self, flags: ChangedFlags) -> bool {
        self.ever_signalled.contains(flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_if_first_fires_once_per_flag() {
        let mut n = InMemoryNotifier::new();
        assert!(!n.has_signaled(ChangedFlags::PSKC));

        n.signal_if_first(ChangedFlags::PSKC);
        assert_eq!(n.signal_count(), 1);
        assert!(n.has_signaled(ChangedFlags::PSKC));

        // Second call for the same flag is a no-op.
        n.signal_if_first(ChangedFlags::PSKC);
        assert_eq!(n.signal_count(), 1);
    }

    #[test]
    fn signal_is_unconditional() {
        let mut n = InMemoryNotifier::new();
        n.signal(ChangedFlags::MASTER_KEY);
        n.signal(ChangedFlags::MASTER_KEY);
        assert_eq!(n.signal_count(), 2);
    }

    #[test]
    fn combined_signal_reports_both_bits() {
        let mut n = InMemoryNotifier::new();
        n.signal(ChangedFlags::MASTER_KEY | ChangedFlags::KEY_SEQUENCE_COUNTER);
        assert!(n.has_signaled(ChangedFlags::MASTER_KEY));
        assert!(n.has_signaled(ChangedFlags::KEY_SEQUENCE_COUNTER));
        assert_eq!(
            n.last_signalled(),
            ChangedFlags::MASTER_KEY | ChangedFlags::KEY_SEQUENCE_COUNTER
        );
    }
}
