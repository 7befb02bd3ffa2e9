use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sequence(u64);

impl Sequence {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic counter for one logical request stream.
///
/// Every outgoing request takes a [`Sequence`] from [`SequenceGate::issue`]. When the
/// response comes back the caller asks the gate whether it may still be applied:
/// [`SequenceGate::is_latest`] for last-issued-wins streams, or
/// [`SequenceGate::try_advance`] when any result newer than the last applied one is
/// acceptable.
#[derive(Debug, Default)]
pub struct SequenceGate {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl SequenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> Sequence {
        Sequence(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest_issued(&self) -> Sequence {
        Sequence(self.issued.load(Ordering::SeqCst))
    }

    pub fn is_latest(&self, sequence: Sequence) -> bool {
        self.issued.load(Ordering::SeqCst) == sequence.0
    }

    /// Records `sequence` as applied unless an equal or newer one already was.
    pub fn try_advance(&self, sequence: Sequence) -> bool {
        self.applied
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |applied| {
                (sequence.0 > applied).then_some(sequence.0)
            })
            .is_ok()
    }

    /// Supersedes everything issued so far without starting a request.
    pub fn invalidate(&self) {
        let _ = self.issue();
    }
}
