use std::sync::atomic::{AtomicU8, Ordering};

/// Resolution phases a declaration moves through, in order. Phases only ever
/// advance; a declaration observed at a phase stays at least there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ResolvePhase {
    Raw,
    SignatureResolved,
    BodyResolved,
}

impl ResolvePhase {
    fn from_raw(raw: u8) -> ResolvePhase {
        match raw {
            0 => ResolvePhase::Raw,
            1 => ResolvePhase::SignatureResolved,
            2 => ResolvePhase::BodyResolved,
            _ => unreachable!("invariant violated: unknown resolve phase {raw}"),
        }
    }
}

/// A monotonically advancing phase marker, readable without locking.
#[derive(Debug)]
pub struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub fn new(phase: ResolvePhase) -> PhaseCell {
        PhaseCell(AtomicU8::new(phase as u8))
    }

    pub fn load(&self) -> ResolvePhase {
        ResolvePhase::from_raw(self.0.load(Ordering::Acquire))
    }

    pub fn advance(&self, phase: ResolvePhase) {
        self.0.fetch_max(phase as u8, Ordering::AcqRel);
    }

    pub fn is_at_least(&self, phase: ResolvePhase) -> bool {
        self.load() >= phase
    }
}
