//! Identity tokens for buffers housed in a [`BufferStore`](crate::BufferStore).

use std::fmt;

/// Non-owning reference to a buffer slot in a
/// [`BufferStore`](crate::BufferStore).
///
/// A token never keeps a buffer alive. It pairs a slot index with the
/// generation the slot had when the buffer was registered; destroying the
/// buffer advances the slot generation, so every outstanding token for it
/// stops resolving even if the slot is later reused.
///
/// Tokens are cheap to copy and only meaningful for the store that issued
/// them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpoolToken {
    slot: u32,
    generation: u32,
}

impl SpoolToken {
    pub(crate) const fn new(slot: u32, generation: u32) -> Self {
        Self { slot, generation }
    }

    /// Slot index inside the issuing store.
    #[must_use]
    pub const fn slot(self) -> u32 {
        self.slot
    }

    /// Generation of the slot at registration time.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for SpoolToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpoolToken({}:{})", self.slot, self.generation)
    }
}
