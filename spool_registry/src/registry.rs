//! Buffer registry: owned storage plus generation-checked weak observers.
//!
//! Ownership discipline:
//!
//! - An owned [`SpoolBuffer`] is exclusive. Whoever holds it reads, writes
//!   and eventually closes it.
//! - A [`SpoolToken`] observes a buffer the store owns. It never keeps the
//!   buffer alive: after [`destroy`](BufferStore::destroy) the token
//!   resolves to `None`, and slot reuse cannot resurrect it because every
//!   removal advances the slot generation.
//!
//! [`resolve`](BufferStore::resolve) hands out a guard that locks the
//! whole store. Use it and drop it within one scope; resolving again or
//! destroying while a guard is alive would deadlock. Long-lived exclusive
//! access wants [`take`](BufferStore::take) instead.

use std::fmt;
use std::ops::{Deref, DerefMut};

use parking_lot::{Mutex, MutexGuard};
use spool_store::{SpoolBuffer, SpoolError, StorageKind};

use crate::token::SpoolToken;

enum Slot {
    Occupied { buffer: SpoolBuffer, generation: u32 },
    Vacant { generation: u32, next_free: Option<u32> },
}

struct Slots {
    entries: Vec<Slot>,
    free_head: Option<u32>,
    live: usize,
}

impl Slots {
    fn insert(&mut self, buffer: SpoolBuffer) -> SpoolToken {
        self.live += 1;
        match self.free_head {
            Some(slot) => {
                let index = slot as usize;
                let (generation, next_free) = match &self.entries[index] {
                    Slot::Vacant { generation, next_free } => (*generation, *next_free),
                    Slot::Occupied { .. } => unreachable!("free list points at an occupied slot"),
                };
                self.free_head = next_free;
                self.entries[index] = Slot::Occupied { buffer, generation };
                SpoolToken::new(slot, generation)
            }
            None => {
                #[allow(clippy::cast_possible_truncation)]
                let slot = self.entries.len() as u32;
                self.entries.push(Slot::Occupied {
                    buffer,
                    generation: 0,
                });
                SpoolToken::new(slot, 0)
            }
        }
    }

    fn index_of(&self, token: SpoolToken) -> Option<usize> {
        let index = token.slot() as usize;
        match self.entries.get(index) {
            Some(Slot::Occupied { generation, .. }) if *generation == token.generation() => {
                Some(index)
            }
            _ => None,
        }
    }

    fn remove(&mut self, token: SpoolToken) -> Option<SpoolBuffer> {
        let index = token.slot() as usize;
        let entry = self.entries.get_mut(index)?;
        match entry {
            Slot::Occupied { generation, .. } if *generation == token.generation() => {
                let vacant = Slot::Vacant {
                    generation: generation.wrapping_add(1),
                    next_free: self.free_head,
                };
                let Slot::Occupied { buffer, .. } = std::mem::replace(entry, vacant) else {
                    unreachable!("entry was just matched as occupied");
                };
                self.free_head = Some(token.slot());
                self.live -= 1;
                Some(buffer)
            }
            _ => None,
        }
    }

    fn drain_live(&mut self) -> Vec<SpoolBuffer> {
        let mut drained = Vec::with_capacity(self.live);
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if let Slot::Occupied { generation, .. } = entry {
                let vacant = Slot::Vacant {
                    generation: generation.wrapping_add(1),
                    next_free: self.free_head,
                };
                let Slot::Occupied { buffer, .. } = std::mem::replace(entry, vacant) else {
                    unreachable!("entry was just matched as occupied");
                };
                #[allow(clippy::cast_possible_truncation)]
                let slot = index as u32;
                self.free_head = Some(slot);
                drained.push(buffer);
            }
        }
        self.live = 0;
        drained
    }
}

/// Registry that owns buffers on behalf of weak observers.
///
/// Buffers enter through [`open_weak`](Self::open_weak) or
/// [`adopt`](Self::adopt) and are addressed by [`SpoolToken`] from then
/// on. Destroying a buffer closes its backend exactly once; the store
/// also closes every buffer it still owns when dropped.
pub struct BufferStore {
    slots: Mutex<Slots>,
}

impl BufferStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots {
                entries: Vec::new(),
                free_head: None,
                live: 0,
            }),
        }
    }

    /// Opens a buffer owned by the store and returns a weak token for it.
    ///
    /// # Errors
    ///
    /// Returns [`SpoolError::Io`] if the backing storage cannot be set up.
    pub fn open_weak(&self, kind: StorageKind) -> Result<SpoolToken, SpoolError> {
        let buffer = SpoolBuffer::open(kind)?;
        Ok(self.adopt(buffer))
    }

    /// Transfers ownership of an existing buffer to the store and returns
    /// a weak token for it. The token is the only way back to the buffer.
    #[must_use]
    pub fn adopt(&self, buffer: SpoolBuffer) -> SpoolToken {
        let token = self.slots.lock().insert(buffer);
        log::debug!("registered buffer {token:?}");
        token
    }

    /// Resolves a token to a short-lived buffer guard.
    ///
    /// Returns `None` once the buffer has been destroyed or taken, or if
    /// the token belongs to an older generation of a reused slot.
    pub fn resolve(&self, token: SpoolToken) -> Option<SpoolRef<'_>> {
        let slots = self.slots.lock();
        let index = slots.index_of(token)?;
        Some(SpoolRef {
            guard: slots,
            index,
        })
    }

    /// Destroys the buffer behind `token`: closes its backend and frees
    /// the slot for reuse under a new generation.
    ///
    /// Returns false if the token no longer resolves; destroying twice is
    /// not an error, the second call just reports false.
    pub fn destroy(&self, token: SpoolToken) -> bool {
        let removed = self.slots.lock().remove(token);
        match removed {
            Some(mut buffer) => {
                if let Err(err) = buffer.close() {
                    log::warn!("destroy: failed to close buffer {token:?}: {err}");
                }
                true
            }
            None => {
                log::warn!("destroy() called with a dead token: {token:?}");
                false
            }
        }
    }

    /// Detaches the buffer behind `token` and hands it back open. The
    /// caller becomes the exclusive owner; outstanding tokens for it stop
    /// resolving.
    pub fn take(&self, token: SpoolToken) -> Option<SpoolBuffer> {
        self.slots.lock().remove(token)
    }

    /// Destroys every live buffer. Slot generations advance, so stale
    /// tokens cannot resolve into later registrations.
    pub fn destroy_all(&self) {
        let drained = self.slots.lock().drain_live();
        for mut buffer in drained {
            if let Err(err) = buffer.close() {
                log::warn!("destroy_all: failed to close buffer: {err}");
            }
        }
    }

    /// Number of live buffers in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().live
    }

    /// True if the store owns no live buffers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for BufferStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BufferStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slots.try_lock() {
            Some(slots) => f
                .debug_struct("BufferStore")
                .field("live", &slots.live)
                .field("slots", &slots.entries.len())
                .finish(),
            None => f.write_str("BufferStore { <locked> }"),
        }
    }
}

/// Short-lived view of a live buffer inside a [`BufferStore`].
///
/// Holds the store lock for its whole lifetime and dereferences to
/// [`SpoolBuffer`], mutably too, so reads and writes go through the usual
/// buffer API.
pub struct SpoolRef<'a> {
    guard: MutexGuard<'a, Slots>,
    index: usize,
}

impl Deref for SpoolRef<'_> {
    type Target = SpoolBuffer;

    fn deref(&self) -> &SpoolBuffer {
        match &self.guard.entries[self.index] {
            Slot::Occupied { buffer, .. } => buffer,
            Slot::Vacant { .. } => unreachable!("resolved slot vacated while guard held"),
        }
    }
}

impl DerefMut for SpoolRef<'_> {
    fn deref_mut(&mut self) -> &mut SpoolBuffer {
        match &mut self.guard.entries[self.index] {
            Slot::Occupied { buffer, .. } => buffer,
            Slot::Vacant { .. } => unreachable!("resolved slot vacated while guard held"),
        }
    }
}

impl fmt::Debug for SpoolRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpoolRef")
            .field("index", &self.index)
            .finish()
    }
}
