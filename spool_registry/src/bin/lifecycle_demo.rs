//! Buffer lifecycle demo
//!
//! Walks through the ownership story: an owned buffer, a weak token in a
//! store, destroy, and what stale tokens see afterwards.

use spool_registry::BufferStore;
use spool_store::{SpoolBuffer, StorageKind};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Owned: exclusive access, closed by the owner
    let mut owned = SpoolBuffer::open(StorageKind::Memory)?;
    owned.write(b"private scratch data")?;
    println!("owned buffer holds {} bytes", owned.len()?);
    owned.close()?;

    // Weak: the store owns the buffer, tokens observe it
    let store = BufferStore::new();
    let token = store.open_weak(StorageKind::Spill)?;

    if let Some(mut buffer) = store.resolve(token) {
        buffer.write(b"shared spool data")?;
        println!("weak buffer holds {} bytes", buffer.len()?);
    }

    // Destroy once: the token goes stale for good
    println!("destroy: {}", store.destroy(token));
    println!("destroy again: {}", store.destroy(token));
    println!("stale token resolves: {}", store.resolve(token).is_some());

    // Slot reuse does not resurrect the stale token
    let replacement = store.open_weak(StorageKind::Memory)?;
    println!(
        "replacement {replacement:?} reuses the slot, stale {token:?} resolves: {}",
        store.resolve(token).is_some()
    );

    store.destroy_all();
    println!("store is empty: {}", store.is_empty());
    Ok(())
}
