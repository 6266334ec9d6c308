//! End-to-end lifecycle tests for the buffer store.

use spool_registry::BufferStore;
use spool_store::{SpillBackend, SpoolBuffer, SpoolError, StorageKind};

#[test]
fn test_weak_lifecycle_end_to_end() {
    let store = BufferStore::new();
    let token = store.open_weak(StorageKind::Memory).unwrap();

    {
        let mut buffer = store.resolve(token).unwrap();
        buffer.write_values(&[10, 20, 30]).unwrap();
    }
    {
        let mut buffer = store.resolve(token).unwrap();
        assert_eq!(buffer.read_values(0, 0).unwrap(), vec![10, 20, 30]);
        assert_eq!(buffer.byte_at(1).unwrap(), Some(20));
    }

    assert!(store.destroy(token));
    assert!(store.resolve(token).is_none());
    assert!(!store.destroy(token));
}

#[test]
fn test_tokens_are_independent() {
    let store = BufferStore::new();
    let doomed = store.open_weak(StorageKind::Memory).unwrap();
    let survivor = store.open_weak(StorageKind::Memory).unwrap();
    store.resolve(survivor).unwrap().write(b"still here").unwrap();

    assert!(store.destroy(doomed));

    let mut buffer = store.resolve(survivor).unwrap();
    assert_eq!(buffer.read(0, 0).unwrap(), b"still here".to_vec());
}

#[test]
fn test_adopted_buffer_keeps_content() {
    let mut buffer = SpoolBuffer::open(StorageKind::Memory).unwrap();
    buffer.write(b"made outside").unwrap();

    let store = BufferStore::new();
    let token = store.adopt(buffer);

    let mut resolved = store.resolve(token).unwrap();
    assert_eq!(resolved.read(0, 0).unwrap(), b"made outside".to_vec());
}

#[test]
fn test_reuse_churn_never_resurrects_tokens() {
    let store = BufferStore::new();
    let mut stale = Vec::new();

    for round in 0..100 {
        let token = store.open_weak(StorageKind::Memory).unwrap();
        store.resolve(token).unwrap().write_values(&[round]).unwrap();
        assert!(store.destroy(token));
        stale.push(token);
    }

    assert!(store.is_empty());
    for token in stale {
        assert!(store.resolve(token).is_none());
    }
}

#[test]
fn test_take_then_use_outside_the_store() {
    let store = BufferStore::new();
    let token = store.open_weak(StorageKind::Memory).unwrap();
    store.resolve(token).unwrap().write(b"mine now").unwrap();

    let mut buffer = store.take(token).unwrap();
    assert!(store.resolve(token).is_none());

    buffer.write(b", thanks").unwrap();
    assert_eq!(buffer.read(0, 0).unwrap(), b"mine now, thanks".to_vec());
    buffer.close().unwrap();
    assert!(matches!(buffer.write(b"x"), Err(SpoolError::Closed)));
}

#[test]
fn test_store_drop_closes_and_cleans_up() {
    use std::io::Write;

    let mut backend = SpillBackend::with_threshold(2);
    backend.write_all(b"spilled before adoption").unwrap();
    let path = backend.spill_path().unwrap().to_path_buf();
    assert!(path.exists());

    let store = BufferStore::new();
    let _token = store.adopt(SpoolBuffer::with_backend(StorageKind::Spill, Box::new(backend)));
    drop(store);

    assert!(!path.exists());
}

#[test]
fn test_spill_buffers_live_in_the_store_too() {
    let store = BufferStore::new();
    let backend = SpillBackend::with_threshold(4);
    let token = store.adopt(SpoolBuffer::with_backend(StorageKind::Spill, Box::new(backend)));

    store.resolve(token).unwrap().write(b"spilled through the store").unwrap();

    let mut buffer = store.resolve(token).unwrap();
    assert_eq!(buffer.len().unwrap(), 25);
    assert_eq!(buffer.byte_at(0).unwrap(), Some(b's'));
    drop(buffer);

    // Destroy closes the backend, which removes the temporary file.
    assert!(store.destroy(token));
}
