//! Buffer lifecycle management on top of [`spool_store`].
//!
//! Two ownership modes cover every consumer:
//!
//! - owned: hold a [`SpoolBuffer`](spool_store::SpoolBuffer) directly,
//!   use it, close it
//! - weak: park the buffer in a [`BufferStore`] and pass around a
//!   copyable [`SpoolToken`]; resolve the token on every use and get
//!   `None` once the buffer is gone
//!
//! # Example
//!
//! ```
//! use spool_registry::BufferStore;
//! use spool_store::StorageKind;
//!
//! let store = BufferStore::new();
//! let token = store.open_weak(StorageKind::Memory).unwrap();
//! {
//!     let mut buffer = store.resolve(token).unwrap();
//!     buffer.write(b"hi").unwrap();
//! }
//! assert!(store.destroy(token));
//! assert!(store.resolve(token).is_none());
//! ```

pub mod registry;
pub mod token;

// Re-export store types for convenience
pub use registry::{BufferStore, SpoolRef};

// Re-export token type for convenience
pub use token::SpoolToken;
