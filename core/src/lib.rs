//! Address book core
//!
//! Look up addresses by postcode and house number, attach a person's name,
//! and keep the resulting collection in sync with a durable key-value store.
//! The in-memory [`AddressBook`] is the single source of truth for a
//! session; the [`SyncManager`] loads it once at startup and writes the full
//! collection back on every subsequent mutation, refusing to write anything
//! until that initial load has completed.

pub mod address;
pub mod book;
pub mod lookup;
pub mod storage;
pub mod sync;

pub use address::{Address, RawAddress};
pub use book::{AddressBook, BookEvent};
pub use lookup::{validate_query, AddressLookup, HttpAddressLookup, LookupError};
pub use storage::{DurableStore, JsonFileStore, MemoryStore, StoreError};
pub use sync::{SyncManager, SyncStats, SyncStatus, ADDRESSES_KEY};
