//! KeyStore - shared typed field store
//!
//! A process-wide map of named fields holding either a string or a boolean.
//! Two cooperating runtimes use it as their only communication medium, so
//! every backend must make a single [`KeyValueStore::update`] call atomic with
//! respect to every other reader and writer of the same store.
//!
//! # Backends
//!
//! - [`MemoryStore`] - in-process map behind a mutex
//! - [`FileStore`] - JSON document guarded by an advisory lock file, shareable
//!   between OS processes
//!
//! ```text
//! store.json        # { "__py_registry": "print(1)", "__py_dispatch": true }
//! store.json.lock   # fs2 lock target, never contains data
//! ```
//!
//! # Example
//!
//! ```ignore
//! use keystore::{KeyValueStore, MemoryStore, StoreExt};
//!
//! let store = MemoryStore::new();
//! store.set_string("__py_registry", "print(1)")?;
//! store.set_bool("__py_dispatch", true)?;
//! assert!(store.get_bool("__py_dispatch")?);
//! ```

mod error;
mod file;
mod memory;
mod store;
mod value;

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{Fields, KeyValueStore, StoreExt};
pub use value::{DataType, Value};
