//! Run storage for the Scriptorium pipeline.
//!
//! Two [`RunStore`](scriptorium_interface::RunStore) implementations are provided:
//!
//! - [`InMemoryRunStore`] keeps each run behind its own lock, so mutations on one run
//!   are serialized while different runs proceed independently.
//! - [`ActorRunStore`] routes every operation through a single ractor actor that
//!   owns all runs.
//!
//! Both lose their contents when the process exits.
//!
//! # Examples
//!
//! ```
//! use scriptorium_core::{GeneratorInfo, ScriptVariant};
//! use scriptorium_interface::RunStore;
//! use scriptorium_storage::InMemoryRunStore;
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let store = InMemoryRunStore::new();
//! let run = store
//!     .create(
//!         "p1",
//!         vec![ScriptVariant::new("v1", "Variant A", "Buy it.")],
//!         GeneratorInfo::new("template", true),
//!     )
//!     .await
//!     .unwrap();
//!
//! assert_eq!(run.selected_variant_id(), "v1");
//! # });
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod actor;
mod config;
mod memory;

pub use actor::{ActorRunStore, RunStoreActor, RunStoreMessage, RunTable};
pub use config::{StorageConfig, StoreKind, create_store};
pub use memory::InMemoryRunStore;
