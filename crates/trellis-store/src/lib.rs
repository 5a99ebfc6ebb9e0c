//! Trellis Store - Note store clients
//!
//! The [`NoteStore`] trait is the engine's only view of the outside world.
//! Two implementations are provided:
//! - [`MemoryStore`] keeps notes in memory and derives links and tags from
//!   their content
//! - [`HttpStore`] talks to a note server over HTTP (feature `http`)

pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod memory;
pub mod seed;
pub mod traits;

pub use error::{StoreError, StoreResult};
#[cfg(feature = "http")]
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use seed::demo_store;
pub use traits::{with_timeout, NoteStore};
