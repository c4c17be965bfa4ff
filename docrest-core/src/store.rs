//! Document store handle shared by resources.
//!
//! [`DocumentStore`] owns a backend and hands out [`Collection`] handles by name.
//!
//! # Example
//!
//! ```ignore
//! use docrest::store::DocumentStore;
//!
//! let store = DocumentStore::new(backend);
//! let users = store.collection("users");
//! ```

use crate::{backend::StoreBackend, collection::Collection};

/// A document store bound to a specific backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug, Clone)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Gets a collection handle with the given name.
    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, B> {
        Collection::new(name.to_string(), &self.backend)
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
