//! Capabilities the reconciliation core borrows from the host ERP.
//!
//! The core never talks to the host directly; it goes through these traits.
//! [`memory`] provides in-process implementations for tests and dry runs.

use crate::domain::{Document, DocumentId, DocumentKind, DocumentRef, InventoryId, ItemRef, Sku};

pub mod memory;

/// Errors reported by host collaborators.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HostError {
    /// The referenced document does not exist.
    #[error("{} {} not found", .0.kind, .0.id)]
    DocumentNotFound(DocumentRef),

    /// The document kind is not the source of any 3PL integration.
    #[error("a {0} cannot be fulfilled or received")]
    NotASource(DocumentKind),

    /// The host cannot convert between these document kinds.
    #[error("cannot transform a {from} into a {to}")]
    UnsupportedTransform {
        /// Source kind.
        from: DocumentKind,
        /// Requested target kind.
        to: DocumentKind,
    },

    /// The host rejected the operation.
    #[error("{operation} failed: {message}")]
    Rejected {
        /// The collaborator operation.
        operation: &'static str,
        /// Host-provided detail.
        message: String,
    },
}

/// Host record persistence.
pub trait DocumentStore {
    /// Loads a document.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::DocumentNotFound`] if no such document exists.
    fn load_document(&self, reference: &DocumentRef) -> Result<Document, HostError>;

    /// Persists a document and returns its host id.
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects the document.
    fn save_document(&mut self, document: &Document) -> Result<DocumentId, HostError>;

    /// Produces the line skeleton of a new `to` document from an existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the source does not exist or cannot be converted.
    fn transform_document(
        &self,
        from: &DocumentRef,
        to: DocumentKind,
    ) -> Result<Document, HostError>;
}

/// Maps raw serial or batch numbers to host inventory numbers.
pub trait IdentifierResolver {
    /// Resolves `raw` for `item`. `Ok(None)` means the host has no such
    /// number.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    fn resolve_identifier(
        &self,
        raw: &str,
        item: &ItemRef,
    ) -> Result<Option<InventoryId>, HostError>;
}

/// Maps host items to the SKU the 3PL uses for them.
pub trait SkuLookup {
    /// Returns the 3PL SKU of `item`, or `None` if none is recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    fn lookup_item_sku(&self, item: &ItemRef) -> Result<Option<Sku>, HostError>;
}
