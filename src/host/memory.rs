//! In-memory host collaborators.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Document, DocumentId, DocumentKind, DocumentRef, InventoryId, ItemRef, Sku},
    host::{DocumentStore, HostError, IdentifierResolver, SkuLookup},
};

/// Item SKUs and inventory numbers known to the host.
///
/// Inventory numbers are global by default; an entry under an item key
/// applies to that item only and takes precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// 3PL SKU per host item.
    #[serde(default)]
    pub skus: BTreeMap<ItemRef, Sku>,

    /// Host inventory number id per raw serial or batch number.
    #[serde(default)]
    pub inventory: BTreeMap<String, InventoryId>,

    /// Item-scoped inventory numbers.
    #[serde(default)]
    pub item_inventory: BTreeMap<ItemRef, BTreeMap<String, InventoryId>>,
}

impl Catalog {
    /// Records the SKU of an item.
    #[must_use]
    pub fn with_sku(mut self, item: &str, sku: Sku) -> Self {
        self.skus.insert(ItemRef::new(item), sku);
        self
    }

    /// Records a global inventory number.
    #[must_use]
    pub fn with_inventory(mut self, raw: &str, id: &str) -> Self {
        self.inventory.insert(raw.to_string(), InventoryId::new(id));
        self
    }
}

impl SkuLookup for Catalog {
    fn lookup_item_sku(&self, item: &ItemRef) -> Result<Option<Sku>, HostError> {
        Ok(self.skus.get(item).cloned())
    }
}

impl IdentifierResolver for Catalog {
    fn resolve_identifier(
        &self,
        raw: &str,
        item: &ItemRef,
    ) -> Result<Option<InventoryId>, HostError> {
        let scoped = self
            .item_inventory
            .get(item)
            .and_then(|numbers| numbers.get(raw));
        Ok(scoped.or_else(|| self.inventory.get(raw)).cloned())
    }
}

/// A document store backed by maps.
///
/// Source documents are registered together with the skeleton the host
/// would produce when transforming them. Saved documents get sequential ids.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: BTreeMap<(String, String), Document>,
    skeletons: BTreeMap<(String, String), Document>,
    saved: Vec<(DocumentId, Document)>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source document and the skeleton its transform yields.
    pub fn insert_source(&mut self, source: DocumentRef, document: Document, skeleton: Document) {
        let key = key(&source);
        self.documents.insert(key.clone(), document);
        self.skeletons.insert(key, skeleton);
    }

    /// Documents saved so far, in save order.
    #[must_use]
    pub fn saved(&self) -> &[(DocumentId, Document)] {
        &self.saved
    }
}

fn key(reference: &DocumentRef) -> (String, String) {
    (
        reference.kind.to_string(),
        reference.id.as_str().to_string(),
    )
}

impl DocumentStore for MemoryStore {
    fn load_document(&self, reference: &DocumentRef) -> Result<Document, HostError> {
        self.documents
            .get(&key(reference))
            .or_else(|| {
                self.saved
                    .iter()
                    .find(|(id, document)| *id == reference.id && document.kind == reference.kind)
                    .map(|(_, document)| document)
            })
            .cloned()
            .ok_or_else(|| HostError::DocumentNotFound(reference.clone()))
    }

    fn save_document(&mut self, document: &Document) -> Result<DocumentId, HostError> {
        let id = DocumentId::new((self.saved.len() + 1).to_string());
        self.saved.push((id.clone(), document.clone()));
        Ok(id)
    }

    fn transform_document(
        &self,
        from: &DocumentRef,
        to: DocumentKind,
    ) -> Result<Document, HostError> {
        if from.kind.target() != Some(to) {
            return Err(HostError::UnsupportedTransform {
                from: from.kind,
                to,
            });
        }

        let mut skeleton = self
            .skeletons
            .get(&key(from))
            .cloned()
            .ok_or_else(|| HostError::DocumentNotFound(from.clone()))?;
        skeleton.kind = to;
        skeleton.source = Some(from.clone());
        Ok(skeleton)
    }
}
