//! YAML description of a host document, used in place of a live ERP.

use std::{fs, path::Path};

use reconcile::{
    Document, DocumentLine,
    domain::{DocumentRef, ItemRef, LineRole, document::LineFlags},
    host::memory::{Catalog, MemoryStore},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    /// The sales order or return authorisation to transform.
    pub source: DocumentRef,

    /// The lines the host puts on the new document.
    pub lines: Vec<FixtureLine>,

    /// Item SKUs and inventory numbers.
    #[serde(default)]
    pub catalog: Catalog,

    #[serde(default)]
    pub tracking_number: Option<String>,

    #[serde(default)]
    pub tracking_url: Option<String>,
}

/// A line given either by role or by the host flags its role derives from.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureLine {
    item: ItemRef,
    #[serde(default)]
    role: Option<LineRole>,
    #[serde(default)]
    flags: Option<LineFlags>,
    #[serde(default)]
    quantity: Option<u32>,
}

impl FixtureLine {
    fn into_line(self, index: usize) -> anyhow::Result<DocumentLine> {
        let role = match (self.role, self.flags) {
            (Some(role), _) => role,
            (None, Some(flags)) => LineRole::classify(flags),
            (None, None) => anyhow::bail!("line {index} needs either a role or flags"),
        };
        Ok(DocumentLine::new(self.item, role, self.quantity))
    }
}

impl Fixture {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read fixture {}: {e}", path.display()))?;
        serde_yaml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse fixture {}: {e}", path.display()))
    }

    /// Splits the fixture into the host store and catalog it describes.
    pub fn into_host(self) -> anyhow::Result<(MemoryStore, Catalog)> {
        let lines = self
            .lines
            .into_iter()
            .enumerate()
            .map(|(index, line)| line.into_line(index))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let document = Document::from_lines(self.source.kind, lines);
        let mut store = MemoryStore::new();
        store.insert_source(self.source, document.clone(), document);
        Ok((store, self.catalog))
    }
}
