//! Typed view of a host fulfilment or receipt document.
//!
//! The host exposes records through string-keyed field access; adapters at the
//! collaborator boundary translate that into the types here so the correlator
//! only ever sees validated lines.

use std::{fmt, num::NonZeroUsize};

use serde::{Deserialize, Serialize};

/// Opaque host reference to an item record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemRef(String);

impl ItemRef {
    /// Wraps a host item key.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the host key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque host identifier of an inventory (serial or lot) number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryId(String);

impl InventoryId {
    /// Wraps a host inventory number id.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the host id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InventoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque host identifier of a saved document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Wraps a host document id.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the host id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The host document types involved in 3PL integrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    /// Outbound order, source of fulfilments.
    SalesOrder,
    /// Customer return, source of receipts.
    ReturnAuthorization,
    /// Outbound shipment issuing existing inventory.
    ItemFulfillment,
    /// Inbound return receiving inventory.
    ItemReceipt,
}

impl DocumentKind {
    /// Whether lines of this kind issue existing inventory numbers, which must
    /// be resolved to host ids. Receipts record raw numbers instead.
    #[must_use]
    pub const fn issues_inventory(self) -> bool {
        matches!(self, Self::ItemFulfillment)
    }

    /// The document a source document is transformed into.
    #[must_use]
    pub const fn target(self) -> Option<Self> {
        match self {
            Self::SalesOrder => Some(Self::ItemFulfillment),
            Self::ReturnAuthorization => Some(Self::ItemReceipt),
            Self::ItemFulfillment | Self::ItemReceipt => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SalesOrder => "sales order",
            Self::ReturnAuthorization => "return authorization",
            Self::ItemFulfillment => "item fulfillment",
            Self::ItemReceipt => "item receipt",
        };
        f.write_str(name)
    }
}

/// A reference to a host document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Document type.
    pub kind: DocumentKind,
    /// Host id.
    pub id: DocumentId,
}

/// The host's item type, as far as line classification cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemType {
    /// A kit item.
    Kit,
    /// An inventory part.
    #[serde(rename = "InvtPart")]
    InventoryPart,
    /// Anything else.
    #[serde(other)]
    Other,
}

/// The host line attributes used to decide a line's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineFlags {
    /// Whether the host demands inventory detail on this line.
    pub inventory_detail_required: bool,
    /// The line's item type.
    pub item_type: ItemType,
    /// Whether the line belongs to a kit.
    #[serde(default)]
    pub kit_member: bool,
}

/// The structural role of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineRole {
    /// The kit line itself; its components follow immediately.
    KitParent,
    /// A component of the preceding kit.
    Component,
    /// An item outside any kit.
    Standalone,
    /// A line the correlator leaves alone (e.g. non-inventory items).
    Untracked,
}

impl LineRole {
    /// Derives a role from host line flags.
    #[must_use]
    pub const fn classify(flags: LineFlags) -> Self {
        match (flags.inventory_detail_required, flags.item_type, flags.kit_member) {
            (false, ItemType::Kit, _) => Self::KitParent,
            (true, ItemType::Kit, _) | (false, _, _) => Self::Untracked,
            (true, _, true) => Self::Component,
            (true, _, false) => Self::Standalone,
        }
    }
}

/// One identifier written to a line's inventory detail, with quantity 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssignedIdentifier {
    /// An existing inventory number issued by a fulfilment.
    Issued(InventoryId),
    /// A raw number recorded by a receipt.
    Received(String),
}

/// One line of a fulfilment or receipt document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLine {
    /// The host item on this line.
    pub item: ItemRef,

    /// The line's structural role.
    pub role: LineRole,

    /// 1-based position within the enclosing kit, for component lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_position: Option<NonZeroUsize>,

    /// The quantity the host suggests, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_quantity: Option<u32>,

    /// The quantity committed by correlation. `None` leaves the host default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,

    /// Inventory detail written by correlation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifiers: Vec<AssignedIdentifier>,
}

impl DocumentLine {
    /// Creates an untouched line.
    #[must_use]
    pub const fn new(item: ItemRef, role: LineRole, requested_quantity: Option<u32>) -> Self {
        Self {
            item,
            role,
            component_position: None,
            requested_quantity,
            quantity: None,
            identifiers: Vec::new(),
        }
    }
}

/// Tracking details stamped on a document header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingInfo {
    /// Package tracking number(s), already normalised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// Carrier tracking URL, already normalised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A fulfilment or receipt document in the shape the correlator works on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document type.
    pub kind: DocumentKind,

    /// The document this one was transformed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DocumentRef>,

    /// Lines in host order.
    pub lines: Vec<DocumentLine>,

    /// Header tracking details.
    #[serde(default)]
    pub tracking: TrackingInfo,
}

impl Document {
    /// Builds a document and numbers component lines.
    ///
    /// Component positions count from 1 after each kit parent. Components that
    /// appear with no preceding kit parent are numbered as if a kit had just
    /// started.
    #[must_use]
    pub fn from_lines(kind: DocumentKind, lines: impl IntoIterator<Item = DocumentLine>) -> Self {
        let mut position = 0usize;
        let lines = lines
            .into_iter()
            .map(|mut line| {
                match line.role {
                    LineRole::Component => {
                        position += 1;
                        line.component_position = NonZeroUsize::new(position);
                    }
                    LineRole::KitParent | LineRole::Standalone => {
                        position = 0;
                        line.component_position = None;
                    }
                    LineRole::Untracked => line.component_position = None,
                }
                line
            })
            .collect();

        Self {
            kind,
            source: None,
            lines,
            tracking: TrackingInfo::default(),
        }
    }

    /// Sets the source document.
    #[must_use]
    pub fn with_source(mut self, source: DocumentRef) -> Self {
        self.source = Some(source);
        self
    }
}
