use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::domain::Sku;

/// One physical unit moved by the 3PL, as reported in an inbound payload.
///
/// Only the fields the correlator needs survive normalisation; passthrough
/// metadata such as reason codes or timestamps never reaches this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentUnit {
    /// The grouping key.
    pub sku: Sku,

    /// Serial number, or the first component's serial for kit-pair payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,

    /// Batch number, or the second component's serial for kit-pair payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,

    /// Number of units this record stands for. Usually 1.
    pub quantity: NonZeroU32,

    /// Component bundles, present only for kits reported in the bundled shape.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bundles: Vec<Bundle>,
}

impl ShipmentUnit {
    /// Creates a single unit with no identifiers.
    #[must_use]
    pub const fn new(sku: Sku) -> Self {
        Self {
            sku,
            serial_number: None,
            batch_number: None,
            quantity: NonZeroU32::MIN,
            bundles: Vec::new(),
        }
    }

    /// Sets the serial number.
    #[must_use]
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    /// Sets the batch number.
    #[must_use]
    pub fn with_batch(mut self, batch: impl Into<String>) -> Self {
        self.batch_number = Some(batch.into());
        self
    }

    /// Sets the quantity.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: NonZeroU32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Attaches component bundles.
    #[must_use]
    pub fn with_bundles(mut self, bundles: Vec<Bundle>) -> Self {
        self.bundles = bundles;
        self
    }

    /// Returns the identifier of a stand-alone unit: the serial number if
    /// present, otherwise the batch number.
    #[must_use]
    pub fn primary_identifier(&self) -> Option<&str> {
        self.serial_number
            .as_deref()
            .or(self.batch_number.as_deref())
    }
}

/// A kit bundle in the bundled payload shape: the components shipped together
/// as one kit instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    /// The bundle number assigned by the 3PL. Empty once bundles are
    /// flattened.
    #[serde(default)]
    pub number: String,

    /// The component lines of this bundle.
    pub items: Vec<BundleItem>,
}

/// A component line inside a [`Bundle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleItem {
    /// The component SKU.
    pub sku: Sku,

    /// Declared component quantity.
    pub quantity: u32,

    /// Serial numbers of the shipped components, in scan order.
    #[serde(default)]
    pub serial_numbers: Vec<String>,
}

/// Merges all bundles into one, with one item per component SKU.
///
/// Items appear in order of first appearance. Quantities of the same
/// component SKU are summed and serial lists concatenated in bundle order.
/// The result always holds exactly one bundle (with an empty number) unless
/// the input is empty, so flattening flattened bundles returns them unchanged.
#[must_use]
pub fn flatten_bundles(bundles: &[Bundle]) -> Vec<Bundle> {
    if bundles.is_empty() {
        return Vec::new();
    }

    let mut items: Vec<BundleItem> = Vec::new();
    for item in bundles.iter().flat_map(|bundle| &bundle.items) {
        if let Some(existing) = items.iter_mut().find(|i| i.sku == item.sku) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            existing
                .serial_numbers
                .extend(item.serial_numbers.iter().cloned());
        } else {
            items.push(item.clone());
        }
    }

    vec![Bundle {
        number: String::new(),
        items,
    }]
}
