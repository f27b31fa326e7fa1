//! Parsing of raw 3PL payload text into [`ShipmentUnit`]s.
//!
//! Payloads reach the host as text fields that may have been HTML-escaped on
//! the way (`&quot;` instead of `"`), optionally wrapped in an envelope
//! object. Only the fields named by the provider profile are read; everything
//! else in a record is dropped here.

use std::{borrow::Cow, num::NonZeroU32, sync::LazyLock};

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::domain::{
    ProviderProfile, Sku,
    unit::{Bundle, BundleItem, ShipmentUnit},
};

const BUNDLES_FIELD: &str = "bundles";
const BUNDLE_NUMBER_FIELD: &str = "bundleNo";
const BUNDLE_ITEMS_FIELD: &str = "items";

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(quot|amp|apos|lt|gt|#39|#34);").expect("entity pattern is valid")
});

/// Errors raised while normalising a payload.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The text is not valid JSON, even after unescaping.
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The JSON is valid but not a list of records.
    #[error("payload has an unexpected shape: {0}")]
    Shape(String),

    /// The payload declares no shipped units.
    #[error("payload contains no shipped units")]
    Empty,

    /// A record has a blank SKU and the provider requires one.
    #[error(
        "record {index} has no SKU; if this is a kit, the warehouse must scan the kit item and \
         not only its components"
    )]
    MissingSku {
        /// Zero-based position of the record in the payload.
        index: usize,
    },
}

/// Replaces the HTML entities hosts commonly inject into stored JSON.
///
/// Returns the input unchanged (borrowed) when it contains no entities.
#[must_use]
pub fn unescape_entities(raw: &str) -> Cow<'_, str> {
    ENTITY.replace_all(raw, |caps: &Captures| {
        match &caps[1] {
            "quot" | "#34" => "\"",
            "amp" => "&",
            "apos" | "#39" => "'",
            "lt" => "<",
            "gt" => ">",
            _ => unreachable!("pattern only matches known entities"),
        }
        .to_string()
    })
}

/// The records of one payload, validated against a provider profile.
#[derive(Debug)]
pub struct Records<'p> {
    profile: &'p ProviderProfile,
    records: Vec<(Sku, Map<String, Value>)>,
}

impl<'p> Records<'p> {
    /// Unescapes and parses raw payload text, unwraps the profile's envelope
    /// and checks every record's SKU.
    ///
    /// Records with a blank SKU are rejected when the profile requires SKUs and
    /// skipped otherwise.
    ///
    /// # Errors
    ///
    /// - [`PayloadError::Malformed`] if the text is not JSON
    /// - [`PayloadError::Shape`] if it does not contain a list of objects
    /// - [`PayloadError::MissingSku`] for a blank SKU under `require_sku`
    pub fn parse(raw: &str, profile: &'p ProviderProfile) -> Result<Self, PayloadError> {
        let text = unescape_entities(raw.trim());
        let root: Value = serde_json::from_str(&text)?;
        let list = unwrap_envelope(root, profile.envelope_key.as_deref())?;

        let mut records = Vec::with_capacity(list.len());
        for (index, value) in list.into_iter().enumerate() {
            let Value::Object(record) = value else {
                return Err(PayloadError::Shape(format!(
                    "record {index} is not an object"
                )));
            };

            match string_field(&record, &profile.sku_field).and_then(|s| Sku::new(s).ok()) {
                Some(sku) => records.push((sku, record)),
                None if profile.require_sku => return Err(PayloadError::MissingSku { index }),
                None => tracing::warn!(index, "skipping payload record with blank SKU"),
            }
        }

        Ok(Self { profile, records })
    }

    /// Number of records with a usable SKU.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record survived validation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Interprets each record as one flat unit with optional serial and batch
    /// numbers.
    ///
    /// Records with a zero quantity describe nothing shipped and are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::Empty`] if no unit remains.
    pub fn flat_units(&self) -> Result<Vec<ShipmentUnit>, PayloadError> {
        let units: Vec<_> = self
            .records
            .iter()
            .filter_map(|(sku, record)| {
                let quantity = self.quantity(record)?;
                let mut unit = ShipmentUnit::new(sku.clone()).with_quantity(quantity);
                unit.serial_number = string_field(record, &self.profile.serial_field);
                unit.batch_number = string_field(record, &self.profile.batch_field);
                Some(unit)
            })
            .collect();

        non_empty(units)
    }

    /// Interprets records in the bundled shape.
    ///
    /// A record with bundles becomes one kit unit carrying them. A record with
    /// a serial number list becomes one unit per serial. Any other record
    /// becomes a single unit of its declared quantity.
    ///
    /// # Errors
    ///
    /// - [`PayloadError::Shape`] if a bundle is not structured as expected
    /// - [`PayloadError::Empty`] if no unit remains
    pub fn bundled_units(&self) -> Result<Vec<ShipmentUnit>, PayloadError> {
        let mut units = Vec::new();
        for (sku, record) in &self.records {
            if let Some(bundles) = record.get(BUNDLES_FIELD).and_then(Value::as_array) {
                let Some(quantity) = self.quantity(record) else {
                    continue;
                };
                let bundles = bundles
                    .iter()
                    .map(|bundle| self.bundle(sku, bundle))
                    .collect::<Result<Vec<_>, _>>()?;
                units.push(
                    ShipmentUnit::new(sku.clone())
                        .with_quantity(quantity)
                        .with_bundles(bundles),
                );
                continue;
            }

            let serials = string_list(record, &self.profile.serial_field);
            if serials.is_empty() {
                if let Some(quantity) = self.quantity(record) {
                    units.push(ShipmentUnit::new(sku.clone()).with_quantity(quantity));
                }
            } else {
                units.extend(
                    serials
                        .into_iter()
                        .map(|serial| ShipmentUnit::new(sku.clone()).with_serial(serial)),
                );
            }
        }

        non_empty(units)
    }

    /// Interprets each record as an item and quantity only, ignoring any
    /// identifiers. Unlike the other shapes, an empty result is not an error.
    #[must_use]
    pub fn quantity_units(&self) -> Vec<ShipmentUnit> {
        self.records
            .iter()
            .filter_map(|(sku, record)| {
                self.quantity(record)
                    .map(|quantity| ShipmentUnit::new(sku.clone()).with_quantity(quantity))
            })
            .collect()
    }

    fn quantity(&self, record: &Map<String, Value>) -> Option<NonZeroU32> {
        quantity_field(record, &self.profile.quantity_field)
    }

    fn bundle(&self, kit: &Sku, value: &Value) -> Result<Bundle, PayloadError> {
        let shape_error = || PayloadError::Shape(format!("malformed bundle in kit {kit}"));

        let bundle = value.as_object().ok_or_else(shape_error)?;
        let items = bundle
            .get(BUNDLE_ITEMS_FIELD)
            .and_then(Value::as_array)
            .ok_or_else(shape_error)?;

        let items = items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|item| {
                let sku = string_field(item, &self.profile.sku_field).and_then(|s| Sku::new(s).ok())?;
                let serial_numbers = string_list(item, &self.profile.serial_field);
                let quantity = quantity_field(item, &self.profile.quantity_field)
                    .map_or(0, NonZeroU32::get);
                Some(BundleItem {
                    sku,
                    quantity,
                    serial_numbers,
                })
            })
            .collect();

        Ok(Bundle {
            number: string_field(bundle, BUNDLE_NUMBER_FIELD).unwrap_or_default(),
            items,
        })
    }
}

fn non_empty(units: Vec<ShipmentUnit>) -> Result<Vec<ShipmentUnit>, PayloadError> {
    if units.is_empty() {
        Err(PayloadError::Empty)
    } else {
        Ok(units)
    }
}

/// Finds the record list.
///
/// With an envelope key, the key is looked up on the root object, or on the
/// first element when the root is an array of envelopes. Without a match the
/// root itself is the list; a lone object counts as a list of one.
fn unwrap_envelope(root: Value, key: Option<&str>) -> Result<Vec<Value>, PayloadError> {
    let inner = match (root, key) {
        (Value::Object(mut object), Some(key)) if object.contains_key(key) => object
            .remove(key)
            .unwrap_or(Value::Null),
        (Value::Array(mut list), Some(key))
            if list
                .first()
                .and_then(Value::as_object)
                .is_some_and(|first| first.contains_key(key)) =>
        {
            match list.swap_remove(0) {
                Value::Object(mut first) => first.remove(key).unwrap_or(Value::Null),
                other => other,
            }
        }
        (root, _) => root,
    };

    match inner {
        Value::Array(list) => Ok(list),
        Value::Object(object) => Ok(vec![Value::Object(object)]),
        Value::Null => Ok(Vec::new()),
        other => Err(PayloadError::Shape(format!(
            "expected a list of records, found {other}"
        ))),
    }
}

/// Reads a non-blank string (or number) field.
fn string_field(record: &Map<String, Value>, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a list of non-blank strings. A single string counts as a list of one.
fn string_list(record: &Map<String, Value>, field: &str) -> Vec<String> {
    match record.get(field) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|value| match value {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(_) => string_field(record, field).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Reads a quantity. A missing field means one unit; zero means none.
fn quantity_field(record: &Map<String, Value>, field: &str) -> Option<NonZeroU32> {
    match record.get(field) {
        None | Some(Value::Null) => Some(NonZeroU32::MIN),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(whole_units))
            .and_then(|q| u32::try_from(q).ok())
            .and_then(NonZeroU32::new),
        Some(Value::String(s)) => s.trim().parse().ok().and_then(NonZeroU32::new),
        Some(_) => None,
    }
}

/// Truncates a fractional quantity; negative or out-of-range values are rejected.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_units(quantity: f64) -> Option<u64> {
    (quantity >= 0.0 && quantity < f64::from(u32::MAX) + 1.0).then(|| quantity.trunc() as u64)
}
