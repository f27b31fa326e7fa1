//! Domain models for 3PL line reconciliation.
//!
//! This module contains the payload-side types (SKUs, shipped units and their
//! per-SKU groups), the document-side types (lines and their roles), and the
//! provider configuration.

mod config;
pub use config::{Config, ProviderProfile, ProviderVariant, UrlWhitespace};

pub mod document;
pub use document::{
    AssignedIdentifier, Document, DocumentId, DocumentKind, DocumentLine, DocumentRef,
    InventoryId, ItemRef, LineRole, TrackingInfo,
};

pub mod group;
pub use group::{SkuGroup, SkuGroups};

mod quantity;
pub use quantity::commit;

mod sku;
pub use sku::{BlankSkuError, Sku};

pub mod tracking;

/// Shipped units and kit bundles.
pub mod unit;
pub use unit::{Bundle, BundleItem, ShipmentUnit};
