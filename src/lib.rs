//! Line reconciliation for 3PL integrations
//!
//! Third-party logistics providers report what they shipped or received as
//! JSON payloads. This crate matches those payloads against the lines of an
//! ERP fulfilment or receipt document, assigning serial and batch numbers to
//! the right lines in the right order and reconciling quantities.

pub mod correlate;
pub use correlate::{CorrelationOutcome, Correlator, LineOutcome, SkipReason};

pub mod domain;
pub use domain::{Config, Document, DocumentLine, ProviderProfile, ProviderVariant, Sku};

mod error;
pub use error::Error;

pub mod host;

pub mod integration;
pub use integration::{Integration, IntegrationReport, IntegrationRequest};

pub mod payload;

pub mod storage;
