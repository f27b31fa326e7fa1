use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};

use crate::{
    domain::{DocumentId, ItemRef, Sku},
    host::HostError,
    payload::PayloadError,
    storage::{IntegrationKey, LedgerError},
};

/// Errors that abort a correlation or integration run.
///
/// Every variant is fatal to the run: nothing is committed to the host
/// document and nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The payload could not be normalised.
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// A declared serial or batch number does not exist on the host.
    #[error("inventory number '{value}' does not exist for item {item} (line {line})")]
    IdentifierNotFound {
        /// The raw number from the payload.
        value: String,
        /// The item the number was looked up for.
        item: ItemRef,
        /// Zero-based document line.
        line: usize,
    },

    /// A kit component needs an identifier the shipped unit does not carry.
    #[error("unit of {sku} has no identifier for component {position} (line {line})")]
    UnitWithoutIdentifier {
        /// The kit SKU.
        sku: Sku,
        /// The component position within the kit.
        position: NonZeroUsize,
        /// Zero-based document line.
        line: usize,
    },

    /// A kit has more components than the provider reports identifiers for.
    #[error("kit {sku} has a component at position {position}, but at most {limit} are supported")]
    UnsupportedKit {
        /// The kit SKU.
        sku: Sku,
        /// The offending component position.
        position: NonZeroUsize,
        /// The provider's component limit.
        limit: NonZeroUsize,
    },

    /// The integration id has already been correlated.
    #[error(
        "there is already a record for integration id {key} (document {document}, recorded \
         {recorded_at}); delete it and the document first to re-run"
    )]
    DuplicateCorrelationKey {
        /// The integration id.
        key: IntegrationKey,
        /// The document created by the earlier run.
        document: DocumentId,
        /// When the earlier run completed.
        recorded_at: DateTime<Utc>,
    },

    /// No profile is configured for the provider name.
    #[error("no 3PL provider named '{0}' is configured")]
    UnknownProvider(String),

    /// A collaborator call failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The correlation ledger failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl Error {
    /// A message suitable for the person operating the integration.
    ///
    /// Unknown inventory numbers are reported by value; other errors fall back
    /// to their display text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::IdentifierNotFound { value, .. } => {
                format!("Wrong serial number ({value}) was used --- {self}")
            }
            Self::Payload(PayloadError::Empty) => format!(
                "Could not get information about the items dispatched: {self}"
            ),
            _ => self.to_string(),
        }
    }
}
