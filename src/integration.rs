//! One 3PL staging record turned into a host document.
//!
//! An [`Integration`] ties the correlator to the host: it guards against
//! replays through the [`CorrelationLedger`], asks the host for the document
//! skeleton, correlates it with the payload, stamps tracking details, and
//! saves the result.

use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use crate::{
    Error,
    correlate::{CorrelationOutcome, Correlator},
    domain::{
        Config, DocumentId, DocumentKind, DocumentRef,
        tracking::{normalize_tracking_number, normalize_tracking_url},
    },
    host::{DocumentStore, HostError, IdentifierResolver, SkuLookup},
    storage::{CorrelationLedger, IntegrationKey, LedgerEntry, payload_fingerprint},
};

/// The contents of a staging record.
#[derive(Debug, Clone)]
pub struct IntegrationRequest<'a> {
    /// The integration id.
    pub key: IntegrationKey,
    /// The 3PL provider name.
    pub provider: &'a str,
    /// The sales order or return authorisation being fulfilled or received.
    pub source: DocumentRef,
    /// The raw item payload.
    pub payload: &'a str,
    /// Raw tracking number(s), if the 3PL reported any.
    pub tracking_number: Option<&'a str>,
    /// Raw tracking URL, if the 3PL reported one.
    pub tracking_url: Option<&'a str>,
}

/// The result of a successful integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrationReport {
    /// The integration id.
    pub key: IntegrationKey,
    /// The kind of document created.
    pub kind: DocumentKind,
    /// The id of the document created.
    pub document: DocumentId,
    /// What correlation did to each line.
    pub outcome: CorrelationOutcome,
}

/// Runs integrations against a host.
pub struct Integration<'h> {
    config: &'h Config,
    store: &'h mut dyn DocumentStore,
    correlator: Correlator<'h>,
    ledger: &'h mut dyn CorrelationLedger,
}

impl<'h> Integration<'h> {
    /// Creates an integration runner.
    pub fn new(
        config: &'h Config,
        store: &'h mut dyn DocumentStore,
        skus: &'h dyn SkuLookup,
        resolver: &'h dyn IdentifierResolver,
        ledger: &'h mut dyn CorrelationLedger,
    ) -> Self {
        Self {
            config,
            store,
            correlator: Correlator::new(skus, resolver),
            ledger,
        }
    }

    /// Creates the fulfilment or receipt described by `request`.
    ///
    /// Nothing is saved unless every step succeeds. The ledger entry is
    /// written after the document is saved.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateCorrelationKey`] if the integration id already ran
    /// - [`Error::UnknownProvider`] if no profile matches the provider name
    /// - any correlation error, see [`Correlator::correlate`]
    /// - [`Error::Host`] or [`Error::Ledger`] if a collaborator fails
    #[instrument(skip_all, fields(key = %request.key, provider = request.provider))]
    pub fn run(&mut self, request: &IntegrationRequest<'_>) -> Result<IntegrationReport, Error> {
        if let Some(entry) = self.ledger.lookup(&request.key)? {
            return Err(Error::DuplicateCorrelationKey {
                key: entry.key,
                document: entry.document,
                recorded_at: entry.recorded_at,
            });
        }

        let profile = self
            .config
            .provider(request.provider)
            .ok_or_else(|| Error::UnknownProvider(request.provider.to_string()))?;

        let target = request
            .source
            .kind
            .target()
            .ok_or(HostError::NotASource(request.source.kind))?;
        let mut document = self.store.transform_document(&request.source, target)?;

        let outcome = self
            .correlator
            .correlate(&mut document, request.payload, profile)?;

        document.tracking.number = request.tracking_number.and_then(normalize_tracking_number);
        document.tracking.url = request
            .tracking_url
            .and_then(|url| normalize_tracking_url(url, profile.url_whitespace));

        let id = self.store.save_document(&document)?;
        tracing::info!(kind = %target, document = %id, "saved document");

        self.ledger.record(LedgerEntry {
            key: request.key.clone(),
            document: id.clone(),
            payload_fingerprint: payload_fingerprint(request.payload),
            recorded_at: Utc::now(),
        })?;

        Ok(IntegrationReport {
            key: request.key.clone(),
            kind: target,
            document: id,
            outcome,
        })
    }
}
