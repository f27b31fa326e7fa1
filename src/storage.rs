//! Persistence of completed integrations.
//!
//! Every successful run is recorded under its integration id so that a
//! staging record replayed by the host cannot produce a second document.

mod ledger;

pub use ledger::{
    CorrelationLedger, FileLedger, IntegrationKey, LedgerEntry, LedgerError, MemoryLedger,
    payload_fingerprint,
};
