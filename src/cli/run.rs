use std::{
    fs,
    path::{Path, PathBuf},
};

use reconcile::{
    Config, Document, Integration, IntegrationReport, IntegrationRequest,
    storage::{CorrelationLedger, FileLedger, IntegrationKey, MemoryLedger},
};
use serde::Serialize;
use tracing::instrument;

use super::{CONFIG_FILE, fixture::Fixture};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// YAML fixture describing the source document and host catalog
    #[arg(long)]
    fixture: PathBuf,

    /// File holding the raw 3PL item payload
    #[arg(long)]
    payload: PathBuf,

    /// The 3PL provider name (e.g. OGL, FLG, KIN)
    #[arg(long)]
    provider: String,

    /// The integration id
    #[arg(long)]
    key: String,

    /// JSON ledger of completed integrations; in-memory when omitted
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Configuration file; defaults to `reconcile.toml` in the root, or the
    /// built-in providers if that does not exist
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Output<'a> {
    report: &'a IntegrationReport,
    document: &'a Document,
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = self.load_config(root)?;
        let mut fixture = Fixture::load(&self.fixture)?;
        let payload = fs::read_to_string(&self.payload).map_err(|e| {
            anyhow::anyhow!("Failed to read payload {}: {e}", self.payload.display())
        })?;

        let mut ledger: Box<dyn CorrelationLedger> = match &self.ledger {
            Some(path) => Box::new(FileLedger::open(path)?),
            None => Box::new(MemoryLedger::new()),
        };

        let tracking_number = fixture.tracking_number.take();
        let tracking_url = fixture.tracking_url.take();
        let source = fixture.source.clone();
        let (mut store, catalog) = fixture.into_host()?;

        let request = IntegrationRequest {
            key: IntegrationKey::new(&self.key),
            provider: &self.provider,
            source,
            payload: &payload,
            tracking_number: tracking_number.as_deref(),
            tracking_url: tracking_url.as_deref(),
        };

        let report = Integration::new(&config, &mut store, &catalog, &catalog, ledger.as_mut())
            .run(&request)
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;

        let (_, document) = store
            .saved()
            .last()
            .ok_or_else(|| anyhow::anyhow!("No document was saved"))?;

        let output = Output {
            report: &report,
            document,
        };
        print!("{}", serde_yaml::to_string(&output)?);
        Ok(())
    }

    fn load_config(&self, root: &Path) -> anyhow::Result<Config> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => {
                let path = root.join(CONFIG_FILE);
                if !path.exists() {
                    tracing::debug!("No {CONFIG_FILE} found, using built-in providers");
                    return Ok(Config::default());
                }
                path
            }
        };
        Config::load(&path).map_err(|e| anyhow::anyhow!(e))
    }
}
