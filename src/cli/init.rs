use std::{fs, path::Path};

use tracing::instrument;

use super::CONFIG_FILE;

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// Overwrite an existing configuration
    #[arg(long)]
    force: bool,
}

impl Command {
    #[instrument]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Configuration already exists at {} (use --force to overwrite)",
                config_path.display()
            );
        }

        fs::create_dir_all(root)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", root.display()))?;

        let config = reconcile::Config::default();
        config
            .save(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to create {CONFIG_FILE}: {e}"))?;

        println!("Initialized 3PL configuration in {}", root.display());
        for (name, profile) in config.providers() {
            println!("  {name}: {:?}", profile.variant);
        }

        Ok(())
    }
}
