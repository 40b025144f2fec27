//! List registered cache backends.

use anyhow::Result;
use clap::Args;

use crate::cli::CliConfig;

/// Arguments of `pagecache backends`.
#[derive(Args, Debug)]
pub struct BackendsCommand {}

impl BackendsCommand {
    pub fn execute(self, cli: &CliConfig) -> Result<()> {
        for name in cli.registry().list_caches() {
            println!("{name}");
        }
        Ok(())
    }
}
