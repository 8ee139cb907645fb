//! Config command handler.

use anyhow::Context;
use clap::Args;
use yaseen_core::Settings;

/// Print the resolved settings
#[derive(Args, Debug)]
pub struct ConfigCommand {}

impl ConfigCommand {
    pub fn execute(&self, settings: &Settings) -> anyhow::Result<()> {
        // Secrets serialize as "***".
        let json = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;
        println!("{}", json);
        Ok(())
    }
}
