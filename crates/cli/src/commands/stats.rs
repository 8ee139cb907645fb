//! Stats command handler.
//!
//! Describes the configured vector index.

use anyhow::Context;
use clap::Args;
use yaseen_core::Settings;

/// Describe the configured vector index
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, settings: &Settings) -> anyhow::Result<()> {
        tracing::info!("Executing stats command");

        let description = yaseen_knowledge::stats(settings).await?;

        if self.json {
            let json = serde_json::to_string_pretty(&description)
                .context("Failed to serialize index stats")?;
            println!("{}", json);
        } else {
            println!("Index:      {}", description.name);
            println!("Dimension:  {}", description.dimension);
            println!("Vectors:    {}", description.total_vectors);
            if let Some(namespace) = &settings.namespace {
                println!("Namespace:  {}", namespace);
            }
        }

        Ok(())
    }
}
