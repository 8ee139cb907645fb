//! Ask command handler.
//!
//! Runs one question through the answer pipeline and prints the response.

use anyhow::Context;
use clap::Args;
use yaseen_core::Settings;
use yaseen_knowledge::{AnswerPipeline, ChatResponse, Query};

/// Ask a question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask (at least 3 characters)
    pub query: String,

    /// Number of passages to retrieve
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Pretty-print the JSON response
    #[arg(long)]
    pub pretty: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, settings: &Settings) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        // Reject bad input before any client is built.
        let query = Query::parse(&self.query)?;

        let mut settings = settings.clone();
        if let Some(top_k) = self.top_k {
            settings.top_k = top_k;
        }

        let pipeline =
            AnswerPipeline::from_settings(&settings).context("Failed to build answer pipeline")?;

        let response = pipeline.answer(&query).await?;

        println!("{}", render(&response, self.pretty)?);
        Ok(())
    }
}

fn render(response: &ChatResponse, pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(response)
    } else {
        serde_json::to_string(response)
    };
    json.context("Failed to serialize response")
}
