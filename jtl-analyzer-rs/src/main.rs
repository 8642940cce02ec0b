// jtl-analyzer-rs/src/main.rs
// Command-line entry point for analyzing load-test traces

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use correlation_engine_rs::{CorrelationEngine, HeuristicExtractor, SuggestionOutcome};
use reasoning_sdk::config::{extractor_config_from_provider, DEFAULT_PROVIDER};
use reasoning_sdk::suggestion_service::DEFAULT_CONCURRENCY;
use reasoning_sdk::{OpenAIClient, ReasoningConfig, SuggestionService};

mod ingest;
mod render;

use ingest::TraceFormat;

/// Find failed samples in a JMeter trace and the dynamic values they likely depend on
#[derive(Parser, Debug)]
#[command(name = "jtl-analyzer", version, about)]
struct Args {
    /// Trace file (JTL/XML or a JSON array of samples)
    trace: PathBuf,

    /// Input format; guessed from the file extension when omitted
    #[arg(long, value_enum)]
    format: Option<TraceFormat>,

    /// Ask the reasoning collaborator for a suggestion per failure
    #[arg(long)]
    suggest: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Maximum collaborator calls in flight
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let extractor_config =
        extractor_config_from_provider(&**DEFAULT_PROVIDER).context("invalid correlation settings")?;
    let extractor = HeuristicExtractor::new(extractor_config).context("invalid correlation settings")?;

    let records = ingest::load_trace(&args.trace, args.format)
        .with_context(|| format!("failed to load trace {}", args.trace.display()))?;

    let report = CorrelationEngine::new(extractor.clone()).analyze(&records);
    log::info!(
        "Found {} failures in {} samples across {} threads",
        report.failure_count(),
        report.total_records,
        report.thread_count
    );

    let suggestions: Option<Vec<SuggestionOutcome>> = if args.suggest && !report.all_passed() {
        let config = ReasoningConfig::from_env().context("reasoning collaborator is not configured")?;
        let client = OpenAIClient::new(config).context("failed to create reasoning client")?;
        let service = SuggestionService::new(Arc::new(client))
            .with_extractor(extractor)
            .with_concurrency(args.concurrency);

        Some(service.analyze_all(&report.failures).await)
    } else {
        None
    };

    let output = if args.json {
        render::render_json(&report, suggestions.as_deref()).context("failed to serialize report")?
    } else {
        render::render_text(&report, suggestions.as_deref())
    };
    println!("{}", output);

    Ok(())
}
