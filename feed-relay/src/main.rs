use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use feed_relay::summarizers::DEFAULT_MODEL;
use feed_relay::{
    Credentials, Fetcher, GistStore, HuggingFaceSummarizer, IngestOutcome, PageExtractor, PublishResult, Relay,
    RelayConfig, SelectionPolicy, SquabblrPublisher, TemplateKind,
};
use interfaces::{
    ChunkSummarizer, DocumentKey, DocumentStore, DryRunPublisher, LeadSentenceSummarizer, MemoryDocumentStore,
    Publisher,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum SummarizerKind {
    /// Leading sentences of each chunk, no model needed; runs without a prompt prefix
    #[default]
    Baseline,
    /// Hugging Face inference API
    Huggingface,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch tracked feeds and store new articles
    Ingest,
    /// Post the next unposted article
    Publish,
    /// Ingest, then publish one article
    Run,
}

#[derive(Debug, Parser)]
#[command(name = "feed-relay", version, about = "Relays blog articles from RSS feeds to a Squabblr community")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Gist holding the tracker document
    #[arg(long, env = "FEED_RELAY_TRACKER_GIST")]
    tracker_gist: String,

    #[arg(long, env = "FEED_RELAY_TRACKER_FILE", default_value = "rss-tracker.json")]
    tracker_file: String,

    /// Gist holding the article store
    #[arg(long, env = "FEED_RELAY_ARTICLES_GIST")]
    articles_gist: String,

    #[arg(long, env = "FEED_RELAY_ARTICLES_FILE", default_value = "article-details.json")]
    articles_file: String,

    #[arg(long, env = "FEED_RELAY_COMMUNITY", default_value = "dnd")]
    community: String,

    #[arg(long, env = "FEED_RELAY_FOOTER")]
    footer: Option<String>,

    /// Work on a copy of the documents and print posts instead of sending them
    #[arg(long, global = true)]
    dry_run: bool,

    #[arg(long, value_enum, default_value_t, global = true)]
    policy: SelectionPolicy,

    #[arg(long, value_enum, default_value_t, global = true)]
    template: TemplateKind,

    /// Summarize article pages before posting
    #[arg(long, global = true)]
    summarize: bool,

    #[arg(long, value_enum, default_value_t, global = true)]
    summarizer: SummarizerKind,

    #[arg(long, env = "FEED_RELAY_HF_MODEL", default_value = DEFAULT_MODEL)]
    model: String,
}

impl Cli {
    fn relay_config(&self) -> RelayConfig {
        let mut config = RelayConfig::new(
            DocumentKey::new(&self.tracker_gist, &self.tracker_file),
            DocumentKey::new(&self.articles_gist, &self.articles_file),
        );
        config.publish.policy = self.policy;
        config.publish.template = self.template;
        config.publish.community = self.community.clone();
        config.publish.summarize = self.summarize;
        if let Some(footer) = &self.footer {
            config.publish.footer = footer.clone();
        }
        if matches!(self.summarizer, SummarizerKind::Baseline) {
            config.summary.prompt_prefix = None;
        }
        config
    }
}

/// Copy the documents a run touches into memory so a dry run never writes
/// back to the real store.
async fn snapshot(source: &dyn DocumentStore, keys: &[&DocumentKey]) -> anyhow::Result<MemoryDocumentStore> {
    let memory = MemoryDocumentStore::new();
    for key in keys {
        let content = source
            .read(key)
            .await
            .with_context(|| format!("reading {key} for the dry run"))?;
        memory.insert((*key).clone(), content).await;
    }
    Ok(memory)
}

fn report_ingest(outcome: &IngestOutcome) {
    for source in &outcome.report.sources {
        match &source.error {
            Some(error) => warn!("{}: failed ({})", source.blog_name, error),
            None => info!(
                "{}: {} new of {} entries, {} skipped",
                source.blog_name, source.accepted, source.entries_found, source.skipped
            ),
        }
    }
    info!(
        "Ingest complete: {} articles added, {} watermarks advanced",
        outcome.added, outcome.watermarks_advanced
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.relay_config();
    let credentials = Credentials::from_env();
    info!("Starting feed-relay {:?}", cli.command);

    let client = reqwest::Client::builder()
        .user_agent(&config.fetch.user_agent)
        .timeout(Duration::from_secs(config.fetch.timeout_seconds))
        .build()?;

    let gist_token = Credentials::require(&credentials.gist_token, "FEED_RELAY_GIST_TOKEN")?;
    let gists: Arc<dyn DocumentStore> = Arc::new(GistStore::new(client.clone(), gist_token));

    let dry_run = cli.dry_run.then(|| Arc::new(DryRunPublisher::new()));
    let (documents, publisher): (Arc<dyn DocumentStore>, Arc<dyn Publisher>) = match &dry_run {
        Some(dry_run) => {
            info!("Dry run: documents are copied and nothing is posted");
            let copy = snapshot(gists.as_ref(), &[&config.tracker_key, &config.articles_key]).await?;
            (Arc::new(copy), dry_run.clone())
        }
        None => {
            let token = Credentials::require(&credentials.squabblr_token, "FEED_RELAY_SQUABBLR_TOKEN")?;
            (gists, Arc::new(SquabblrPublisher::new(client.clone(), token, &cli.community)))
        }
    };

    let fetcher = Arc::new(Fetcher::new(config.fetch.clone())?);
    let mut relay = Relay::new(config.clone(), documents, fetcher, publisher);

    if cli.summarize {
        let summarizer: Arc<dyn ChunkSummarizer> = match cli.summarizer {
            SummarizerKind::Baseline => Arc::new(LeadSentenceSummarizer),
            SummarizerKind::Huggingface => {
                let token = Credentials::require(&credentials.huggingface_token, "FEED_RELAY_HF_TOKEN")?;
                Arc::new(HuggingFaceSummarizer::new(client.clone(), token).with_model(&cli.model))
            }
        };
        let extractor = Arc::new(PageExtractor::with_browser_agent(&config.fetch)?);
        relay = relay.with_summaries(extractor, summarizer);
    }

    let published = match cli.command {
        Command::Ingest => {
            report_ingest(&relay.run_ingest().await?);
            None
        }
        Command::Publish => Some(relay.run_publish().await?),
        Command::Run => {
            let (outcome, published) = relay.run().await?;
            report_ingest(&outcome);
            Some(published)
        }
    };

    if let Some(dry_run) = &dry_run {
        for (title, body) in dry_run.posts() {
            info!("Would post '{}':\n{}", title, body);
        }
    }

    if let Some(error) = published.as_ref().and_then(PublishResult::error) {
        return Err(error.into());
    }

    info!("feed-relay finished");
    Ok(())
}
