pub mod config;
pub mod dates;
pub mod extract;
pub mod fetcher;
pub mod gist;
pub mod ingest;
pub mod parser;
pub mod publish;
pub mod ranking;
pub mod relay;
pub mod render;
pub mod sources;
pub mod squabblr;
pub mod store;
pub mod summarizers;
pub mod summary;
pub mod text;
pub mod tracker;
pub mod traits;
pub mod types;

pub use config::{Credentials, RelayConfig};
pub use extract::PageExtractor;
pub use fetcher::Fetcher;
pub use gist::GistStore;
pub use ingest::{FeedIngestor, IngestReport, SourceReport};
pub use parser::FeedParser;
pub use publish::{PublishResult, PublishingStateMachine, SummarySource};
pub use relay::{IngestOutcome, Relay};
pub use render::PostTemplate;
pub use sources::{ClassFilterCleaner, CleanerRegistry, PlainTextCleaner};
pub use squabblr::SquabblrPublisher;
pub use store::{ArticleRepository, ArticleStore};
pub use summarizers::HuggingFaceSummarizer;
pub use summary::{Summary, SummaryEngine};
pub use tracker::{Tracker, TrackerRepository, TrackerShape};
pub use traits::{ContentRenderer, DescriptionCleaner, RenderedPost};
pub use types::*;
