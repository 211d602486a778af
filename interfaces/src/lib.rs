pub mod baseline;
pub mod defs;
pub mod empty;
pub mod state;

pub use baseline::LeadSentenceSummarizer;
pub use defs::{ChunkRequest, ChunkSummarizer, ContentExtractor, DocumentKey, DocumentStore, ExtractedPage, FeedFetch, Publisher};
pub use empty::DryRunPublisher;
pub use state::MemoryDocumentStore;
