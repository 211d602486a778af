use std::sync::Arc;

use anyhow::anyhow;
use interfaces::{ChunkRequest, ChunkSummarizer};
use tracing::{debug, info, warn};

use crate::ranking::key_sentences;
use crate::text::{split_chunks, split_sentences, truncate_tokens};
use crate::types::{RelayError, Result, SummaryConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub text: String,
    pub key_points: Vec<String>,
}

/// Bounded-length summaries of arbitrarily long bodies: chunks are summarized
/// independently, recombined and trimmed, and key points are ranked from the
/// original body.
pub struct SummaryEngine {
    summarizer: Arc<dyn ChunkSummarizer>,
    config: SummaryConfig,
}

impl SummaryEngine {
    pub fn new(summarizer: Arc<dyn ChunkSummarizer>, config: SummaryConfig) -> Self {
        Self { summarizer, config }
    }

    /// Summarize `body`. Blank input is an error; any failure after that is
    /// logged and reported as `Ok(None)` so callers can post without a summary.
    pub async fn summarize(&self, body: &str) -> Result<Option<Summary>> {
        if body.trim().is_empty() {
            return Err(RelayError::EmptyContent);
        }

        match self.build(body).await {
            Ok(summary) => {
                info!(
                    "Summarized {} chars into {} chars with {} key points",
                    body.len(),
                    summary.text.len(),
                    summary.key_points.len()
                );
                Ok(Some(summary))
            }
            Err(e) => {
                warn!("Summarization with {} failed: {}", self.summarizer.name(), e);
                Ok(None)
            }
        }
    }

    async fn build(&self, body: &str) -> Result<Summary> {
        let chunks = split_chunks(body, self.config.chunk_size);
        let mut pieces = Vec::with_capacity(chunks.len());

        for (index, chunk) in chunks.iter().enumerate() {
            if chunk.trim().is_empty() {
                continue;
            }
            let input = self.prepare_input(chunk);
            let request = ChunkRequest {
                text: &input,
                min_len: self.config.min_length,
                max_len: self.config.max_length,
                num_beams: self.config.num_beams,
                length_penalty: self.config.length_penalty,
            };
            let piece = self.summarizer.summarize_chunk(&request).await?;
            debug!("Chunk {}/{} summarized into {} chars", index + 1, chunks.len(), piece.len());

            let piece = piece.trim();
            if !piece.is_empty() {
                pieces.push(piece.to_string());
            }
        }

        let text = self.trim_summary(&pieces.join(" "));
        if text.is_empty() {
            return Err(anyhow!("summarizer returned no usable sentences").into());
        }

        let key_points = key_sentences(body, self.config.key_points)
            .into_iter()
            .map(|point| point.trim().to_string())
            .filter(|point| !point.is_empty() && !text.contains(point.as_str()))
            .collect();

        Ok(Summary { text, key_points })
    }

    fn prepare_input(&self, chunk: &str) -> String {
        let input = match &self.config.prompt_prefix {
            Some(prefix) => format!("{prefix}{chunk}"),
            None => chunk.to_string(),
        };
        truncate_tokens(&input, self.config.max_input_tokens)
    }

    /// First N sentences of the recombined text, prompt echoes removed.
    fn trim_summary(&self, combined: &str) -> String {
        split_sentences(combined)
            .take(self.config.max_summary_sentences)
            .filter(|sentence| !self.is_artifact(sentence))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn is_artifact(&self, sentence: &str) -> bool {
        let lowered = sentence.trim_start().to_lowercase();
        self.config
            .artifact_markers
            .iter()
            .any(|marker| !marker.is_empty() && lowered.starts_with(&marker.to_lowercase()))
    }
}
