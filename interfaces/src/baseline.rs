use anyhow::Result;
use async_trait::async_trait;

use crate::defs::ChunkRequest;
use crate::defs::ChunkSummarizer;

/// Extractive stand-in for an abstractive model. Keeps the leading sentences
/// of a chunk until `min_len` words are covered, never going past `max_len`
/// words. Beam and length-penalty knobs have no meaning here and are ignored.
pub struct LeadSentenceSummarizer;

fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut after_terminal = false;
    for (index, ch) in text.char_indices() {
        if after_terminal && ch.is_whitespace() {
            let piece = text[start..index].trim();
            if !piece.is_empty() {
                out.push(piece);
            }
            start = index;
        }
        after_terminal = matches!(ch, '.' | '!' | '?');
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn lead(text: &str, min_len: usize, max_len: usize) -> String {
    let max_len = max_len.max(1);
    let mut picked: Vec<&str> = Vec::new();
    let mut words = 0;
    for sentence in sentences(text) {
        let count = sentence.split_whitespace().count();
        if !picked.is_empty() && words + count > max_len {
            break;
        }
        picked.push(sentence);
        words += count;
        if words >= min_len {
            break;
        }
    }
    if words > max_len {
        // A single sentence longer than the whole budget.
        return picked
            .join(" ")
            .split_whitespace()
            .take(max_len)
            .collect::<Vec<_>>()
            .join(" ");
    }
    picked.join(" ")
}

#[async_trait]
impl ChunkSummarizer for LeadSentenceSummarizer {
    fn name(&self) -> String {
        "lead-sentence baseline".to_owned()
    }

    async fn summarize_chunk(&self, request: &ChunkRequest<'_>) -> Result<String> {
        Ok(lead(request.text, request.min_len, request.max_len))
    }
}
