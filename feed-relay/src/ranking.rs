//! Extractive key-point ranking.
//!
//! Sentences are scored by TF-IDF over unigrams and bigrams. A term only
//! counts when it occurs in at least [`MIN_DOCUMENT_FREQUENCY`] sentences and
//! in no more than [`MAX_DOCUMENT_SHARE`] of them. Each sentence's weight vector
//! is l2-normalized and its score is the sum of its weights.

use std::collections::{HashMap, HashSet};

use crate::text::{content_words, split_sentences};

pub const MIN_DOCUMENT_FREQUENCY: usize = 3;
pub const MAX_DOCUMENT_SHARE: f64 = 0.9;

/// The `limit` highest scoring sentences of `text`, best first. Equal scores
/// keep their original order. Empty when no term survives pruning.
pub fn key_sentences(text: &str, limit: usize) -> Vec<String> {
    let sentences: Vec<&str> = split_sentences(text).collect();
    let scores = score_sentences(&sentences);
    if scores.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..sentences.len()).collect();
    order.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));
    order
        .into_iter()
        .take(limit)
        .map(|index| sentences[index].to_string())
        .collect()
}

/// One score per sentence, or an empty vector when the pruned vocabulary is
/// empty.
pub fn score_sentences(sentences: &[&str]) -> Vec<f64> {
    let documents: Vec<Vec<String>> = sentences.iter().map(|s| terms(s)).collect();
    let total = documents.len();
    if total == 0 {
        return Vec::new();
    }

    let mut document_frequency: HashMap<&str, usize> = HashMap::new();
    for document in &documents {
        let unique: HashSet<&str> = document.iter().map(String::as_str).collect();
        for term in unique {
            *document_frequency.entry(term).or_insert(0) += 1;
        }
    }

    let max_documents = MAX_DOCUMENT_SHARE * total as f64;
    let idf: HashMap<&str, f64> = document_frequency
        .into_iter()
        .filter(|(_, df)| *df >= MIN_DOCUMENT_FREQUENCY && (*df as f64) <= max_documents)
        .map(|(term, df)| (term, ((1.0 + total as f64) / (1.0 + df as f64)).ln() + 1.0))
        .collect();
    if idf.is_empty() {
        return Vec::new();
    }

    documents
        .iter()
        .map(|document| {
            let mut counts: HashMap<&str, f64> = HashMap::new();
            for term in document {
                if let Some(weight) = idf.get(term.as_str()) {
                    *counts.entry(term.as_str()).or_insert(0.0) += weight;
                }
            }
            let norm = counts.values().map(|w| w * w).sum::<f64>().sqrt();
            if norm == 0.0 {
                0.0
            } else {
                counts.values().sum::<f64>() / norm
            }
        })
        .collect()
}

/// Unigrams and bigrams of a sentence's content words.
fn terms(sentence: &str) -> Vec<String> {
    let words = content_words(sentence);
    let mut terms = words.clone();
    terms.extend(words.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    terms
}
