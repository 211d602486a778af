use anyhow::{anyhow, bail};
use async_trait::async_trait;
use interfaces::{ChunkRequest, ChunkSummarizer};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_MODEL: &str = "facebook/bart-large-cnn";
const INFERENCE_API: &str = "https://api-inference.huggingface.co/models";

/// Abstractive chunk summaries from the Hugging Face inference API.
pub struct HuggingFaceSummarizer {
    client: reqwest::Client,
    token: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Parameters {
    min_length: usize,
    max_length: usize,
    num_beams: u32,
    length_penalty: f32,
    early_stopping: bool,
}

#[derive(Debug, Deserialize)]
struct InferenceOutput {
    summary_text: String,
}

impl HuggingFaceSummarizer {
    pub fn new(client: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: INFERENCE_API.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.model)
    }
}

fn build_request<'a>(request: &ChunkRequest<'a>) -> InferenceRequest<'a> {
    InferenceRequest {
        inputs: request.text,
        parameters: Parameters {
            min_length: request.min_len,
            max_length: request.max_len,
            num_beams: request.num_beams,
            length_penalty: request.length_penalty,
            early_stopping: true,
        },
    }
}

fn first_summary(outputs: Vec<InferenceOutput>) -> anyhow::Result<String> {
    outputs
        .into_iter()
        .next()
        .map(|output| output.summary_text)
        .ok_or_else(|| anyhow!("inference API returned no summaries"))
}

#[async_trait]
impl ChunkSummarizer for HuggingFaceSummarizer {
    fn name(&self) -> String {
        format!("huggingface ({})", self.model)
    }

    async fn summarize_chunk(&self, request: &ChunkRequest<'_>) -> anyhow::Result<String> {
        debug!("Summarizing {} chars with {}", request.text.len(), self.model);
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.token)
            .json(&build_request(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("HTTP {}: {}", status, body.trim());
        }
        first_summary(response.json().await?)
    }
}
