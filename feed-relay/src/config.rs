use interfaces::DocumentKey;
use tracing::info;

use crate::types::{FetchConfig, PublishConfig, RelayError, Result, SummaryConfig};

/// Everything a run needs besides credentials. Built once by the binary and
/// handed to each component.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub tracker_key: DocumentKey,
    pub articles_key: DocumentKey,
    pub fetch: FetchConfig,
    pub summary: SummaryConfig,
    pub publish: PublishConfig,
}

impl RelayConfig {
    pub fn new(tracker_key: DocumentKey, articles_key: DocumentKey) -> Self {
        Self {
            tracker_key,
            articles_key,
            fetch: FetchConfig::default(),
            summary: SummaryConfig::default(),
            publish: PublishConfig::default(),
        }
    }
}

/// API tokens, read from the environment only.
#[derive(Clone, Default)]
pub struct Credentials {
    pub gist_token: Option<String>,
    pub squabblr_token: Option<String>,
    pub huggingface_token: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|value| !value.trim().is_empty());
        let credentials = Self {
            gist_token: read("FEED_RELAY_GIST_TOKEN"),
            squabblr_token: read("FEED_RELAY_SQUABBLR_TOKEN"),
            huggingface_token: read("FEED_RELAY_HF_TOKEN"),
        };
        credentials.log_keys();
        credentials
    }

    pub fn require(value: &Option<String>, name: &str) -> Result<String> {
        value
            .clone()
            .ok_or_else(|| RelayError::Config(format!("{name} is not set")))
    }

    fn log_keys(&self) {
        fn preview(value: &Option<String>) -> String {
            match value {
                Some(value) => {
                    let shown: String = value.chars().take(4).collect();
                    format!("{shown}...")
                }
                None => "(unset)".to_string(),
            }
        }

        info!(
            "Credentials: gist={} squabblr={} huggingface={}",
            preview(&self.gist_token),
            preview(&self.squabblr_token),
            preview(&self.huggingface_token)
        );
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("gist_token", &self.gist_token.as_ref().map(|_| "***"))
            .field("squabblr_token", &self.squabblr_token.as_ref().map(|_| "***"))
            .field("huggingface_token", &self.huggingface_token.as_ref().map(|_| "***"))
            .finish()
    }
}
