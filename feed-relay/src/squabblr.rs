use anyhow::{anyhow, bail};
use async_trait::async_trait;
use interfaces::Publisher;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

const SQUABBLR_POSTS: &str = "https://squabblr.co/api/new-post";

/// Publishes posts to a Squabblr community.
pub struct SquabblrPublisher {
    client: reqwest::Client,
    token: String,
    community: String,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct NewPost<'a> {
    community_name: &'a str,
    title: &'a str,
    content: &'a str,
}

impl SquabblrPublisher {
    pub fn new(client: reqwest::Client, token: impl Into<String>, community: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            community: community.into(),
            endpoint: SQUABBLR_POSTS.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Decide whether a response is a successful post and pull out its id.
fn interpret_response(status: StatusCode, body: &str) -> anyhow::Result<String> {
    if status != StatusCode::OK && status != StatusCode::CREATED {
        bail!("HTTP {}: {}", status, body.trim());
    }

    let value: Value = serde_json::from_str(body).map_err(|e| anyhow!("unreadable response body: {e}"))?;
    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        bail!("platform rejected the post: {}", error);
    }
    extract_post_id(&value).ok_or_else(|| anyhow!("response carries no post id"))
}

fn extract_post_id(value: &Value) -> Option<String> {
    let candidates = [value, value.get("data").unwrap_or(&Value::Null)];
    candidates.iter().find_map(|object| {
        ["hash_id", "id", "post_id"]
            .iter()
            .find_map(|field| object.get(*field))
            .and_then(|id| match id {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    })
}

#[async_trait]
impl Publisher for SquabblrPublisher {
    async fn publish(&self, title: &str, body: &str) -> anyhow::Result<String> {
        info!("Posting '{}' to /s/{}", title, self.community);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .form(&NewPost {
                community_name: &self.community,
                title,
                content: body,
            })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!("Squabblr answered {}: {}", status, text);
        interpret_response(status, &text)
    }
}
