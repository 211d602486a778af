use std::collections::HashMap;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use interfaces::{DocumentKey, DocumentStore};
use serde::{Deserialize, Serialize};
use tracing::debug;

const GITHUB_API: &str = "https://api.github.com";

/// Document store backed by GitHub gists. A [`DocumentKey`] is the gist id
/// plus the file name inside the gist.
pub struct GistStore {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: HashMap<String, Option<GistFile>>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    raw_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct GistUpdate<'a> {
    files: HashMap<&'a str, FileUpdate<'a>>,
}

#[derive(Debug, Serialize)]
struct FileUpdate<'a> {
    content: &'a str,
}

impl GistStore {
    pub fn new(client: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            base_url: GITHUB_API.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn gist_url(&self, id: &str) -> String {
        format!("{}/gists/{}", self.base_url.trim_end_matches('/'), id)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", "application/vnd.github.v3+json")
    }
}

/// Content of `file_name` in a gist response. A file missing from the gist
/// reads as an empty document; a truncated one must be re-read from its raw
/// url.
fn file_content(response: GistResponse, file_name: &str) -> anyhow::Result<FileContent> {
    let Some(Some(file)) = response.files.get(file_name).map(|f| f.as_ref()) else {
        return Ok(FileContent::Inline(String::new()));
    };
    if file.truncated {
        let raw_url = file
            .raw_url
            .clone()
            .ok_or_else(|| anyhow!("{file_name} is truncated and has no raw_url"))?;
        return Ok(FileContent::Raw(raw_url));
    }
    Ok(FileContent::Inline(file.content.clone().unwrap_or_default()))
}

#[derive(Debug, PartialEq)]
enum FileContent {
    Inline(String),
    Raw(String),
}

#[async_trait]
impl DocumentStore for GistStore {
    async fn read(&self, key: &DocumentKey) -> anyhow::Result<String> {
        debug!("Reading gist document {}", key);
        let response: GistResponse = self
            .request(self.client.get(self.gist_url(&key.id)))
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("reading gist {}", key.id))?
            .json()
            .await?;

        match file_content(response, &key.file_name)? {
            FileContent::Inline(content) => Ok(content),
            FileContent::Raw(raw_url) => {
                debug!("{} is truncated, reading {}", key, raw_url);
                let content = self
                    .request(self.client.get(&raw_url))
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;
                Ok(content)
            }
        }
    }

    async fn write(&self, key: &DocumentKey, content: &str) -> anyhow::Result<()> {
        debug!("Writing gist document {} ({} bytes)", key, content.len());
        let update = GistUpdate {
            files: HashMap::from([(key.file_name.as_str(), FileUpdate { content })]),
        };
        self.request(self.client.patch(self.gist_url(&key.id)))
            .json(&update)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("updating gist {}", key.id))?;
        Ok(())
    }
}
