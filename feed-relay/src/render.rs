//! Post templates.
//!
//! Placeholders are `{title}`, `{url}`, `{blog_name}`, `{date}`,
//! `{description}`, `{summary}`, `{key_points}` and `{footer}`. Unknown
//! placeholders are left as written, and substituted values are never
//! expanded again.

use crate::summary::Summary;
use crate::traits::{ContentRenderer, RenderedPost};
use crate::types::{Article, TemplateKind};

#[derive(Debug, Clone, PartialEq)]
pub struct PostTemplate {
    pub title: String,
    pub body: String,
    /// Body used instead of `body` when no summary is available.
    pub body_without_summary: Option<String>,
    pub footer: String,
}

impl PostTemplate {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            body_without_summary: None,
            footer: String::new(),
        }
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    pub fn builtin(kind: TemplateKind, footer: impl Into<String>) -> Self {
        let template = match kind {
            TemplateKind::Link => Self::link(),
            TemplateKind::Description => Self::description(),
            TemplateKind::Summary => Self::summary(),
        };
        template.with_footer(footer)
    }

    pub fn link() -> Self {
        Self::new(
            "[{blog_name}] {title}",
            "Check out [{title}]({url}) by {blog_name}\n\n-----\n\n{footer}",
        )
    }

    pub fn description() -> Self {
        Self::new(
            "[Blog] {title}",
            "[Read full post by {blog_name}]({url})\n\n-----\n\n{description}\n\n-----\n\n{footer}",
        )
    }

    pub fn summary() -> Self {
        let mut template = Self::new(
            "{title}",
            "{summary}\n\n{key_points}\n\n[Read more]({url})",
        );
        template.body_without_summary = Some("[Read more]({url})".to_string());
        template
    }

    fn fill(&self, template: &str, article: &Article, summary: Option<&Summary>) -> String {
        let mut out = String::with_capacity(template.len() + 64);
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after
                .find('}')
                .and_then(|close| self.value(&after[..close], article, summary).map(|v| (close, v)));
            match value {
                Some((close, value)) => {
                    out.push_str(&value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn value(&self, name: &str, article: &Article, summary: Option<&Summary>) -> Option<String> {
        let value = match name {
            "title" => article.title.clone(),
            "url" => article.url.clone(),
            "blog_name" => article.blog_name.clone(),
            "date" => article.date_published.format("%Y-%m-%d").to_string(),
            "description" => article
                .description
                .as_deref()
                .map(|d| d.replace(['\r', '\n'], " ").trim().to_string())
                .unwrap_or_default(),
            "summary" => summary.map(|s| s.text.clone()).unwrap_or_default(),
            "key_points" => summary
                .map(|s| {
                    s.key_points
                        .iter()
                        .map(|point| format!("- {point}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .unwrap_or_default(),
            "footer" => self.footer.clone(),
            _ => return None,
        };
        Some(value)
    }
}

impl ContentRenderer for PostTemplate {
    fn render(&self, article: &Article, summary: Option<&Summary>) -> RenderedPost {
        let body = match (summary, &self.body_without_summary) {
            (None, Some(fallback)) => fallback,
            _ => &self.body,
        };
        RenderedPost {
            title: self.fill(&self.title, article, summary),
            body: squeeze_blank_lines(&self.fill(body, article, summary)),
        }
    }
}

// An empty placeholder on its own line would leave a gap; keep at most one
// blank line in a row.
fn squeeze_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(ch);
    }
    out
}
