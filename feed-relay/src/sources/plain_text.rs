use scraper::{ElementRef, Html, Node};

use crate::text::collapse_whitespace;
use crate::traits::DescriptionCleaner;

/// Default cleaner: drops markup, decodes entities and collapses whitespace.
#[derive(Debug, Clone, Default)]
pub struct PlainTextCleaner;

impl PlainTextCleaner {
    pub fn new() -> Self {
        Self
    }
}

impl DescriptionCleaner for PlainTextCleaner {
    fn name(&self) -> String {
        "plain-text".to_string()
    }

    fn clean(&self, raw: &str) -> Option<String> {
        extract_text(raw, |_| false)
    }
}

/// Visible text of an HTML fragment. Elements for which `skip` returns true
/// are dropped together with everything inside them.
pub(crate) fn extract_text<F>(raw: &str, skip: F) -> Option<String>
where
    F: Fn(&ElementRef<'_>) -> bool,
{
    let fragment = Html::parse_fragment(raw);
    let mut text = String::new();
    collect(fragment.root_element(), &skip, &mut text);

    let text = collapse_whitespace(&text);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn collect<F>(element: ElementRef<'_>, skip: &F, out: &mut String)
where
    F: Fn(&ElementRef<'_>) -> bool,
{
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(inner) => {
                if matches!(inner.name(), "script" | "style" | "noscript") {
                    continue;
                }
                let Some(child_element) = ElementRef::wrap(child) else {
                    continue;
                };
                if skip(&child_element) {
                    continue;
                }
                let separate = is_block(inner.name());
                if separate {
                    out.push(' ');
                }
                collect(child_element, skip, out);
                if separate {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div" | "br" | "li" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
            | "blockquote" | "pre" | "section" | "article" | "figure" | "figcaption" | "table"
            | "tr" | "td" | "th" | "hr"
    )
}
