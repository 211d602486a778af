use crate::sources::plain_text::extract_text;
use crate::traits::DescriptionCleaner;

/// Plain-text cleaning that also drops elements carrying any of the given CSS
/// classes, for feeds that embed share bars or ads in their descriptions.
#[derive(Debug, Clone)]
pub struct ClassFilterCleaner {
    skip_classes: Vec<String>,
}

impl ClassFilterCleaner {
    pub fn new<I, S>(skip_classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            skip_classes: skip_classes.into_iter().map(Into::into).collect(),
        }
    }
}

impl DescriptionCleaner for ClassFilterCleaner {
    fn name(&self) -> String {
        format!("class-filter ({})", self.skip_classes.join(", "))
    }

    fn clean(&self, raw: &str) -> Option<String> {
        extract_text(raw, |element| {
            element
                .value()
                .classes()
                .any(|class| self.skip_classes.iter().any(|skip| skip == class))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_classes_take_their_children_along() {
        let cleaner = ClassFilterCleaner::new(["share", "ad"]);
        let raw = r#"<div>Real text.<div class="share-bar share"><a>Tweet</a> this</div><p class="lead">More.</p><span class="ad">Buy!</span></div>"#;
        assert_eq!(cleaner.clean(raw).as_deref(), Some("Real text. More."));
    }

    #[test]
    fn nothing_left_is_none() {
        let cleaner = ClassFilterCleaner::new(["share"]);
        assert_eq!(cleaner.clean(r#"<p class="share">x</p>"#), None);
    }
}
