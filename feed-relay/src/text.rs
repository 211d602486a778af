//! Sentence and chunk splitting for long article bodies.

/// Lazily yields the sentences of `text`. A sentence ends at whitespace that
/// follows `.`, `!` or `?`; empty pieces are skipped.
pub fn split_sentences(text: &str) -> Sentences<'_> {
    Sentences { rest: text }
}

pub struct Sentences<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Sentences<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while !self.rest.is_empty() {
            let (sentence, rest) = split_at_boundary(self.rest);
            self.rest = rest;
            let sentence = sentence.trim();
            if !sentence.is_empty() {
                return Some(sentence);
            }
        }
        None
    }
}

fn split_at_boundary(text: &str) -> (&str, &str) {
    let mut after_terminal = false;
    for (index, ch) in text.char_indices() {
        if after_terminal && ch.is_whitespace() {
            return (&text[..index], text[index..].trim_start());
        }
        after_terminal = matches!(ch, '.' | '!' | '?');
    }
    (text, "")
}

/// Groups the lines of `text` into chunks of `size` paragraphs, each rejoined
/// with `\n`. Blank input gives no chunks; a size of zero is treated as one.
pub fn split_chunks(text: &str, size: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let paragraphs: Vec<&str> = text.lines().collect();
    paragraphs
        .chunks(size.max(1))
        .map(|group| group.join("\n"))
        .collect()
}

/// Cuts `text` to at most `max_tokens` whitespace-separated tokens.
pub fn truncate_tokens(text: &str, max_tokens: usize) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() <= max_tokens {
        text.to_string()
    } else {
        tokens[..max_tokens].join(" ")
    }
}

/// Lowercased word tokens of at least two characters, stop words removed.
pub fn content_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| word.chars().count() >= 2)
        .filter(|word| !is_stop_word(word))
        .map(str::to_string)
        .collect()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Check if a word is a common English stop word
pub fn is_stop_word(word: &str) -> bool {
    matches!(
        word,
        "a" | "about" | "above" | "after" | "again" | "against" | "all" | "almost" | "alone" |
        "along" | "already" | "also" | "although" | "always" | "am" | "among" | "an" | "and" |
        "another" | "any" | "anyhow" | "anyone" | "anything" | "anyway" | "anywhere" | "are" |
        "around" | "as" | "at" | "back" | "be" | "became" | "because" | "become" | "becomes" |
        "been" | "before" | "behind" | "being" | "below" | "beside" | "besides" | "between" |
        "beyond" | "both" | "but" | "by" | "can" | "cannot" | "could" | "did" | "do" | "does" |
        "done" | "down" | "during" | "each" | "either" | "else" | "elsewhere" | "enough" |
        "etc" | "even" | "ever" | "every" | "everyone" | "everything" | "everywhere" | "except" |
        "few" | "first" | "for" | "former" | "from" | "further" | "get" | "give" | "go" | "had" |
        "has" | "have" | "he" | "hence" | "her" | "here" | "hers" | "herself" | "him" |
        "himself" | "his" | "how" | "however" | "if" | "in" | "indeed" | "into" | "is" | "it" |
        "its" | "itself" | "just" | "keep" | "last" | "latter" | "least" | "less" | "made" |
        "many" | "may" | "me" | "meanwhile" | "might" | "more" | "moreover" | "most" | "mostly" |
        "much" | "must" | "my" | "myself" | "namely" | "neither" | "never" | "nevertheless" |
        "next" | "no" | "nobody" | "none" | "nor" | "not" | "nothing" | "now" | "nowhere" |
        "of" | "off" | "often" | "on" | "once" | "one" | "only" | "onto" | "or" | "other" |
        "others" | "otherwise" | "our" | "ours" | "ourselves" | "out" | "over" | "own" | "per" |
        "perhaps" | "please" | "put" | "rather" | "re" | "same" | "see" | "seem" | "seemed" |
        "seems" | "several" | "she" | "should" | "since" | "so" | "some" | "somehow" |
        "someone" | "something" | "sometimes" | "somewhere" | "still" | "such" | "than" |
        "that" | "the" | "their" | "them" | "themselves" | "then" | "thence" | "there" |
        "thereafter" | "thereby" | "therefore" | "therein" | "these" | "they" | "this" |
        "those" | "though" | "through" | "throughout" | "thus" | "to" | "together" | "too" |
        "toward" | "towards" | "under" | "until" | "up" | "upon" | "us" | "very" | "via" |
        "was" | "we" | "well" | "were" | "what" | "whatever" | "when" | "whence" | "whenever" |
        "where" | "whereas" | "whether" | "which" | "while" | "who" | "whoever" | "whole" |
        "whom" | "whose" | "why" | "will" | "with" | "within" | "without" | "would" | "yet" |
        "you" | "your" | "yours" | "yourself" | "yourselves"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentences_split_after_terminal_punctuation() {
        let sentences: Vec<&str> = split_sentences("One. Two!  Three? Four").collect();
        assert_eq!(sentences, vec!["One.", "Two!", "Three?", "Four"]);
    }

    #[test]
    fn abbreviations_without_whitespace_stay_whole() {
        let sentences: Vec<&str> = split_sentences("Version 1.5 shipped.\n\nThen 2.0 came.").collect();
        assert_eq!(sentences, vec!["Version 1.5 shipped.", "Then 2.0 came."]);
    }

    #[test]
    fn blank_text_has_no_sentences() {
        assert_eq!(split_sentences("").count(), 0);
        assert_eq!(split_sentences(" \n\t ").count(), 0);
    }

    #[test]
    fn chunks_group_lines() {
        let chunks = split_chunks("a\nb\nc\nd\ne\nf", 5);
        assert_eq!(chunks, vec!["a\nb\nc\nd\ne".to_string(), "f".to_string()]);
    }

    #[test]
    fn chunk_edge_cases() {
        assert!(split_chunks("", 5).is_empty());
        assert!(split_chunks("  \n ", 5).is_empty());
        assert_eq!(split_chunks("a\nb", 0), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn truncation_counts_whitespace_tokens() {
        assert_eq!(truncate_tokens("one two three four", 2), "one two");
        assert_eq!(truncate_tokens("one  two", 5), "one  two");
    }

    #[test]
    fn content_words_drop_short_and_stop_words() {
        assert_eq!(content_words("The Dragon's hoard, a 5e rule!"), vec!["dragon", "hoard", "5e", "rule"]);
    }
}
