use regex::Regex;
use std::sync::LazyLock;

/// Token the model writes once the story is finished.
pub const SENTINEL: &str = "IAMDONE";

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

// Terminal punctuation, optional closing quotes/brackets, then whitespace or end of text.
static SENTENCE_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([.!?]+["'”’)\]]*)(?:\s+|$)"#).unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub fn word_count(text: &str) -> usize {
    WORD_RE.find_iter(text).count()
}

/// Byte offsets just past each complete sentence.
fn sentence_ends(text: &str) -> Vec<usize> {
    SENTENCE_END_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.end()))
        .collect()
}

/// Splits into trimmed sentences. Trailing text without terminal punctuation is kept
/// as a last sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for end in sentence_ends(text) {
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = end;
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Hard cut before word `max_words + 1`. Text already within budget is returned as is.
pub fn truncate_words(text: &str, max_words: usize) -> &str {
    match WORD_RE.find_iter(text).nth(max_words) {
        Some(m) => text[..m.start()].trim_end(),
        None => text,
    }
}

/// Cuts to `max_words`, then backs off to the last whole sentence.
/// Falls back to the raw cut when not even one sentence fits.
pub fn trim_to_budget(text: &str, max_words: usize) -> &str {
    if word_count(text) <= max_words {
        return text;
    }
    let cut = truncate_words(text, max_words);
    match sentence_ends(cut).last() {
        Some(&end) => cut[..end].trim_end(),
        None => cut,
    }
}

/// Regroups sentences into paragraphs separated by blank lines.
pub fn reflow_paragraphs(text: &str, sentences_per_paragraph: usize) -> String {
    let per_paragraph = sentences_per_paragraph.max(1);
    let sentences: Vec<String> = split_sentences(text)
        .into_iter()
        .map(|s| WHITESPACE_RE.replace_all(s, " ").into_owned())
        .collect();

    sentences
        .chunks(per_paragraph)
        .map(|chunk| chunk.join(" "))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Turns the raw concatenated draft into the final story.
pub fn finalize(draft: &str, target_words: usize, sentences_per_paragraph: usize) -> String {
    let cleaned = draft.replace(SENTINEL, "");
    let trimmed = trim_to_budget(cleaned.trim(), target_words);
    reflow_paragraphs(trimmed, sentences_per_paragraph)
}
