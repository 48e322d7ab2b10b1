use std::fmt::Write;

use ai_client::truncate_chars;
use persona_common::NormalizedItem;

use crate::normalizer::PARENT_CONTEXT_CHARS;

/// Hard cap on items rendered into one corpus.
pub const MAX_CORPUS_ITEMS: usize = 50;
/// Body preview length per item.
pub const CONTENT_PREVIEW_CHARS: usize = 500;

/// The analysis document handed to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    pub text: String,
    /// How many items made it in (≤ [`MAX_CORPUS_ITEMS`]).
    pub item_count: usize,
}

/// Render the first [`MAX_CORPUS_ITEMS`] items, in the order given.
pub fn build_corpus(items: &[NormalizedItem]) -> Corpus {
    let selected = &items[..items.len().min(MAX_CORPUS_ITEMS)];
    let blocks: Vec<String> = selected
        .iter()
        .enumerate()
        .map(|(i, item)| render_item(i + 1, item))
        .collect();

    Corpus {
        text: blocks.join("\n"),
        item_count: selected.len(),
    }
}

fn render_item(index: usize, item: &NormalizedItem) -> String {
    let title = non_empty_or(&item.title, "No title");
    let content = non_empty_or(&item.body, "No content");

    let mut block = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(block, "Post {index}:");
    let _ = writeln!(block, "Type: {}", item.kind);
    let _ = writeln!(block, "Subreddit: r/{}", item.community);
    let _ = writeln!(block, "Title: {title}");
    let _ = writeln!(block, "Content: {}", truncate_chars(content, CONTENT_PREVIEW_CHARS));
    let _ = writeln!(block, "Score: {}", item.score);
    let _ = writeln!(block, "Date: {}", item.created_at.format("%Y-%m-%d"));
    let _ = writeln!(block, "URL: {}", item.source_url);
    if let Some(parent) = item.parent_context.as_deref().filter(|p| !p.is_empty()) {
        // Idempotent on an already-truncated preview.
        let _ = writeln!(
            block,
            "Parent Context: {}",
            truncate_chars(parent, PARENT_CONTEXT_CHARS)
        );
    }
    block.push_str("---\n");
    block
}

fn non_empty_or<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}
