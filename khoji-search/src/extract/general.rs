//! Site-independent extraction of readable text.
//!
//! Strips noise subtrees, picks the main content container and keeps the
//! headings and paragraphs that look like real content.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Elements removed, with their content, before extraction.
const NOISE_TAGS: &[&str] = &["script", "style", "nav", "footer", "iframe", "aside"];

/// Text blocks containing any of these (lowercased) are dropped.
const BOILERPLATE_PHRASES: &[&str] = &["cookie", "privacy policy", "terms of use"];

/// Blocks must be longer than this many characters to be kept.
const MIN_BLOCK_CHARS: usize = 20;

/// Elements whose text is collected from the container.
const TEXT_ELEMENTS: &str = "p, h1, h2, h3, h4, h5, h6";

fn product_class_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)product-detail|pdp-content|item-detail").ok())
        .as_ref()
}

fn content_class_pattern() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)content|main|article").ok())
        .as_ref()
}

/// Extract the newline-joined readable text of an HTML page.
///
/// Returns an empty string when nothing qualifies.
pub fn extract_general_content(html: &str) -> String {
    let cleaned = strip_noise_tags(html);
    let document = Html::parse_document(&cleaned);
    let container = select_container(&document);

    let Ok(selector) = Selector::parse(TEXT_ELEMENTS) else {
        return String::new();
    };

    container
        .select(&selector)
        .map(|el| el.text().collect::<String>().trim().to_owned())
        .filter(|text| is_content_block(text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_content_block(text: &str) -> bool {
    if text.chars().count() <= MIN_BLOCK_CHARS {
        return false;
    }
    let lower = text.to_lowercase();
    !BOILERPLATE_PHRASES.iter().any(|p| lower.contains(p))
}

/// Pick the content container: `<main>`, then `<article>`, then the first
/// product-detail `<div>`, then the first content-like `<div>`, else the
/// whole document.
fn select_container(document: &Html) -> ElementRef<'_> {
    for tag in ["main", "article"] {
        if let Some(el) = first_match(document, tag) {
            return el;
        }
    }

    for pattern in [product_class_pattern(), content_class_pattern()] {
        let Some(pattern) = pattern else {
            continue;
        };
        if let Some(el) = first_div_with_class(document, pattern) {
            return el;
        }
    }

    document.root_element()
}

fn first_match<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    document.select(&selector).next()
}

fn first_div_with_class<'a>(document: &'a Html, pattern: &Regex) -> Option<ElementRef<'a>> {
    let selector = Selector::parse("div[class]").ok()?;
    document.select(&selector).find(|el| {
        el.value()
            .attr("class")
            .is_some_and(|class| pattern.is_match(class))
    })
}

/// Remove noise elements and their content before parsing.
fn strip_noise_tags(html: &str) -> String {
    let mut result = html.to_owned();
    for tag in NOISE_TAGS {
        result = strip_tag(&result, tag);
    }
    result
}

/// Remove all instances of a specific HTML tag and its content.
fn strip_tag(html: &str, tag: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let lower = html.to_ascii_lowercase();
    let open_tag = format!("<{tag}");
    let close_tag = format!("</{tag}>");

    let mut pos = 0;
    loop {
        let start = match lower[pos..].find(&open_tag) {
            Some(offset) => pos + offset,
            None => {
                result.push_str(&html[pos..]);
                break;
            }
        };

        // Only whole tag names: `<nav>` must not match `<navigate>`.
        let after_tag = start + open_tag.len();
        if after_tag < lower.len() {
            let next_byte = lower.as_bytes()[after_tag];
            if !matches!(next_byte, b' ' | b'>' | b'/' | b'\n' | b'\r' | b'\t') {
                result.push_str(&html[pos..after_tag]);
                pos = after_tag;
                continue;
            }
        }

        result.push_str(&html[pos..start]);

        let end = match lower[start..].find(&close_tag) {
            Some(offset) => start + offset + close_tag.len(),
            None => match lower[start..].find('>') {
                Some(offset) => start + offset + 1,
                None => html.len(),
            },
        };

        pos = end;
    }

    result
}
