//! HTML extraction for the listing page and individual breed pages.
//!
//! Both halves are driven by ordered lists of strategies. The first
//! strategy that produces a usable result wins; later ones are fallbacks
//! for pages whose markup does not match the primary heuristic.
//!
//! # Listing page
//!
//! | Order | Strategy | Picks |
//! |-------|----------|-------|
//! | 1 | [`PathPatterns`] | `<a href>` whose path contains a breed marker such as `/breed/` |
//! | 2 | [`BreedCards`] | first link inside any `div` whose class mentions `breed` |
//!
//! # Breed page
//!
//! Title: first non-empty `<h1>`, then `<h2>`, then `<title>`.
//!
//! | Order | Strategy | Picks |
//! |-------|----------|-------|
//! | 1 | [`MainContainer`] | text blocks inside `<main>`, `<article>`, or a content `div` |
//! | 2 | [`Paragraphs`] | every `<p>` on the page |
//! | 3 | [`BroadText`] | every `<p>`, `<li>`, `<dd>`, `<blockquote>` |
//!
//! Text inside `script`, `style`, `nav`, `footer`, `header` and `noscript`
//! is never collected.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::models::{content_chars, SkipReason, MIN_CONTENT_CHARS};

/// Elements whose text is never part of a title or body.
const IGNORED_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "noscript"];

/// Elements that sit inside a run of text without breaking it.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "cite", "code", "em", "i", "mark", "q", "s", "small", "span", "strong",
    "sub", "sup", "time", "u",
];

/// Selectors tried in order for the page title.
const TITLE_SELECTORS: &[&str] = &["h1", "h2", "title"];

/// At most this many candidate blocks are considered per strategy.
const MAX_BLOCKS: usize = 15;

/// Blocks at or below this many characters are treated as boilerplate.
const MIN_BLOCK_CHARS: usize = 30;

// ============ Shared helpers ============

/// Collapsed visible text of an element, skipping [`IGNORED_TAGS`] subtrees.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                if IGNORED_TAGS.contains(&el.name()) {
                    continue;
                }
                // Block boundaries separate words; inline ones do not.
                let block = !INLINE_TAGS.contains(&el.name());
                if let Some(child_el) = ElementRef::wrap(child) {
                    if block {
                        out.push(' ');
                    }
                    collect_text(child_el, out);
                    if block {
                        out.push(' ');
                    }
                }
            }
            _ => {}
        }
    }
}

fn inside_ignored(element: &ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .map(|el| IGNORED_TAGS.contains(&el.name()))
            .unwrap_or(false)
    })
}

fn class_contains(element: &ElementRef<'_>, needles: &[&str]) -> bool {
    match element.value().attr("class") {
        Some(class) => {
            let class = class.to_lowercase();
            needles.iter().any(|n| class.contains(n))
        }
        None => false,
    }
}

/// Visible text of every match of `css` under `root`, in document order.
fn texts_under(root: ElementRef<'_>, css: &str) -> Vec<String> {
    let Ok(sel) = Selector::parse(css) else {
        return Vec::new();
    };
    root.select(&sel)
        .filter(|el| !inside_ignored(el))
        .map(visible_text)
        .collect()
}

// ============ Listing page ============

/// A heuristic that pulls raw breed-page hrefs out of a listing page.
pub trait LinkStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw `href` values in document order; resolution and de-duplication
    /// happen in [`LinkExtractor`].
    fn hrefs(&self, document: &Html) -> Vec<String>;
}

/// Links whose target path contains one of a fixed set of markers.
pub struct PathPatterns {
    patterns: Vec<String>,
}

impl PathPatterns {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }
}

impl LinkStrategy for PathPatterns {
    fn name(&self) -> &'static str {
        "path-patterns"
    }

    fn hrefs(&self, document: &Html) -> Vec<String> {
        let Ok(sel) = Selector::parse("a[href]") else {
            return Vec::new();
        };
        document
            .select(&sel)
            .filter_map(|a| {
                let href = a.value().attr("href")?;
                let lower = href.to_lowercase();
                if !self.patterns.iter().any(|p| lower.contains(p.as_str())) {
                    return None;
                }
                if visible_text(a).is_empty() {
                    return None;
                }
                Some(href.to_string())
            })
            .collect()
    }
}

/// Cards whose class mentions `breed`; the first link in each card.
pub struct BreedCards;

impl LinkStrategy for BreedCards {
    fn name(&self) -> &'static str {
        "breed-cards"
    }

    fn hrefs(&self, document: &Html) -> Vec<String> {
        let (Ok(card_sel), Ok(link_sel)) = (Selector::parse("div[class]"), Selector::parse("a[href]"))
        else {
            return Vec::new();
        };
        document
            .select(&card_sel)
            .filter(|card| class_contains(card, &["breed"]))
            .filter_map(|card| {
                let link = card.select(&link_sel).next()?;
                let href = link.value().attr("href")?;
                if href.trim().is_empty() || visible_text(link).is_empty() {
                    return None;
                }
                Some(href.to_string())
            })
            .collect()
    }
}

/// Runs link strategies in order and normalizes the winner's output.
pub struct LinkExtractor {
    strategies: Vec<Box<dyn LinkStrategy>>,
}

impl LinkExtractor {
    pub fn new(strategies: Vec<Box<dyn LinkStrategy>>) -> Self {
        Self { strategies }
    }

    /// Path markers first, breed cards as the fallback.
    pub fn with_patterns(patterns: &[String]) -> Self {
        Self::new(vec![Box::new(PathPatterns::new(patterns)), Box::new(BreedCards)])
    }

    /// Absolute, de-duplicated breed-page URLs in first-seen order.
    pub fn extract(&self, html: &str, base: &Url) -> Vec<String> {
        let document = Html::parse_document(html);
        for strategy in &self.strategies {
            let links = resolve_unique(strategy.hrefs(&document), base);
            if !links.is_empty() {
                tracing::debug!(
                    strategy = strategy.name(),
                    count = links.len(),
                    "breed links found"
                );
                return links;
            }
            tracing::info!(
                strategy = strategy.name(),
                "no breed links found, trying next strategy"
            );
        }
        Vec::new()
    }
}

/// Resolve hrefs against `base`, drop fragments and non-HTTP schemes,
/// and keep the first occurrence of each URL.
pub fn resolve_unique(hrefs: Vec<String>, base: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for href in hrefs {
        let Ok(mut url) = base.join(href.trim()) else {
            continue;
        };
        if url.scheme() != "http" && url.scheme() != "https" {
            continue;
        }
        url.set_fragment(None);
        let url = url.to_string();
        if seen.insert(url.clone()) {
            out.push(url);
        }
    }
    out
}

// ============ Breed page ============

/// A heuristic that pulls candidate body blocks out of a breed page.
pub trait BodyStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Candidate text blocks in document order, before length filtering.
    fn blocks(&self, document: &Html) -> Vec<String>;
}

/// The page's designated content container.
pub struct MainContainer;

impl MainContainer {
    fn container<'a>(document: &'a Html) -> Option<ElementRef<'a>> {
        for css in ["main", "article"] {
            if let Ok(sel) = Selector::parse(css) {
                if let Some(el) = document.select(&sel).next() {
                    return Some(el);
                }
            }
        }
        let sel = Selector::parse("div[class]").ok()?;
        document
            .select(&sel)
            .find(|div| class_contains(div, &["content", "main", "breed"]))
    }
}

impl BodyStrategy for MainContainer {
    fn name(&self) -> &'static str {
        "main-container"
    }

    fn blocks(&self, document: &Html) -> Vec<String> {
        let Some(container) = Self::container(document) else {
            return Vec::new();
        };
        let Ok(tagged_sel) = Selector::parse("p[class], div[class]") else {
            return Vec::new();
        };
        let tagged: Vec<String> = container
            .select(&tagged_sel)
            .filter(|el| class_contains(el, &["text"]) && !inside_ignored(el))
            .map(visible_text)
            .collect();
        if !tagged.is_empty() {
            return tagged;
        }
        texts_under(container, "p")
    }
}

/// Every paragraph on the page.
pub struct Paragraphs;

impl BodyStrategy for Paragraphs {
    fn name(&self) -> &'static str {
        "paragraphs"
    }

    fn blocks(&self, document: &Html) -> Vec<String> {
        texts_under(document.root_element(), "p")
    }
}

/// Paragraphs plus list items, definitions, and quotes.
pub struct BroadText;

impl BodyStrategy for BroadText {
    fn name(&self) -> &'static str {
        "broad-text"
    }

    fn blocks(&self, document: &Html) -> Vec<String> {
        texts_under(document.root_element(), "p, li, dd, blockquote")
    }
}

/// Keep the first [`MAX_BLOCKS`] blocks, drop short ones, join with blank lines.
pub fn assemble_body(blocks: Vec<String>) -> String {
    blocks
        .into_iter()
        .take(MAX_BLOCKS)
        .filter(|b| b.chars().count() > MIN_BLOCK_CHARS)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Title and body pulled from one breed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: String,
    pub content: String,
    /// Name of the body strategy that produced `content`.
    pub strategy: &'static str,
}

/// Runs title selectors and body strategies in order.
pub struct PageExtractor {
    strategies: Vec<Box<dyn BodyStrategy>>,
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::new(vec![
            Box::new(MainContainer),
            Box::new(Paragraphs),
            Box::new(BroadText),
        ])
    }
}

impl PageExtractor {
    pub fn new(strategies: Vec<Box<dyn BodyStrategy>>) -> Self {
        Self { strategies }
    }

    /// Extract a title and a body long enough to persist.
    ///
    /// Returns [`SkipReason::NoTitle`] or
    /// [`SkipReason::InsufficientContent`] when the page is unusable.
    pub fn extract(&self, html: &str) -> Result<ExtractedPage, SkipReason> {
        let document = Html::parse_document(html);

        let title = extract_title(&document).ok_or(SkipReason::NoTitle)?;

        let mut best_chars = 0;
        for strategy in &self.strategies {
            let content = assemble_body(strategy.blocks(&document));
            let chars = content_chars(&content);
            if chars > MIN_CONTENT_CHARS {
                return Ok(ExtractedPage {
                    title,
                    content,
                    strategy: strategy.name(),
                });
            }
            best_chars = best_chars.max(chars);
        }

        Err(SkipReason::InsufficientContent { chars: best_chars })
    }
}

/// First non-empty heading, falling back through [`TITLE_SELECTORS`].
pub fn extract_title(document: &Html) -> Option<String> {
    TITLE_SELECTORS.iter().find_map(|css| {
        let sel = Selector::parse(css).ok()?;
        document
            .select(&sel)
            .map(visible_text)
            .find(|t| !t.is_empty())
    })
}
