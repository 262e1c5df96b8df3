//! HTML structure extraction for Phaser documentation pages
//!
//! Finds the main content area, strips navigation chrome, absolutizes
//! links, and pulls out code blocks and API class information. The DOM here
//! is read-only, so cleaning happens during re-serialization: the chosen
//! content subtree is walked and written back out as HTML with unwanted
//! elements skipped and relative URLs rewritten. Markdown conversion of the
//! cleaned HTML lives in [`crate::convert`].

use crate::error::DocsError;
use crate::types::{clean_title, ApiReference, DEFAULT_TITLE};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{debug, warn};
use url::Url;

/// Maximum HTML input size (1 MiB)
const MAX_CONTENT_LENGTH: usize = 1024 * 1024;

/// Candidate selectors for the main content area, in priority order
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    ".content",
    ".documentation-content",
    ".api-content",
    ".tutorial-content",
    "article",
    ".main-content",
    ".phaser-content",
    ".docs-content",
    ".guide-content",
];

/// Selectors for navigation chrome and non-content elements
const REMOVE_SELECTORS: &[&str] = &[
    "nav",
    ".navigation",
    ".sidebar",
    ".breadcrumb",
    ".footer",
    ".header",
    ".advertisement",
    ".social-links",
    ".page-navigation",
    ".toc-container",
    "script",
    "style",
    "noscript",
];

/// Selectors for code samples
const CODE_SELECTORS: &[&str] = &[
    "pre",
    "code",
    ".code-block",
    ".highlight",
    ".language-javascript",
    ".language-js",
    ".language-typescript",
    ".language-ts",
    ".phaser-code",
    ".example-code",
    ".snippet",
    ".code-sample",
];

const TITLE_SELECTORS: &[&str] = &["h1", ".page-title", ".api-title", ".class-name", "title"];

const DESCRIPTION_SELECTORS: &[&str] = &[
    ".class-description",
    ".api-description",
    ".description",
    "p:first-of-type",
    ".summary",
];
const METHOD_SELECTORS: &[&str] = &[
    ".method-list .method-name",
    ".methods .method",
    ".method h3",
    ".method",
    "[data-method]",
];
const PROPERTY_SELECTORS: &[&str] = &[
    ".property-list .property-name",
    ".properties .property",
    "[data-property]",
];
const EXAMPLE_SELECTORS: &[&str] = &[
    "pre code",
    ".example code",
    ".code-example",
    "code.language-javascript",
];
const INHERITANCE_SELECTORS: &[&str] = &[".inheritance", ".extends", ".parent-class"];

/// Void elements that take no closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

fn compile(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
}

static CONTENT: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(CONTENT_SELECTORS));
static REMOVE: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(REMOVE_SELECTORS));
static CODE: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(CODE_SELECTORS));
static TITLE: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(TITLE_SELECTORS));
static DESCRIPTION: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(DESCRIPTION_SELECTORS));
static METHOD: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(METHOD_SELECTORS));
static PROPERTY: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(PROPERTY_SELECTORS));
static EXAMPLE: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(EXAMPLE_SELECTORS));
static INHERITANCE: LazyLock<Vec<Selector>> = LazyLock::new(|| compile(INHERITANCE_SELECTORS));
static BODY: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("body").ok());
static SECTION_HEADING: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("h2, h3").ok());
static SECTION_ITEMS: LazyLock<Option<Selector>> =
    LazyLock::new(|| Selector::parse("li, div, h3, h4").ok());
static LIST_ITEMS: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("li").ok());

static PAREN_ARGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid regex"));
static EXTENDS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"extends\s+([A-Za-z0-9_.]+)").expect("valid regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));
static METHODS_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)methods?").expect("valid regex"));
static PROPERTIES_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)properties").expect("valid regex"));

/// A code sample extracted from a documentation page
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    /// Trimmed text content of the block
    pub content: String,
    /// Detected language tag (defaults to `javascript`)
    pub language: String,
    /// Nearby headings or lead-in text, oldest first, joined with ` | `
    pub context: String,
}

/// Result of structural extraction, ready for Markdown conversion
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Page title with site suffixes stripped
    pub title: String,
    /// Cleaned HTML of the main content area
    pub html: String,
    /// Visible text of the main content, whitespace-normalized
    pub text: String,
    /// Code blocks found within the main content
    pub code_blocks: Vec<CodeBlock>,
}

/// Structural parser for documentation HTML
#[derive(Debug, Clone)]
pub struct DocumentParser {
    base_url: Url,
}

impl DocumentParser {
    /// Create a parser that resolves relative links against `base_url`
    pub fn new(base_url: &str) -> Result<Self, DocsError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| DocsError::HtmlParse(format!("Invalid base URL: {e}")))?;
        Ok(Self { base_url })
    }

    /// Parse raw HTML into a cleaned, structured document
    ///
    /// `page_url` overrides the base URL for link resolution when the page
    /// was fetched from somewhere more specific.
    pub fn parse(&self, html: &str, page_url: &str) -> Result<ParsedDocument, DocsError> {
        validate_input(html)?;

        let document = Html::parse_document(html);
        let resolve_base = if page_url.is_empty() {
            self.base_url.clone()
        } else {
            Url::parse(page_url).unwrap_or_else(|_| self.base_url.clone())
        };

        let content = find_main_content(&document);

        let title = extract_title(&document);
        let code_blocks = extract_code_blocks(content);
        let text = visible_text(content);
        let cleaned = serialize_cleaned(content, &resolve_base);

        debug!(
            title = %title,
            code_blocks = code_blocks.len(),
            html_chars = cleaned.len(),
            "Parsed document structure"
        );

        Ok(ParsedDocument {
            title,
            html: cleaned,
            text,
            code_blocks,
        })
    }
}

fn validate_input(html: &str) -> Result<(), DocsError> {
    if html.is_empty() {
        return Err(DocsError::HtmlParse("HTML content cannot be empty".to_string()));
    }
    if html.len() > MAX_CONTENT_LENGTH {
        return Err(DocsError::HtmlParse(format!(
            "HTML content too large: {} bytes (max: {MAX_CONTENT_LENGTH})",
            html.len()
        )));
    }
    Ok(())
}

/// Pick the main content area by selector priority, falling back to `body`
/// and finally the document root
fn find_main_content(document: &Html) -> ElementRef<'_> {
    for selector in CONTENT.iter() {
        if let Some(element) = document.select(selector).next() {
            if !visible_text(element).trim().is_empty() {
                return element;
            }
        }
    }

    if let Some(body) = BODY.as_ref().and_then(|s| document.select(s).next()) {
        debug!("Using body as main content");
        return body;
    }

    warn!("No main content area found, using entire document");
    document.root_element()
}

/// Text content of an element, skipping removal-selector subtrees
fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(trimmed);
                }
            }
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    if !is_removed(child_ref) {
                        collect_text(child_ref, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_removed(element: ElementRef<'_>) -> bool {
    REMOVE.iter().any(|s| s.matches(&element))
}

/// Extract the page title, preferring headings over the `<title>` tag
fn extract_title(document: &Html) -> String {
    for selector in TITLE.iter() {
        if let Some(element) = document.select(selector).next() {
            let text: String = element.text().collect::<Vec<_>>().join(" ");
            let cleaned = clean_title(&text);
            if !cleaned.is_empty() && cleaned != DEFAULT_TITLE {
                return cleaned;
            }
            if !text.trim().is_empty() {
                return cleaned;
            }
        }
    }
    DEFAULT_TITLE.to_string()
}

/// Re-serialize a content subtree as HTML, dropping removal-selector
/// matches and rewriting relative `href`/`src` attributes
fn serialize_cleaned(element: ElementRef<'_>, base: &Url) -> String {
    let mut out = String::new();
    write_element(element, base, &mut out);
    out
}

fn write_element(element: ElementRef<'_>, base: &Url, out: &mut String) {
    let name = element.value().name();
    out.push('<');
    out.push_str(name);

    for (attr, value) in element.value().attrs() {
        let value = rewrite_url_attr(name, attr, value, base);
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&escape_attr(&value));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    write_children(element, base, out);

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn write_children(element: ElementRef<'_>, base: &Url, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    if !is_removed(child_ref) {
                        write_element(child_ref, base, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Absolutize relative link and image URLs; everything else passes through
fn rewrite_url_attr(tag: &str, attr: &str, value: &str, base: &Url) -> String {
    let is_link = tag == "a" && attr == "href";
    let is_image = tag == "img" && attr == "src";
    if !is_link && !is_image {
        return value.to_string();
    }

    let skip = value.starts_with("http://")
        || value.starts_with("https://")
        || (is_link && (value.starts_with("mailto:") || value.starts_with('#')))
        || (is_image && value.starts_with("data:"));
    if skip {
        return value.to_string();
    }

    match base.join(value) {
        Ok(absolute) => absolute.to_string(),
        Err(_) => value.to_string(),
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Collect code blocks under `root` with language and context metadata
fn extract_code_blocks(root: ElementRef<'_>) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for selector in CODE.iter() {
        for element in root.select(selector) {
            if is_removed(element) {
                continue;
            }
            let content = element.text().collect::<String>().trim().to_string();
            if content.is_empty() || !seen.insert(content.clone()) {
                continue;
            }
            blocks.push(CodeBlock {
                language: detect_language(element),
                context: code_context(element),
                content,
            });
        }
    }

    debug!(count = blocks.len(), "Extracted code blocks");
    blocks
}

/// Detect a language tag from element class names, defaulting to JavaScript
fn detect_language(element: ElementRef<'_>) -> String {
    for class in element.value().classes() {
        let lower = class.to_lowercase();
        if lower.contains("javascript") || lower.contains("js") {
            return "javascript".to_string();
        }
        if lower.contains("typescript") || lower.contains("ts") {
            return "typescript".to_string();
        }
        if lower.contains("html") {
            return "html".to_string();
        }
        if lower.contains("css") {
            return "css".to_string();
        }
        if lower.contains("json") {
            return "json".to_string();
        }
    }
    "javascript".to_string()
}

/// Gather up to three preceding siblings of the block's parent as context,
/// stopping at the nearest heading
fn code_context(element: ElementRef<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();

    let Some(parent) = element.parent() else {
        return String::new();
    };

    for sibling in parent.prev_siblings() {
        if parts.len() >= 3 {
            break;
        }
        let Some(sib) = ElementRef::wrap(sibling) else {
            continue;
        };
        let name = sib.value().name();
        let text: String = sib.text().collect::<Vec<_>>().join(" ").trim().to_string();
        if matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6") {
            if !text.is_empty() {
                parts.push(text);
            }
            break;
        }
        if matches!(name, "p" | "div") && !text.is_empty() && text.len() < 200 {
            parts.push(text);
        }
    }

    parts.reverse();
    parts.join(" | ")
}

/// Extract an [`ApiReference`] from an API documentation page
///
/// `class_name` is the requested name, not whatever heading the page
/// carries; `url` is recorded as the reference source. Member lists come
/// back sorted with private (`_`-prefixed) entries dropped.
pub fn extract_api_reference(html: &str, class_name: &str, url: &str) -> ApiReference {
    let document = Html::parse_document(html);

    // A selector only counts if its text is substantial; short hits fall
    // through to the next candidate
    let mut description = String::new();
    for selector in DESCRIPTION.iter() {
        if let Some(element) = document.select(selector).next() {
            let text = element_text(element);
            if text.len() > 10 {
                description = text;
                break;
            }
        }
    }
    if description.is_empty() {
        description = format!("API reference for {class_name}");
    }

    let mut methods: BTreeSet<String> = BTreeSet::new();
    for selector in METHOD.iter() {
        for element in document.select(selector) {
            if let Some(name) = clean_member_name(&element_text(element)) {
                methods.insert(name);
            }
        }
    }
    // Pages that mark nothing up still usually have a "Methods" heading
    for item in heading_section_texts(&document, &METHODS_HEADING) {
        if let Some(name) = clean_member_name(&item) {
            if name.len() < 50 {
                methods.insert(name);
            }
        }
    }

    let mut properties: BTreeSet<String> = BTreeSet::new();
    for selector in PROPERTY.iter() {
        for element in document.select(selector) {
            if let Some(name) = clean_property_name(&element_text(element)) {
                properties.insert(name);
            }
        }
    }
    for item in heading_list_texts(&document, &PROPERTIES_HEADING) {
        if let Some(name) = clean_property_name(&item) {
            properties.insert(name);
        }
    }

    let mut examples: Vec<String> = Vec::new();
    for selector in EXAMPLE.iter() {
        for element in document.select(selector) {
            let code = element.text().collect::<String>().trim().to_string();
            if code.len() > 10 {
                let cleaned = BLANK_LINES.replace_all(&code, "\n").into_owned();
                if !examples.contains(&cleaned) {
                    examples.push(cleaned);
                }
            }
        }
    }
    examples.truncate(5);

    let parent_class = INHERITANCE.iter().find_map(|selector| {
        document.select(selector).find_map(|element| {
            let text = element_text(element);
            EXTENDS_PATTERN
                .captures(&text)
                .map(|caps| caps[1].to_string())
        })
    });

    let namespace = detect_namespace(&document, class_name);

    debug!(
        class = %class_name,
        methods = methods.len(),
        properties = properties.len(),
        examples = examples.len(),
        "Extracted API information"
    );

    ApiReference {
        class_name: class_name.to_string(),
        url: url.to_string(),
        description,
        methods: methods.into_iter().collect(),
        properties: properties.into_iter().collect(),
        examples,
        parent_class,
        namespace,
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip a parameter list and reject private names
fn clean_member_name(text: &str) -> Option<String> {
    let name = PAREN_ARGS.replace_all(text, "").trim().to_string();
    (!name.is_empty() && !name.starts_with('_')).then_some(name)
}

/// Take the name part before any `:` type or `=` default, reject private
fn clean_property_name(text: &str) -> Option<String> {
    let name = text
        .split(':')
        .next()
        .and_then(|s| s.split('=').next())
        .unwrap_or("")
        .trim()
        .to_string();
    (!name.is_empty() && !name.starts_with('_')).then_some(name)
}

/// Item texts from the sections following `h2`/`h3` headings matching `heading`
///
/// A section runs until the next `h2`/`h3`; `ul`, `ol`, and `div` siblings
/// contribute their `li`/`div`/`h3`/`h4` descendants.
fn heading_section_texts(document: &Html, heading: &Regex) -> Vec<String> {
    let mut out = Vec::new();
    let (Some(headings), Some(items)) = (SECTION_HEADING.as_ref(), SECTION_ITEMS.as_ref()) else {
        return out;
    };

    for section in document.select(headings) {
        if !heading.is_match(&element_text(section)) {
            continue;
        }
        for sibling in section.next_siblings() {
            let Some(el) = ElementRef::wrap(sibling) else {
                continue;
            };
            let name = el.value().name();
            if matches!(name, "h2" | "h3") {
                break;
            }
            if matches!(name, "ul" | "ol" | "div") {
                for item in el.select(items) {
                    let text = element_text(item);
                    if !text.is_empty() {
                        out.push(text);
                    }
                }
            }
        }
    }
    out
}

/// `li` texts of the first list element directly after a matching heading
fn heading_list_texts(document: &Html, heading: &Regex) -> Vec<String> {
    let mut out = Vec::new();
    let (Some(headings), Some(items)) = (SECTION_HEADING.as_ref(), LIST_ITEMS.as_ref()) else {
        return out;
    };

    for section in document.select(headings) {
        if !heading.is_match(&element_text(section)) {
            continue;
        }
        let next = section
            .next_siblings()
            .find_map(ElementRef::wrap);
        if let Some(el) = next {
            if matches!(el.value().name(), "ul" | "ol") {
                for item in el.select(items) {
                    let text = element_text(item);
                    if !text.is_empty() {
                        out.push(text);
                    }
                }
            }
        }
    }
    out
}

/// Namespace from a dotted class name, else sniffed from the page text
fn detect_namespace(document: &Html, class_name: &str) -> Option<String> {
    if let Some((namespace, _)) = class_name.rsplit_once('.') {
        return Some(namespace.to_string());
    }

    let page_text: String = document.root_element().text().collect();
    for prefix in ["Phaser.GameObjects", "Phaser.Scene", "Phaser"] {
        if page_text.contains(&format!("{prefix}.{class_name}")) {
            return Some(prefix.to_string());
        }
    }
    None
}
