//! Core value types for Phaser documentation access

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Title suffixes stripped from fetched page titles
const TITLE_SUFFIXES: &[&str] = &[
    " - Phaser",
    " | Phaser Documentation",
    " :: Phaser Documentation",
    " - Phaser 3 Documentation",
    " | Phaser 3",
];

/// Fallback title when a page carries none
pub const DEFAULT_TITLE: &str = "Phaser Documentation";

/// A fetched documentation page
///
/// Immutable once constructed; each pipeline stage (fetch, parse, convert)
/// produces a new instance rather than mutating an existing one. The
/// `content` field holds HTML right after fetching and Markdown after
/// conversion, with `content_type` tracking which.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DocumentationPage {
    /// Full URL of the documentation page
    pub url: String,

    /// Page title with known suffixes stripped
    pub title: String,

    /// Page content (HTML or Markdown depending on pipeline stage)
    pub content: String,

    /// Last-Modified header value, when the server sent one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    /// MIME type of the content
    pub content_type: String,

    /// Number of whitespace-separated words in the content
    pub word_count: usize,
}

impl DocumentationPage {
    /// Create a page, cleaning the title and deriving the word count
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let word_count = content.split_whitespace().count();
        Self {
            url: url.into(),
            title: clean_title(&title.into()),
            content,
            last_modified: None,
            content_type: content_type.into(),
            word_count,
        }
    }
}

/// Strip known site suffixes from a title and collapse whitespace
pub fn clean_title(title: &str) -> String {
    let mut cleaned = title.trim().to_string();
    for suffix in TITLE_SUFFIXES {
        if let Some(stripped) = cleaned.strip_suffix(suffix) {
            cleaned = stripped.trim().to_string();
        }
    }
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        collapsed
    }
}

/// A single search result
///
/// Ephemeral: created per search call and discarded after the tool
/// response is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResult {
    /// 1-based ranking position, assigned in descending score order
    pub rank_order: usize,

    /// URL of the matching page
    pub url: String,

    /// Title of the matching page
    pub title: String,

    /// Whitespace-normalized content snippet, when one could be generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    /// Relevance score in [0.0, 1.0]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
}

impl SearchResult {
    /// Normalize a snippet by collapsing whitespace; empty snippets become None
    pub fn normalize_snippet(snippet: &str) -> Option<String> {
        let cleaned = snippet.split_whitespace().collect::<Vec<_>>().join(" ");
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
}

/// API reference information for a Phaser class
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ApiReference {
    /// Name of the class or namespace (alphanumeric plus `.` and `_`)
    pub class_name: String,

    /// URL of the API reference page
    pub url: String,

    /// Description of the class
    pub description: String,

    /// De-duplicated public method names
    pub methods: Vec<String>,

    /// De-duplicated public property names
    pub properties: Vec<String>,

    /// Code examples demonstrating usage
    pub examples: Vec<String>,

    /// Parent class name, when inheritance information was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_class: Option<String>,

    /// Namespace the class belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ApiReference {
    /// Create a reference, de-duplicating member lists
    pub fn new(
        class_name: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
        methods: Vec<String>,
        properties: Vec<String>,
        examples: Vec<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            url: url.into(),
            description: description.into(),
            methods: dedup_preserving_order(methods),
            properties: dedup_preserving_order(properties),
            examples: dedup_preserving_order(examples),
            parent_class: None,
            namespace: None,
        }
    }

    /// True if the class name contains only valid identifier characters
    pub fn is_valid_class_name(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '_')
    }
}

/// Remove duplicate entries while preserving first-seen order, dropping blanks
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        let trimmed = item.trim().to_string();
        if !trimmed.is_empty() && seen.insert(trimmed.clone()) {
            result.push(trimmed);
        }
    }
    result
}
