//! Keyword-ranked search over a static catalog of documentation pages
//!
//! This is not a live search. Queries are scored against a fixed table of
//! known pages, so results are fully deterministic and a query matching no
//! catalog keyword returns nothing even if the live site has relevant pages.

use crate::types::SearchResult;

/// Weight of title matches in the combined score
const TITLE_WEIGHT: f64 = 0.3;

/// Weight of keyword matches in the combined score
const KEYWORD_WEIGHT: f64 = 0.7;

/// Credit for a partial (substring) keyword match
const PARTIAL_MATCH_CREDIT: f64 = 0.5;

/// Minimum combined score for a page to appear in results
const SCORE_THRESHOLD: f64 = 0.1;

/// One searchable catalog page
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub url: &'static str,
    pub title: &'static str,
    pub priority: f64,
    pub keywords: &'static [&'static str],
}

/// The known documentation and API reference pages
///
/// Effectively a configuration table; [`SearchIndex`] accepts any catalog
/// so this default can be swapped without touching the scoring code.
pub fn default_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            url: "https://docs.phaser.io/getting-started",
            title: "Getting Started with Phaser",
            priority: 1.0,
            keywords: &["getting", "started", "tutorial", "begin", "first", "game"],
        },
        CatalogEntry {
            url: "https://docs.phaser.io/sprites-and-images",
            title: "Working with Sprites and Images",
            priority: 0.9,
            keywords: &["sprite", "image", "texture", "display", "gameobject"],
        },
        CatalogEntry {
            url: "https://docs.phaser.io/scenes",
            title: "Understanding Scenes",
            priority: 0.9,
            keywords: &["scene", "state", "manager", "lifecycle"],
        },
        CatalogEntry {
            url: "https://docs.phaser.io/physics",
            title: "Physics Systems",
            priority: 0.8,
            keywords: &["physics", "arcade", "matter", "collision", "body"],
        },
        CatalogEntry {
            url: "https://docs.phaser.io/input-handling",
            title: "Input Handling",
            priority: 0.8,
            keywords: &["input", "keyboard", "mouse", "touch", "pointer"],
        },
        CatalogEntry {
            url: "https://docs.phaser.io/animations",
            title: "Animations and Tweens",
            priority: 0.8,
            keywords: &["animation", "tween", "timeline", "motion"],
        },
        CatalogEntry {
            url: "https://docs.phaser.io/audio",
            title: "Audio and Sound",
            priority: 0.7,
            keywords: &["audio", "sound", "music", "sfx", "webaudio"],
        },
        CatalogEntry {
            url: "https://docs.phaser.io/cameras",
            title: "Camera System",
            priority: 0.7,
            keywords: &["camera", "viewport", "zoom", "follow"],
        },
        CatalogEntry {
            url: "https://docs.phaser.io/tilemaps",
            title: "Tilemap Support",
            priority: 0.7,
            keywords: &["tilemap", "tile", "map", "tiled", "level"],
        },
        CatalogEntry {
            url: "https://docs.phaser.io/plugins",
            title: "Plugin System",
            priority: 0.6,
            keywords: &["plugin", "extend", "custom", "addon"],
        },
        CatalogEntry {
            url: "https://docs.phaser.io/api/scene",
            title: "Phaser.Scene API",
            priority: 0.9,
            keywords: &["scene", "api", "class", "method", "lifecycle"],
        },
        CatalogEntry {
            url: "https://docs.phaser.io/api/sprite",
            title: "Phaser.GameObjects.Sprite API",
            priority: 0.9,
            keywords: &["sprite", "gameobject", "api", "texture", "display"],
        },
        CatalogEntry {
            url: "https://docs.phaser.io/api/physics-arcade",
            title: "Phaser.Physics.Arcade API",
            priority: 0.8,
            keywords: &["physics", "arcade", "api", "body", "collision"],
        },
        CatalogEntry {
            url: "https://docs.phaser.io/api/input",
            title: "Phaser.Input API",
            priority: 0.8,
            keywords: &["input", "api", "keyboard", "mouse", "pointer"],
        },
        CatalogEntry {
            url: "https://docs.phaser.io/api/cameras",
            title: "Phaser.Cameras API",
            priority: 0.7,
            keywords: &["camera", "api", "viewport", "zoom"],
        },
    ]
}

/// Deterministic scorer over a catalog of pages
#[derive(Debug, Clone)]
pub struct SearchIndex {
    entries: Vec<CatalogEntry>,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new(default_catalog())
    }
}

impl SearchIndex {
    /// Build an index over the given catalog
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Score the catalog against a sanitized query, returning the top `limit`
    /// results ranked 1..k by descending relevance
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let terms: Vec<String> = query.to_lowercase().split_whitespace().map(String::from).collect();
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(f64, &CatalogEntry)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let title_score = title_relevance(entry.title, &terms);
                let keyword_score = keyword_relevance(entry.keywords, &terms);
                let score =
                    (title_score * TITLE_WEIGHT + keyword_score * KEYWORD_WEIGHT) * entry.priority;
                (score > SCORE_THRESHOLD).then_some((score, entry))
            })
            .collect();

        // Stable sort keeps catalog order for equal scores
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, (score, entry))| SearchResult {
                rank_order: i + 1,
                url: entry.url.to_string(),
                title: entry.title.to_string(),
                snippet: SearchResult::normalize_snippet(&generate_snippet(
                    entry.title,
                    entry.keywords,
                    &terms,
                )),
                relevance_score: Some((score * 1000.0).round() / 1000.0),
            })
            .collect()
    }
}

/// Fraction of query terms appearing in the title
fn title_relevance(title: &str, terms: &[String]) -> f64 {
    if title.is_empty() || terms.is_empty() {
        return 0.0;
    }
    let title_lower = title.to_lowercase();
    let matches = terms.iter().filter(|t| title_lower.contains(t.as_str())).count();
    matches as f64 / terms.len() as f64
}

/// Fraction of query terms matching keyword tags
///
/// Exact matches count 1.0; a substring match in either direction counts
/// [`PARTIAL_MATCH_CREDIT`]. Capped at 1.0.
fn keyword_relevance(keywords: &[&str], terms: &[String]) -> f64 {
    if keywords.is_empty() || terms.is_empty() {
        return 0.0;
    }
    let mut matches = 0.0;
    for term in terms {
        if keywords.iter().any(|k| k.eq_ignore_ascii_case(term)) {
            matches += 1.0;
        } else if keywords
            .iter()
            .any(|k| k.to_lowercase().contains(term.as_str()) || term.contains(&k.to_lowercase()))
        {
            matches += PARTIAL_MATCH_CREDIT;
        }
    }
    (matches / terms.len() as f64).min(1.0)
}

/// Build a human-readable snippet from the keywords the query matched
fn generate_snippet(title: &str, keywords: &[&str], terms: &[String]) -> String {
    if title.is_empty() {
        return String::new();
    }

    let mut matching: Vec<&str> = Vec::new();
    for term in terms {
        for keyword in keywords {
            let keyword_lower = keyword.to_lowercase();
            if (keyword_lower.contains(term.as_str()) || term.contains(&keyword_lower))
                && !matching.contains(keyword)
            {
                matching.push(keyword);
            }
        }
    }

    if matching.is_empty() {
        return format!("Documentation page about {}.", title.to_lowercase());
    }

    let mut snippet = format!(
        "This page covers {}.",
        matching.iter().take(3).copied().collect::<Vec<_>>().join(", ")
    );
    if matching.len() > 3 {
        let more = matching
            .iter()
            .skip(3)
            .take(2)
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        snippet.push_str(&format!(" Also includes information about {more}."));
    }
    snippet
}
