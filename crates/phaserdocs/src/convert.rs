//! HTML to Markdown conversion and cleanup
//!
//! Takes the cleaned HTML produced by [`crate::parser`] and renders it as
//! readable Markdown: ATX headings, dash bullets, fenced code blocks with
//! language tags, inline links. Post-processing normalizes whitespace and
//! repairs the rough edges the generic converter leaves behind.

use crate::error::DocsError;
use crate::parser::ParsedDocument;
use crate::types::ApiReference;
use htmd::options::{BulletListMarker, CodeBlockStyle, HeadingStyle, LinkStyle, Options};
use htmd::HtmlToMarkdown;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static EXCESS_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").expect("valid regex"));
static RUNS_OF_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static HEADING_NEEDS_BLANK_BEFORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(#{1,6} )").expect("valid regex"));
static HEADING_NEEDS_BLANK_AFTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(#{1,6}[^\n]*)\n([^\n#])").expect("valid regex"));
static LIST_NEEDS_BLANK_BEFORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(- [^\n])").expect("valid regex"));
static MULTILINE_INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]*\n[^`]*)`").expect("valid regex"));
static UNTAGGED_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```\n([^`]+)\n```").expect("valid regex"));
static EMPTY_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*\]\(\s*\)").expect("valid regex"));
static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]*)\)").expect("valid regex"));

/// Convert a parsed document to titled Markdown
pub fn to_markdown(parsed: &ParsedDocument) -> Result<String, DocsError> {
    let converter = HtmlToMarkdown::builder()
        .options(Options {
            heading_style: HeadingStyle::Atx,
            code_block_style: CodeBlockStyle::Fenced,
            bullet_list_marker: BulletListMarker::Dash,
            link_style: LinkStyle::Inlined,
            ..Default::default()
        })
        .build();

    let raw = converter
        .convert(&parsed.html)
        .map_err(|e| DocsError::MarkdownConversion(format!("Conversion failed: {e}")))?;

    if raw.trim().is_empty() {
        return Ok(String::new());
    }

    let mut markdown = clean_markdown(&raw);
    markdown = fix_code_fences(&markdown);
    markdown = clean_links(&markdown);

    let heading = format!("# {}", parsed.title);
    if !parsed.title.is_empty() && !markdown.starts_with(&heading) {
        markdown = format!("{heading}\n\n{markdown}");
    }

    debug!(chars = markdown.len(), "Converted document to Markdown");
    Ok(markdown)
}

/// Normalize whitespace and blank-line structure
fn clean_markdown(content: &str) -> String {
    let mut out = EXCESS_BLANK_LINES.replace_all(content, "\n\n").into_owned();
    out = RUNS_OF_SPACES.replace_all(&out, " ").into_owned();
    out = HEADING_NEEDS_BLANK_BEFORE
        .replace_all(&out, "\n\n$1")
        .into_owned();
    out = HEADING_NEEDS_BLANK_AFTER
        .replace_all(&out, "$1\n\n$2")
        .into_owned();
    out = LIST_NEEDS_BLANK_BEFORE
        .replace_all(&out, "\n\n$1")
        .into_owned();
    out = EXCESS_BLANK_LINES.replace_all(&out, "\n\n").into_owned();
    out.trim().to_string()
}

/// Promote multi-line inline code to fenced blocks and tag untagged fences
///
/// Existing fenced blocks are handled as opaque segments so the inline-code
/// promotion cannot match across their backticks.
fn fix_code_fences(content: &str) -> String {
    let mut out = String::new();
    let mut rest = content;

    loop {
        let Some(start) = rest.find("```") else {
            out.push_str(&promote_inline(rest));
            break;
        };
        out.push_str(&promote_inline(&rest[..start]));

        let after = &rest[start + 3..];
        let Some(end) = after.find("```") else {
            // Unpaired fence, leave it alone
            out.push_str(&rest[start..]);
            break;
        };
        let fence_end = start + 3 + end + 3;
        out.push_str(&tag_fence(&rest[start..fence_end]));
        rest = &rest[fence_end..];
    }

    out
}

/// Turn inline code spanning a newline into a tagged fenced block
fn promote_inline(text: &str) -> String {
    let fenced = MULTILINE_INLINE_CODE.replace_all(text, "```\n$1\n```");
    UNTAGGED_FENCE
        .replace_all(&fenced, |caps: &regex::Captures<'_>| {
            let code = &caps[1];
            format!("```{}\n{code}\n```", guess_fence_language(code))
        })
        .into_owned()
}

/// Add a language tag to a complete fence that lacks one
fn tag_fence(fence: &str) -> String {
    let inner = &fence[3..fence.len() - 3];
    match inner.strip_prefix('\n') {
        Some(body) => {
            let body = body.strip_suffix('\n').unwrap_or(body);
            format!("```{}\n{body}\n```", guess_fence_language(body))
        }
        None => fence.to_string(),
    }
}

fn guess_fence_language(code: &str) -> &'static str {
    let lower = code.to_lowercase();
    let js_keywords = ["function", "var ", "let ", "const ", "class "];
    if js_keywords.iter().any(|k| lower.contains(k)) {
        return "javascript";
    }
    if code.contains('<') && code.contains('>') {
        return "html";
    }
    "javascript"
}

/// Drop empty links and percent-encode spaces in link targets
fn clean_links(content: &str) -> String {
    let without_empty = EMPTY_LINK.replace_all(content, "");

    MARKDOWN_LINK
        .replace_all(&without_empty, |caps: &regex::Captures<'_>| {
            let text = &caps[1];
            let url = caps[2].trim();
            if url.is_empty() || url == text {
                text.to_string()
            } else {
                format!("[{text}]({})", url.replace(' ', "%20"))
            }
        })
        .into_owned()
}

/// Render an [`ApiReference`] as a Markdown document
///
/// Empty sections are omitted entirely rather than rendered with empty
/// bodies.
pub fn format_api_reference(api_ref: &ApiReference) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !api_ref.class_name.is_empty() {
        parts.push(format!("# {}", api_ref.class_name));
    }
    if !api_ref.description.is_empty() {
        parts.push(format!("\n{}", api_ref.description));
    }
    if !api_ref.url.is_empty() {
        parts.push(format!("\n**Reference:** [{}]({})", api_ref.url, api_ref.url));
    }

    if !api_ref.methods.is_empty() {
        parts.push("\n## Methods".to_string());
        for method in &api_ref.methods {
            parts.push(format!("- {method}"));
        }
    }

    if !api_ref.properties.is_empty() {
        parts.push("\n## Properties".to_string());
        for property in &api_ref.properties {
            parts.push(format!("- {property}"));
        }
    }

    if !api_ref.examples.is_empty() {
        parts.push("\n## Examples".to_string());
        for example in &api_ref.examples {
            parts.push(format!("\n```javascript\n{example}\n```"));
        }
    }

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DocumentParser;

    fn convert(html: &str) -> String {
        let parser = DocumentParser::new("https://docs.phaser.io").unwrap();
        let parsed = parser.parse(html, "").unwrap();
        to_markdown(&parsed).unwrap()
    }

    #[test]
    fn test_basic_conversion_with_title() {
        let md = convert("<main><h1>Scenes</h1><p>A scene owns game objects.</p></main>");
        assert!(md.starts_with("# Scenes"));
        assert!(md.contains("A scene owns game objects."));
    }

    #[test]
    fn test_title_not_duplicated() {
        let md = convert("<main><h1>Scenes</h1><p>body</p></main>");
        assert_eq!(md.matches("# Scenes").count(), 1);
    }

    #[test]
    fn test_fences_get_language_tags() {
        let md = convert(
            "<main><h1>T</h1><pre><code>const game = new Phaser.Game(config);\nconsole.log(game);</code></pre></main>",
        );
        assert!(md.contains("```javascript"), "got: {md}");
        assert!(md.contains("new Phaser.Game(config);"));
    }

    #[test]
    fn test_no_triple_blank_lines() {
        let md = convert("<main><h1>T</h1><p>a</p><br><br><br><p>b</p></main>");
        assert!(!md.contains("\n\n\n"));
    }

    #[test]
    fn test_multiline_inline_code_promoted() {
        let out = fix_code_fences("before `let a = 1;\nlet b = 2;` after");
        assert!(out.contains("```javascript\nlet a = 1;\nlet b = 2;\n```"));
    }

    #[test]
    fn test_existing_fence_untouched_by_inline_fix() {
        let input = "```javascript\nconst x = 1;\nfoo();\n```";
        assert_eq!(fix_code_fences(input), input);
    }

    #[test]
    fn test_self_referencing_link_collapsed() {
        let out = clean_links("see [https://phaser.io](https://phaser.io) now");
        assert_eq!(out, "see https://phaser.io now");
    }

    #[test]
    fn test_link_spaces_encoded() {
        let out = clean_links("[guide](https://docs.phaser.io/my page)");
        assert_eq!(out, "[guide](https://docs.phaser.io/my%20page)");
    }

    #[test]
    fn test_format_api_reference_full() {
        let api = ApiReference::new(
            "Sprite",
            "https://docs.phaser.io/api/Sprite",
            "A Sprite Game Object.",
            vec!["play".to_string()],
            vec!["anims".to_string()],
            vec!["this.add.sprite(0, 0, 'k');".to_string()],
        );
        let md = format_api_reference(&api);
        assert!(md.starts_with("# Sprite"));
        assert!(md.contains("A Sprite Game Object."));
        assert!(md.contains("**Reference:**"));
        assert!(md.contains("## Methods\n- play"));
        assert!(md.contains("## Properties\n- anims"));
        assert!(md.contains("```javascript\nthis.add.sprite(0, 0, 'k');\n```"));
    }

    #[test]
    fn test_format_api_reference_omits_empty_sections() {
        let api = ApiReference::new("Sprite", "", "", vec![], vec![], vec![]);
        let md = format_api_reference(&api);
        assert_eq!(md, "# Sprite");
        assert!(!md.contains("## Methods"));
        assert!(!md.contains("## Examples"));
    }
}
