//! Documentation tool surface
//!
//! [`DocsTool`] wires the client, parser, and converter into the three
//! operations exposed to LLM hosts: reading a page as paginated Markdown,
//! searching the catalog, and looking up an API reference. Parameter
//! structs derive [`JsonSchema`] so hosts receive accurate input schemas.

use crate::client::DocsClient;
use crate::config::DocsConfig;
use crate::convert;
use crate::error::DocsError;
use crate::parser::DocumentParser;
use crate::types::SearchResult;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

/// Description of the `read_documentation` tool for LLM consumption
pub const READ_DOCUMENTATION_DESCRIPTION: &str = "Read Phaser documentation from a specific URL and return it as clean Markdown. Supports pagination via max_length and start_index for long pages.";

/// Description of the `search_documentation` tool for LLM consumption
pub const SEARCH_DOCUMENTATION_DESCRIPTION: &str = "Search Phaser documentation for specific content. Returns ranked results with title, URL, snippet, and relevance score.";

/// Description of the `get_api_reference` tool for LLM consumption
pub const GET_API_REFERENCE_DESCRIPTION: &str = "Get the Phaser API reference for a specific class as Markdown, including description, methods, properties, and code examples.";

fn default_max_length() -> usize {
    5000
}

fn default_search_limit() -> usize {
    10
}

/// Parameters for [`DocsTool::read_documentation`]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReadDocumentationParams {
    /// URL of the Phaser documentation page to read
    pub url: String,

    /// Maximum number of characters to return (default: 5000)
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Character offset to start from, for pagination (default: 0)
    #[serde(default)]
    pub start_index: usize,
}

/// Parameters for [`DocsTool::search_documentation`]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchDocumentationParams {
    /// Search query string
    pub query: String,

    /// Maximum number of results to return (default: 10)
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

/// Parameters for [`DocsTool::get_api_reference`]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetApiReferenceParams {
    /// Name of the Phaser class, e.g. `Sprite` or `Phaser.Scene`
    pub class_name: String,
}

/// JSON Schema for the `read_documentation` tool input
pub fn read_documentation_schema() -> Value {
    serde_json::to_value(schema_for!(ReadDocumentationParams)).unwrap_or_default()
}

/// JSON Schema for the `search_documentation` tool input
pub fn search_documentation_schema() -> Value {
    serde_json::to_value(schema_for!(SearchDocumentationParams)).unwrap_or_default()
}

/// JSON Schema for the `get_api_reference` tool input
pub fn get_api_reference_schema() -> Value {
    serde_json::to_value(schema_for!(GetApiReferenceParams)).unwrap_or_default()
}

/// The documentation tool: client plus parser behind a stable API
#[derive(Debug, Clone)]
pub struct DocsTool {
    client: DocsClient,
    parser: DocumentParser,
}

impl DocsTool {
    /// Build a tool from configuration
    pub fn new(config: &DocsConfig) -> Result<Self, DocsError> {
        Ok(Self {
            client: DocsClient::new(config)?,
            parser: DocumentParser::new(&config.base_url)?,
        })
    }

    /// Build a tool from `PHASER_DOCS_*` environment variables
    pub fn from_env() -> Result<Self, DocsError> {
        Self::new(&DocsConfig::from_env())
    }

    /// Underlying HTTP client
    pub fn client(&self) -> &DocsClient {
        &self.client
    }

    /// Fetch a documentation page and return it as paginated Markdown
    ///
    /// Pagination operates on characters, so a slice never lands inside a
    /// multi-byte sequence. A `start_index` past the end yields an empty
    /// string rather than an error.
    pub async fn read_documentation(
        &self,
        params: ReadDocumentationParams,
    ) -> Result<String, DocsError> {
        if params.max_length == 0 {
            return Err(DocsError::Validation(
                "max_length must be positive".to_string(),
            ));
        }

        info!(url = %params.url, "Reading documentation");

        let page = self.client.get_page_content(&params.url).await?;
        let parsed = self.parser.parse(&page.content, &page.url)?;
        let markdown = convert::to_markdown(&parsed)?;

        let paginated: String = markdown
            .chars()
            .skip(params.start_index)
            .take(params.max_length)
            .collect();

        info!(chars = paginated.len(), "Read documentation");
        Ok(paginated)
    }

    /// Search the documentation catalog
    pub async fn search_documentation(
        &self,
        params: SearchDocumentationParams,
    ) -> Result<Vec<SearchResult>, DocsError> {
        self.client.search_content(&params.query, params.limit)
    }

    /// Look up a class API reference and render it as Markdown
    pub async fn get_api_reference(
        &self,
        params: GetApiReferenceParams,
    ) -> Result<String, DocsError> {
        let api_ref = self.client.get_api_reference(&params.class_name).await?;
        Ok(convert::format_api_reference(&api_ref))
    }

    /// Check connectivity to the documentation site
    pub async fn health_check(&self) -> Result<(), DocsError> {
        self.client.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_defaults_from_json() {
        let params: ReadDocumentationParams =
            serde_json::from_str(r#"{"url": "https://docs.phaser.io/phaser/"}"#).unwrap();
        assert_eq!(params.max_length, 5000);
        assert_eq!(params.start_index, 0);

        let params: SearchDocumentationParams =
            serde_json::from_str(r#"{"query": "sprite"}"#).unwrap();
        assert_eq!(params.limit, 10);
    }

    #[test]
    fn test_schemas_declare_required_fields() {
        let schema = read_documentation_schema();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "url"));
        assert!(!required.iter().any(|v| v == "max_length"));

        let schema = get_api_reference_schema();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "class_name"));
    }

    #[tokio::test]
    async fn test_read_documentation_rejects_zero_max_length() {
        let tool = DocsTool::new(&DocsConfig::default()).unwrap();
        let result = tool
            .read_documentation(ReadDocumentationParams {
                url: "https://docs.phaser.io/phaser/".to_string(),
                max_length: 0,
                start_index: 0,
            })
            .await;
        assert!(matches!(result, Err(DocsError::Validation(_))));
    }
}
