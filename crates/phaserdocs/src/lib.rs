//! PhaserDocs - Phaser documentation access library
//!
//! This crate fetches pages from the official Phaser documentation sites,
//! converts them to clean Markdown, searches a curated topic catalog, and
//! extracts API reference information for Phaser classes.
//!
//! ## Pipeline
//!
//! Fetching goes through a strict allow-list validator and a retrying HTTP
//! client, then HTML structure extraction, then Markdown conversion:
//!
//! - [`UrlValidator`] - domain allow-list and input sanitization
//! - [`DocsClient`] - pooled HTTP client with exponential backoff
//! - [`DocumentParser`] - content area selection and code block extraction
//! - [`DocsTool`] - the three operations exposed to LLM hosts

pub mod client;
pub mod config;
pub mod convert;
mod error;
pub mod parser;
pub mod search;
mod tool;
mod types;
pub mod validate;

pub use client::DocsClient;
pub use config::DocsConfig;
pub use convert::format_api_reference;
pub use error::DocsError;
pub use parser::{CodeBlock, DocumentParser, ParsedDocument};
pub use search::{default_catalog, CatalogEntry, SearchIndex};
pub use tool::{
    get_api_reference_schema, read_documentation_schema, search_documentation_schema,
    DocsTool, GetApiReferenceParams, ReadDocumentationParams, SearchDocumentationParams,
    GET_API_REFERENCE_DESCRIPTION, READ_DOCUMENTATION_DESCRIPTION,
    SEARCH_DOCUMENTATION_DESCRIPTION,
};
pub use types::{ApiReference, DocumentationPage, SearchResult};
pub use validate::{sanitize_input, validate_search_query, UrlValidator};

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = "Phaser-MCP-Server/1.0.0 (Documentation Access Bot)";
