//! HTTP adapter for the analysis service
//!
//! `AnalysisBackend` is the seam every other component talks to. The
//! reqwest implementation makes exactly one attempt per call: no retry,
//! no timeout, no backoff.

mod http;

pub use http::HttpBackend;

use crate::error::Result;
use crate::models::{
    AnalysisResult, Capabilities, ConversionDirection, InteractiveResult, ParsedFile,
    ReportRequest, ReportResponse, SimilarityResult,
};
use async_trait::async_trait;

pub const ANALYZE_PATH: &str = "/api/analyze";
pub const CONVERT_PATH: &str = "/api/convert";
pub const SIMILARITY_PATH: &str = "/api/similarity/analyze";
pub const UPLOAD_PATH: &str = "/api/file/upload";
pub const CAPABILITIES_PATH: &str = "/api/system/capabilities";
pub const ADVANCED_VISUALIZATIONS_PATH: &str = "/api/visualizations/advanced";
pub const REPORT_PATH: &str = "/api/generate_comprehensive_report";
pub const SAMPLE_TEXT_PATH: &str = "/input_texts/sample.txt";

/// Operations offered by the analysis service
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Base URL that relative artifact paths are resolved against
    fn base_url(&self) -> &str;

    /// Analyze a single text
    async fn analyze(&self, text: &str) -> Result<AnalysisResult>;

    /// Convert between simplified and traditional script
    async fn convert(&self, text: &str, direction: ConversionDirection) -> Result<String>;

    /// Compare two or more texts
    async fn similarity(&self, texts: &[String]) -> Result<SimilarityResult>;

    /// Upload a document and get its extracted text
    async fn upload_file(&self, filename: &str, bytes: Vec<u8>) -> Result<ParsedFile>;

    /// Ask which optional features the service has enabled
    async fn capabilities(&self) -> Result<Capabilities>;

    /// Build interactive charts for an analysis result
    async fn advanced_visualizations(&self, analysis: &AnalysisResult)
        -> Result<InteractiveResult>;

    /// Submit a comprehensive report request
    async fn generate_report(&self, request: &ReportRequest) -> Result<ReportResponse>;

    /// Fetch the bundled sample text
    async fn sample_text(&self) -> Result<String>;

    /// Download an artifact as raw bytes
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// Resolve an artifact path against the service base URL.
///
/// Absolute `http(s)` URLs are returned unchanged. Anything else is
/// appended to the base, so a base with a path prefix keeps it.
pub fn resolve_url(base_url: &str, path: &str) -> Result<String> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(path.to_string());
    }

    reqwest::Url::parse(base_url).map_err(|e| {
        crate::error::TextlensError::Config(format!("Invalid base URL '{}': {}", base_url, e))
    })?;

    Ok(format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_path() {
        let url = resolve_url("http://127.0.0.1:3000", "/static/results/abc/wordcloud.png").unwrap();
        assert_eq!(url, "http://127.0.0.1:3000/static/results/abc/wordcloud.png");
    }

    #[test]
    fn test_resolve_keeps_base_prefix() {
        let url = resolve_url("http://host/textapp/", "/static/results/x/wordcloud.png").unwrap();
        assert_eq!(url, "http://host/textapp/static/results/x/wordcloud.png");

        let url = resolve_url("http://host/textapp", "static/results/x/treemap.html").unwrap();
        assert_eq!(url, "http://host/textapp/static/results/x/treemap.html");
    }

    #[test]
    fn test_resolve_absolute_url() {
        let url = resolve_url("http://127.0.0.1:3000", "https://cdn.example.com/a.png").unwrap();
        assert_eq!(url, "https://cdn.example.com/a.png");
    }

    #[test]
    fn test_resolve_invalid_base() {
        assert!(resolve_url("::nope::", "/a.png").is_err());
    }
}
