//! Wire types exchanged with the analysis service
//!
//! Every payload keeps the fields it does not model in an `extra` map so
//! that exports reproduce exactly what the service returned.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Visualization kind -> artifact URL (relative to the service or absolute)
pub type VisualizationMap = BTreeMap<String, String>;

/// Output of single-text analysis (`POST /api/analyze`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub visualizations: VisualizationMap,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub word_frequency: BTreeMap<String, u64>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pos_distribution: BTreeMap<String, u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub entities: BTreeMap<String, Vec<String>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub keywords: BTreeMap<String, f64>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ngrams: BTreeMap<String, u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_words: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_word_length: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Lexicon-based sentiment record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_label: Option<String>,

    #[serde(default)]
    pub positive_count: u64,

    #[serde(default)]
    pub negative_count: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pairwise comparison of several texts (`POST /api/similarity/analyze`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    #[serde(default)]
    pub similarity_matrix: Vec<Vec<f64>>,

    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualizations: Option<VisualizationMap>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SimilarityResult {
    /// Check that the matrix is square and matches the label count.
    /// The diagonal is not inspected.
    pub fn check_shape(&self) -> std::result::Result<(), String> {
        let n = self.labels.len();
        if self.similarity_matrix.len() != n {
            return Err(format!(
                "similarity matrix has {} rows for {} labels",
                self.similarity_matrix.len(),
                n
            ));
        }
        if let Some((i, row)) = self
            .similarity_matrix
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != n)
        {
            return Err(format!("row {} has {} columns, expected {}", i, row.len(), n));
        }
        Ok(())
    }
}

/// Interactive charts derived from an analysis (`POST /api/visualizations/advanced`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractiveResult {
    #[serde(default)]
    pub visualizations: VisualizationMap,
}

/// Section switches sent with a comprehensive report request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    pub basic: bool,
    pub advanced: bool,
    pub interactive: bool,
    pub title: String,
    pub json: bool,
    pub data: bool,
    pub summary: bool,
}

/// Analysis payload embedded in a report request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportAnalysisData {
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub original_text: String,
}

/// Body of `POST /api/generate_comprehensive_report`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub analysis_data: ReportAnalysisData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_data: Option<SimilarityResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive_data: Option<InteractiveResult>,
    pub options: ReportOptions,
}

/// Reply to a report request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Chinese script conversion target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionDirection {
    ToTraditional,
    ToSimplified,
}

impl ConversionDirection {
    /// File name used when saving converted text
    pub fn download_name(self) -> &'static str {
        match self {
            ConversionDirection::ToTraditional => "traditional_chinese.txt",
            ConversionDirection::ToSimplified => "simplified_chinese.txt",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ConvertRequest<'a> {
    pub text: &'a str,
    pub direction: ConversionDirection,
}

/// Reply to `POST /api/convert`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversionResponse {
    #[serde(default)]
    pub converted_text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Text extracted from an uploaded document (`POST /api/file/upload`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub filename: String,
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

/// Feature switches reported by `GET /api/system/capabilities`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub similarity_analysis: bool,
    #[serde(default)]
    pub advanced_visualization: bool,
    #[serde(default)]
    pub task_queue: bool,
    #[serde(default)]
    pub file_parsing: bool,
    #[serde(default)]
    pub gpu_acceleration: bool,
    #[serde(default)]
    pub supported_formats: Vec<String>,
}
