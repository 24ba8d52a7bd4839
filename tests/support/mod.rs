//! In-memory analysis backend shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use textlens::client::AnalysisBackend;
use textlens::config::Config;
use textlens::controller::Controller;
use textlens::error::{Result, TextlensError};
use textlens::export::MemorySink;
use textlens::models::{
    AnalysisResult, Capabilities, ConversionDirection, InteractiveResult, ParsedFile,
    ReportRequest, ReportResponse, SimilarityResult,
};

pub const BASE_URL: &str = "http://backend.test";

/// Scripted backend that records every call it receives
#[derive(Default)]
pub struct FakeBackend {
    pub analysis: AnalysisResult,
    pub similarity: SimilarityResult,
    pub interactive: Option<InteractiveResult>,
    pub report: Option<ReportResponse>,
    /// Replies handed out before falling back to `report`
    pub report_sequence: Mutex<Vec<ReportResponse>>,
    pub parsed_file: ParsedFile,
    pub artifacts: HashMap<String, Vec<u8>>,
    pub calls: Mutex<Vec<String>>,
    pub report_requests: Mutex<Vec<ReportRequest>>,
}

impl FakeBackend {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == name).count()
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }
}

fn not_found(url: &str) -> TextlensError {
    TextlensError::Http {
        status: 404,
        url: url.to_string(),
        body: "not found".to_string(),
    }
}

#[async_trait]
impl AnalysisBackend for FakeBackend {
    fn base_url(&self) -> &str {
        BASE_URL
    }

    async fn analyze(&self, _text: &str) -> Result<AnalysisResult> {
        self.record("analyze");
        Ok(self.analysis.clone())
    }

    async fn convert(&self, text: &str, direction: ConversionDirection) -> Result<String> {
        self.record("convert");
        Ok(match direction {
            ConversionDirection::ToTraditional => text.replace("简体", "簡體"),
            ConversionDirection::ToSimplified => text.replace("簡體", "简体"),
        })
    }

    async fn similarity(&self, _texts: &[String]) -> Result<SimilarityResult> {
        self.record("similarity");
        Ok(self.similarity.clone())
    }

    async fn upload_file(&self, filename: &str, bytes: Vec<u8>) -> Result<ParsedFile> {
        self.record("upload_file");
        let mut parsed = self.parsed_file.clone();
        parsed.filename = filename.to_string();
        if parsed.content.is_empty() {
            parsed.content = String::from_utf8_lossy(&bytes).into_owned();
        }
        Ok(parsed)
    }

    async fn capabilities(&self) -> Result<Capabilities> {
        self.record("capabilities");
        Ok(Capabilities {
            similarity_analysis: true,
            file_parsing: true,
            supported_formats: vec!["txt".to_string(), "pdf".to_string()],
            ..Default::default()
        })
    }

    async fn advanced_visualizations(
        &self,
        _analysis: &AnalysisResult,
    ) -> Result<InteractiveResult> {
        self.record("advanced_visualizations");
        self.interactive
            .clone()
            .ok_or_else(|| TextlensError::Backend("interactive generation failed".to_string()))
    }

    async fn generate_report(&self, request: &ReportRequest) -> Result<ReportResponse> {
        self.record("generate_report");
        self.report_requests.lock().unwrap().push(request.clone());
        let mut sequence = self.report_sequence.lock().unwrap();
        if !sequence.is_empty() {
            return Ok(sequence.remove(0));
        }
        self.report.clone().ok_or_else(|| TextlensError::Http {
            status: 500,
            url: format!("{}/api/generate_comprehensive_report", BASE_URL),
            body: "boom".to_string(),
        })
    }

    async fn sample_text(&self) -> Result<String> {
        self.record("sample_text");
        Ok("今天天氣很好，陽光明媚。".to_string())
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.record("fetch_bytes");
        self.artifacts.get(url).cloned().ok_or_else(|| not_found(url))
    }
}

/// Analysis whose charts live under `/static/results/<id>/`
pub fn analysis_result(id: &str) -> AnalysisResult {
    let mut result = AnalysisResult::default();
    for key in ["wordcloud", "word_frequency", "sentiment", "results_json"] {
        let ext = if key == "results_json" { "json" } else { "png" };
        result.visualizations.insert(
            key.to_string(),
            format!("/static/results/{}/{}.{}", id, key, ext),
        );
    }
    result.word_frequency.insert("天氣".to_string(), 3);
    result.word_frequency.insert("陽光".to_string(), 1);
    result.total_words = Some(8);
    result
}

pub fn interactive_result(id: &str) -> InteractiveResult {
    let mut result = InteractiveResult::default();
    result.visualizations.insert(
        "treemap".to_string(),
        format!("/static/results/{}/treemap.html", id),
    );
    result
}

pub fn report_ok(id: &str) -> ReportResponse {
    ReportResponse {
        success: true,
        report_id: Some(id.to_string()),
        error: None,
    }
}

pub fn controller(backend: Arc<FakeBackend>) -> (Controller, Arc<MemorySink>) {
    controller_with_config(backend, Config::default())
}

pub fn controller_with_config(
    backend: Arc<FakeBackend>,
    config: Config,
) -> (Controller, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let controller = Controller::new(config, backend, sink.clone());
    (controller, sink)
}
