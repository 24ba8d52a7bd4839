//! User actions
//!
//! [`Controller`] owns one session and performs every action a user can
//! trigger: it validates input, calls the backend, caches the response and
//! hands back something renderable.

use crate::client::AnalysisBackend;
use crate::config::Config;
use crate::error::{Result, TextlensError};
use crate::export::{
    analysis_json, word_frequency_csv, BundleExporter, BundleOutcome, BundlePreset, DownloadSink,
    CSV_EXPORT_NAME, JSON_EXPORT_NAME,
};
use crate::export::bundle::RESULTS_JSON_KEY;
use crate::models::{ConversionDirection, InteractiveResult};
use crate::render::{
    analysis_view, capability_report, file_preview, report_previews, similarity_matrix,
    AnalysisView, CapabilityReport, FilePreview, PreviewChecklist, SimilarityMatrixView,
};
use crate::report::{self, report_options, ReportAssembler};
use crate::session::{ReportArtifact, SessionState, Slot};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Texts loaded by the "similarity example" action
pub const SIMILARITY_EXAMPLE_TEXTS: [&str; 4] = [
    "今天天氣很好，陽光明媚，適合出門遊玩。",
    "今日天候良好，陽光普照，很適合外出活動。",
    "明天會下雨，記得帶雨傘出門。",
    "我喜歡閱讀，特別是科幻小說。",
];

/// Name of the action currently running, if any
#[derive(Debug, Clone, Default)]
pub struct Progress {
    active: Arc<Mutex<Option<String>>>,
}

impl Progress {
    /// Mark `label` as running until the guard is dropped
    pub fn start(&self, label: &str) -> ProgressGuard {
        tracing::debug!("{} started", label);
        if let Ok(mut active) = self.active.lock() {
            *active = Some(label.to_string());
        }
        ProgressGuard {
            progress: self.clone(),
        }
    }

    pub fn current(&self) -> Option<String> {
        self.active.lock().ok().and_then(|active| active.clone())
    }
}

/// Clears the progress indicator when dropped
pub struct ProgressGuard {
    progress: Progress,
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        if let Ok(mut active) = self.progress.active.lock() {
            if let Some(label) = active.take() {
                tracing::debug!("{} finished", label);
            }
        }
    }
}

/// Files written by the "download everything" action
#[derive(Debug, Clone, PartialEq)]
pub struct EverythingOutcome {
    /// `None` if no chart could be bundled
    pub bundle: Option<BundleOutcome>,
    pub json: PathBuf,
}

/// Split similarity input into one text per non-empty line
pub fn parse_similarity_input(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct Controller {
    config: Config,
    backend: Arc<dyn AnalysisBackend>,
    sink: Arc<dyn DownloadSink>,
    session: SessionState,
    progress: Progress,
}

impl Controller {
    pub fn new(
        config: Config,
        backend: Arc<dyn AnalysisBackend>,
        sink: Arc<dyn DownloadSink>,
    ) -> Self {
        let session = SessionState::new();
        tracing::debug!("Session {} started", session.id());

        Self {
            config,
            backend,
            sink,
            session,
            progress: Progress::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Analyze one text and cache the result
    pub async fn analyze(&mut self, text: &str) -> Result<AnalysisView> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TextlensError::invalid_input("請輸入要分析的文本"));
        }

        let _progress = self.progress.start("analyze");
        let ticket = self.session.begin(Slot::Analysis);
        let result = self.backend.analyze(text).await?;
        let view = analysis_view(&result, &self.config.render);
        tracing::info!(
            "Analysis complete: {} distinct words",
            result.word_frequency.len()
        );
        self.session.commit_analysis(&ticket, result, text);

        if self.config.report.auto_generate_interactive {
            if let Err(e) = report::generate_interactive(self.backend.as_ref(), &mut self.session).await
            {
                tracing::warn!("Automatic interactive generation failed: {}", e);
            }
        }

        Ok(view)
    }

    /// Analyze the content of the last uploaded file
    pub async fn analyze_file_content(&mut self) -> Result<AnalysisView> {
        let content = self
            .session
            .parsed_file()
            .map(|file| file.content.clone())
            .ok_or_else(|| TextlensError::invalid_input("請先上傳文件"))?;
        self.analyze(&content).await
    }

    /// Convert between traditional and simplified script
    pub async fn convert(&mut self, text: &str, direction: ConversionDirection) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TextlensError::invalid_input("請輸入要轉換的文本"));
        }

        let _progress = self.progress.start("convert");
        let ticket = self.session.begin(Slot::Conversion);
        let converted = self.backend.convert(text, direction).await?;
        self.session
            .commit_conversion(&ticket, converted.clone(), direction);
        Ok(converted)
    }

    /// Save the last conversion as a text file
    pub fn save_conversion(&self) -> Result<PathBuf> {
        let conversion = self
            .session
            .conversion()
            .ok_or_else(|| TextlensError::invalid_input("沒有可保存的轉換結果"))?;
        self.sink.save(
            conversion.direction.download_name(),
            conversion.text.as_bytes(),
        )
    }

    /// Compare two or more texts
    pub async fn similarity(&mut self, texts: &[String]) -> Result<SimilarityMatrixView> {
        let texts: Vec<String> = texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        if texts.len() < 2 {
            return Err(TextlensError::invalid_input("請至少輸入兩段文本進行比較"));
        }

        let _progress = self.progress.start("similarity");
        let ticket = self.session.begin(Slot::Similarity);
        let result = self.backend.similarity(&texts).await?;
        result
            .check_shape()
            .map_err(TextlensError::InvalidResponse)?;

        let view = similarity_matrix(&result, self.config.render.label_width);
        self.session.commit_similarity(&ticket, result);
        Ok(view)
    }

    /// Upload a document for text extraction
    pub async fn upload(&mut self, path: &Path) -> Result<FilePreview> {
        if !path.is_file() {
            return Err(TextlensError::invalid_input(format!(
                "請選擇要上傳的文件: {}",
                path.display()
            )));
        }

        let bytes = std::fs::read(path).map_err(|e| TextlensError::Io {
            source: e,
            context: format!("Failed to read upload: {}", path.display()),
        })?;
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();

        let _progress = self.progress.start("upload");
        let ticket = self.session.begin(Slot::ParsedFile);
        let parsed = self.backend.upload_file(&filename, bytes).await?;
        let preview = file_preview(&parsed);
        self.session.commit_parsed_file(&ticket, parsed);
        Ok(preview)
    }

    pub async fn capabilities(&self) -> Result<CapabilityReport> {
        let _progress = self.progress.start("capabilities");
        let caps = self.backend.capabilities().await?;
        Ok(capability_report(&caps))
    }

    /// Generate interactive charts for the current analysis
    pub async fn interactive(&mut self) -> Result<InteractiveResult> {
        let _progress = self.progress.start("interactive");
        report::generate_interactive(self.backend.as_ref(), &mut self.session).await
    }

    /// Sections the next report will contain
    pub fn report_previews(&self) -> Vec<PreviewChecklist> {
        report_previews(self.session.interactive(), self.session.similarity())
    }

    /// Generate a comprehensive report
    pub async fn report(&mut self) -> Result<ReportArtifact> {
        let _progress = self.progress.start("report");
        let assembler = ReportAssembler::new(
            self.backend.as_ref(),
            report_options(&self.config.report),
        );
        assembler.assemble(&mut self.session).await
    }

    /// Save the rendered report
    pub async fn download_report(&self) -> Result<PathBuf> {
        let artifact = self
            .session
            .report()
            .ok_or_else(|| TextlensError::invalid_input("請先生成報告"))?;

        let _progress = self.progress.start("download report");
        let bytes = self.backend.fetch_bytes(&artifact.view_url).await?;
        self.sink.save(&artifact.download_name, &bytes)
    }

    /// Download a preset group of charts
    pub async fn bundle(&self, preset: BundlePreset) -> Result<BundleOutcome> {
        let items: Vec<(String, Option<String>)> = match preset {
            BundlePreset::All => self
                .session
                .all_visualizations()
                .into_iter()
                .filter(|(key, _)| key != RESULTS_JSON_KEY)
                .map(|(key, url)| (key, Some(url)))
                .collect(),
            BundlePreset::Basic | BundlePreset::Advanced => {
                let analysis = self
                    .session
                    .analysis_result()
                    .ok_or_else(|| TextlensError::invalid_input("無分析結果可下載"))?;
                preset
                    .keys()
                    .iter()
                    .map(|key| (key.to_string(), analysis.visualizations.get(*key).cloned()))
                    .collect()
            }
        };

        let _progress = self.progress.start("bundle");
        BundleExporter::new(Arc::clone(&self.backend))
            .export(&items, preset.archive_name(), self.sink.as_ref())
            .await
    }

    /// Save the current analysis as JSON
    pub fn export_json(&self) -> Result<PathBuf> {
        let analysis = self
            .session
            .analysis_result()
            .ok_or_else(|| TextlensError::invalid_input("無分析結果可下載"))?;
        let json = analysis_json(analysis)?;
        self.sink.save(JSON_EXPORT_NAME, json.as_bytes())
    }

    /// Save word frequencies as CSV
    pub fn export_csv(&self) -> Result<PathBuf> {
        let analysis = self
            .session
            .analysis_result()
            .ok_or_else(|| TextlensError::invalid_input("無分析結果可下載"))?;
        self.sink
            .save(CSV_EXPORT_NAME, word_frequency_csv(analysis).as_bytes())
    }

    /// Every chart as one archive plus the JSON export
    pub async fn export_everything(&self) -> Result<EverythingOutcome> {
        if self.session.analysis().is_none() {
            return Err(TextlensError::invalid_input("無分析結果可下載"));
        }

        let bundle = match self.bundle(BundlePreset::All).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!("Chart bundle skipped: {}", e);
                None
            }
        };
        let json = self.export_json()?;
        Ok(EverythingOutcome { bundle, json })
    }

    /// The sample text served by the backend
    pub async fn sample_text(&self) -> Result<String> {
        let _progress = self.progress.start("sample");
        self.backend.sample_text().await
    }

    pub fn similarity_example() -> Vec<String> {
        SIMILARITY_EXAMPLE_TEXTS
            .iter()
            .map(|text| text.to_string())
            .collect()
    }
}
