//! Comprehensive report assembly
//!
//! A report embeds links to the interactive charts of the current analysis,
//! so those charts must exist before the request is submitted. The
//! readiness check is the two-state [`ReportState`]; [`ReportAssembler`]
//! drives it against a backend.

use crate::client::{resolve_url, AnalysisBackend};
use crate::config::ReportConfig;
use crate::error::{Result, TextlensError};
use crate::models::{
    InteractiveResult, ReportAnalysisData, ReportOptions, ReportRequest, ReportResponse,
    SimilarityResult,
};
use crate::session::{AnalysisEntry, ReportArtifact, SessionState, Slot};

/// File name offered when the rendered report is downloaded
pub const REPORT_DOWNLOAD_NAME: &str = "chinese_text_analysis_report.html";

/// Readiness of the session for report submission
#[derive(Debug, Clone, PartialEq)]
pub enum ReportState {
    /// Interactive charts have not been generated yet
    PendingInteractive,
    /// Interactive generation has settled; `None` if it failed
    Ready {
        interactive: Option<InteractiveResult>,
    },
}

/// What the assembler has to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStep {
    GenerateInteractive,
    Submit,
}

impl ReportState {
    pub fn for_session(session: &SessionState) -> Self {
        match session.interactive() {
            Some(interactive) => ReportState::Ready {
                interactive: Some(interactive.clone()),
            },
            None => ReportState::PendingInteractive,
        }
    }

    pub fn next_step(&self) -> ReportStep {
        match self {
            ReportState::PendingInteractive => ReportStep::GenerateInteractive,
            ReportState::Ready { .. } => ReportStep::Submit,
        }
    }

    /// Interactive generation finished, successfully or not
    pub fn interactive_settled(self, outcome: Option<InteractiveResult>) -> Self {
        match self {
            ReportState::PendingInteractive => ReportState::Ready {
                interactive: outcome,
            },
            ready => ready,
        }
    }

    /// Interactive data to embed; `None` while still pending
    pub fn into_interactive(self) -> Option<InteractiveResult> {
        match self {
            ReportState::Ready { interactive } => interactive,
            ReportState::PendingInteractive => None,
        }
    }
}

pub fn report_options(config: &ReportConfig) -> ReportOptions {
    ReportOptions {
        basic: config.basic,
        advanced: config.advanced,
        interactive: config.interactive,
        title: config.title.clone(),
        json: config.json,
        data: config.data,
        summary: config.summary,
    }
}

/// Union of everything the session knows, as one report request
pub fn build_request(
    analysis: &AnalysisEntry,
    similarity: Option<&SimilarityResult>,
    interactive: Option<&InteractiveResult>,
    options: ReportOptions,
) -> ReportRequest {
    ReportRequest {
        analysis_data: ReportAnalysisData {
            result: analysis.result.clone(),
            original_text: analysis.original_text.clone(),
        },
        similarity_data: similarity.cloned(),
        interactive_data: interactive.cloned(),
        options,
    }
}

/// Turn the service reply into a report artifact
pub fn artifact_from_response(base_url: &str, response: ReportResponse) -> Result<ReportArtifact> {
    if !response.success {
        return Err(TextlensError::Backend(
            response.error.unwrap_or_else(|| "報告生成失敗".to_string()),
        ));
    }

    let report_id = response
        .report_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| TextlensError::InvalidResponse("report reply has no report_id".to_string()))?;
    let view_url = resolve_url(
        base_url,
        &format!("/static/results/{}/report.html", report_id),
    )?;

    Ok(ReportArtifact {
        report_id,
        view_url,
        download_name: REPORT_DOWNLOAD_NAME.to_string(),
    })
}

/// Generate interactive charts for the current analysis and cache them
pub async fn generate_interactive(
    backend: &dyn AnalysisBackend,
    session: &mut SessionState,
) -> Result<InteractiveResult> {
    let analysis = session
        .analysis_result()
        .cloned()
        .ok_or_else(|| TextlensError::invalid_input("請先進行文本分析"))?;

    let ticket = session.begin(Slot::Interactive);
    let result = backend.advanced_visualizations(&analysis).await?;
    tracing::info!(
        "Generated {} interactive visualizations",
        result.visualizations.len()
    );

    if !session.commit_interactive(&ticket, result.clone()) {
        tracing::warn!("Interactive visualizations belong to a replaced analysis; not cached");
    }
    Ok(result)
}

/// Sequences interactive generation and report submission
pub struct ReportAssembler<'a> {
    backend: &'a dyn AnalysisBackend,
    options: ReportOptions,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(backend: &'a dyn AnalysisBackend, options: ReportOptions) -> Self {
        Self { backend, options }
    }

    /// Build and submit a comprehensive report.
    ///
    /// On failure the previously stored report is left as it was.
    pub async fn assemble(&self, session: &mut SessionState) -> Result<ReportArtifact> {
        let analysis = session
            .analysis()
            .cloned()
            .ok_or_else(|| TextlensError::invalid_input("請先進行文本分析"))?;
        if analysis.analysis_id.is_none() {
            return Err(TextlensError::invalid_input(
                "分析結果缺少分析編號，無法生成報告",
            ));
        }

        let mut state = ReportState::for_session(session);
        if state.next_step() == ReportStep::GenerateInteractive {
            tracing::info!("Generating interactive visualizations before the report");
            let outcome = match generate_interactive(self.backend, session).await {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::warn!("Interactive generation failed, reporting without it: {}", e);
                    None
                }
            };
            state = state.interactive_settled(outcome);
        }
        let interactive = state.into_interactive();

        let request = build_request(
            &analysis,
            session.similarity(),
            interactive.as_ref(),
            self.options.clone(),
        );

        tracing::info!("Submitting comprehensive report request");
        let response = self.backend.generate_report(&request).await?;
        let artifact = artifact_from_response(self.backend.base_url(), response)?;

        tracing::info!("Report {} ready at {}", artifact.report_id, artifact.view_url);
        session.set_report(artifact.clone());
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::AnalysisResult;

    #[test]
    fn test_state_transitions() {
        let state = ReportState::PendingInteractive;
        assert_eq!(state.next_step(), ReportStep::GenerateInteractive);

        let state = state.interactive_settled(None);
        assert_eq!(state.next_step(), ReportStep::Submit);
        assert!(state.clone().into_interactive().is_none());

        // Settling again does not replace what is already there
        let ready = ReportState::Ready {
            interactive: Some(InteractiveResult::default()),
        };
        let still = ready.clone().interactive_settled(None);
        assert_eq!(still, ready);
    }

    #[test]
    fn test_state_for_session() {
        let mut session = SessionState::new();
        assert_eq!(
            ReportState::for_session(&session),
            ReportState::PendingInteractive
        );

        let t = session.begin(Slot::Analysis);
        session.commit_analysis(&t, AnalysisResult::default(), "text");
        let t = session.begin(Slot::Interactive);
        session.commit_interactive(&t, InteractiveResult::default());

        assert_eq!(
            ReportState::for_session(&session).next_step(),
            ReportStep::Submit
        );
    }

    #[test]
    fn test_artifact_from_response() {
        let response = ReportResponse {
            success: true,
            report_id: Some("r-42".to_string()),
            ..Default::default()
        };
        let artifact = artifact_from_response("http://127.0.0.1:3000", response).unwrap();
        assert_eq!(
            artifact.view_url,
            "http://127.0.0.1:3000/static/results/r-42/report.html"
        );
        assert_eq!(artifact.download_name, REPORT_DOWNLOAD_NAME);
    }

    #[test]
    fn test_artifact_url_keeps_base_prefix() {
        let response = ReportResponse {
            success: true,
            report_id: Some("r1".to_string()),
            ..Default::default()
        };
        let artifact = artifact_from_response("http://host/textapp", response).unwrap();
        assert_eq!(
            artifact.view_url,
            "http://host/textapp/static/results/r1/report.html"
        );
    }

    #[test]
    fn test_failed_response() {
        let response = ReportResponse {
            success: false,
            error: Some("No analysis data provided".to_string()),
            ..Default::default()
        };
        let err = artifact_from_response("http://127.0.0.1:3000", response).unwrap_err();
        assert!(matches!(err, TextlensError::Backend(msg) if msg == "No analysis data provided"));

        let response = ReportResponse {
            success: true,
            ..Default::default()
        };
        assert!(artifact_from_response("http://127.0.0.1:3000", response).is_err());
    }

    #[test]
    fn test_report_options_from_config() {
        let options = report_options(&Config::default().report);
        assert_eq!(options.title, "中文文本分析完整報告");
        assert!(options.basic && options.interactive && options.summary);
    }
}
