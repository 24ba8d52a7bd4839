//! Session state
//!
//! Holds the latest result of every request kind for one interactive
//! session. Nothing here is persisted; a session lives as long as the
//! controller that owns it.
//!
//! Writes are versioned: every request takes a [`Ticket`] from a monotonic
//! counter and its response is committed only if no newer request of the
//! same kind has already been committed. An old response that arrives late
//! is dropped instead of overwriting the newer result.

use crate::models::{
    AnalysisResult, ConversionDirection, InteractiveResult, ParsedFile, SimilarityResult,
    VisualizationMap,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::HashMap;
use uuid::Uuid;

/// Kinds of result the session caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Analysis,
    Similarity,
    Interactive,
    ParsedFile,
    Conversion,
}

/// Proof that a request was started; required to commit its response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    slot: Slot,
    seq: u64,
    /// Analysis generation the request was derived from (interactive only)
    basis: Option<u64>,
}

/// Latest analysis together with the text it was computed from
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisEntry {
    pub result: AnalysisResult,
    pub original_text: String,
    /// Identifier of the result directory on the service, if one could be derived
    pub analysis_id: Option<String>,
}

/// Latest script conversion
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionEntry {
    pub text: String,
    pub direction: ConversionDirection,
}

/// A comprehensive report the service has rendered
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    pub report_id: String,
    pub view_url: String,
    pub download_name: String,
}

/// In-memory result cache for one session
#[derive(Debug)]
pub struct SessionState {
    id: Uuid,
    started_at: DateTime<Utc>,
    next_seq: u64,
    committed: HashMap<Slot, u64>,
    analysis: Option<AnalysisEntry>,
    similarity: Option<SimilarityResult>,
    interactive: Option<InteractiveResult>,
    parsed_file: Option<ParsedFile>,
    conversion: Option<ConversionEntry>,
    report: Option<ReportArtifact>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Create an empty session
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            next_seq: 0,
            committed: HashMap::new(),
            analysis: None,
            similarity: None,
            interactive: None,
            parsed_file: None,
            conversion: None,
            report: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Start a request for `slot`
    pub fn begin(&mut self, slot: Slot) -> Ticket {
        self.next_seq += 1;
        let basis = match slot {
            Slot::Interactive => self.committed.get(&Slot::Analysis).copied(),
            _ => None,
        };
        Ticket {
            slot,
            seq: self.next_seq,
            basis,
        }
    }

    /// Whether a response for `ticket` may still be committed
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        let newer_committed = self
            .committed
            .get(&ticket.slot)
            .is_some_and(|&seq| seq > ticket.seq);
        if newer_committed {
            return false;
        }

        match ticket.slot {
            Slot::Interactive => ticket.basis == self.committed.get(&Slot::Analysis).copied(),
            _ => true,
        }
    }

    fn accept(&mut self, ticket: &Ticket, expected: Slot) -> bool {
        debug_assert_eq!(ticket.slot, expected);
        if ticket.slot != expected || !self.is_current(ticket) {
            tracing::debug!(
                "Dropping stale {:?} response (request #{})",
                ticket.slot,
                ticket.seq
            );
            return false;
        }
        self.committed.insert(ticket.slot, ticket.seq);
        true
    }

    /// Store a new analysis result.
    ///
    /// Interactive charts and the rendered report describe the previous text,
    /// so both are cleared.
    pub fn commit_analysis(
        &mut self,
        ticket: &Ticket,
        result: AnalysisResult,
        original_text: impl Into<String>,
    ) -> bool {
        if !self.accept(ticket, Slot::Analysis) {
            return false;
        }

        let analysis_id = derive_analysis_id(&result.visualizations);
        if analysis_id.is_none() {
            tracing::debug!("No analysis id found in visualization paths");
        }

        self.analysis = Some(AnalysisEntry {
            result,
            original_text: original_text.into(),
            analysis_id,
        });
        self.interactive = None;
        self.committed.remove(&Slot::Interactive);
        self.report = None;
        true
    }

    pub fn commit_similarity(&mut self, ticket: &Ticket, result: SimilarityResult) -> bool {
        if !self.accept(ticket, Slot::Similarity) {
            return false;
        }
        self.similarity = Some(result);
        true
    }

    pub fn commit_interactive(&mut self, ticket: &Ticket, result: InteractiveResult) -> bool {
        if !self.accept(ticket, Slot::Interactive) {
            return false;
        }
        self.interactive = Some(result);
        true
    }

    pub fn commit_parsed_file(&mut self, ticket: &Ticket, file: ParsedFile) -> bool {
        if !self.accept(ticket, Slot::ParsedFile) {
            return false;
        }
        self.parsed_file = Some(file);
        true
    }

    pub fn commit_conversion(
        &mut self,
        ticket: &Ticket,
        text: String,
        direction: ConversionDirection,
    ) -> bool {
        if !self.accept(ticket, Slot::Conversion) {
            return false;
        }
        self.conversion = Some(ConversionEntry { text, direction });
        true
    }

    /// Record a freshly rendered report, replacing the previous one
    pub fn set_report(&mut self, artifact: ReportArtifact) {
        self.report = Some(artifact);
    }

    pub fn analysis(&self) -> Option<&AnalysisEntry> {
        self.analysis.as_ref()
    }

    pub fn analysis_result(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref().map(|entry| &entry.result)
    }

    pub fn similarity(&self) -> Option<&SimilarityResult> {
        self.similarity.as_ref()
    }

    pub fn interactive(&self) -> Option<&InteractiveResult> {
        self.interactive.as_ref()
    }

    pub fn parsed_file(&self) -> Option<&ParsedFile> {
        self.parsed_file.as_ref()
    }

    pub fn conversion(&self) -> Option<&ConversionEntry> {
        self.conversion.as_ref()
    }

    pub fn report(&self) -> Option<&ReportArtifact> {
        self.report.as_ref()
    }

    /// Every visualization known to the session.
    ///
    /// Analysis charts first, then interactive, then similarity; a later
    /// source replaces an earlier entry with the same key.
    pub fn all_visualizations(&self) -> Vec<(String, String)> {
        let mut merged: Vec<(String, String)> = Vec::new();
        let sources = [
            self.analysis_result().map(|r| &r.visualizations),
            self.interactive.as_ref().map(|r| &r.visualizations),
            self.similarity.as_ref().and_then(|r| r.visualizations.as_ref()),
        ];

        for (key, url) in sources.into_iter().flatten().flatten() {
            match merged.iter_mut().find(|(k, _)| k == key) {
                Some(entry) => entry.1 = url.clone(),
                None => merged.push((key.clone(), url.clone())),
            }
        }
        merged
    }
}

/// Extract the result directory id from the word cloud path
/// (`/static/results/<id>/wordcloud.png`).
pub fn derive_analysis_id(visualizations: &VisualizationMap) -> Option<String> {
    let path = visualizations.get("wordcloud")?;
    let pattern = Regex::new(r"/static/results/([^/]+)").ok()?;
    pattern
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis_with_wordcloud(path: &str) -> AnalysisResult {
        let mut result = AnalysisResult::default();
        result
            .visualizations
            .insert("wordcloud".to_string(), path.to_string());
        result
    }

    #[test]
    fn test_empty_session() {
        let session = SessionState::new();
        assert!(session.analysis().is_none());
        assert!(session.similarity().is_none());
        assert!(session.interactive().is_none());
        assert!(session.report().is_none());
        assert!(session.all_visualizations().is_empty());
        assert!(session.started_at() <= Utc::now());
    }

    #[test]
    fn test_derive_analysis_id() {
        let result = analysis_with_wordcloud("/static/results/4f1c-77/wordcloud.png");
        assert_eq!(
            derive_analysis_id(&result.visualizations).as_deref(),
            Some("4f1c-77")
        );

        let result = analysis_with_wordcloud("/elsewhere/wordcloud.png");
        assert!(derive_analysis_id(&result.visualizations).is_none());
    }

    #[test]
    fn test_stale_response_is_dropped() {
        let mut session = SessionState::new();
        let older = session.begin(Slot::Analysis);
        let newer = session.begin(Slot::Analysis);

        assert!(session.commit_analysis(&newer, AnalysisResult::default(), "newer"));
        assert!(!session.commit_analysis(&older, AnalysisResult::default(), "older"));
        assert_eq!(session.analysis().unwrap().original_text, "newer");
    }

    #[test]
    fn test_in_order_responses_last_wins() {
        let mut session = SessionState::new();
        let first = session.begin(Slot::Similarity);
        let second = session.begin(Slot::Similarity);

        let mut a = SimilarityResult::default();
        a.labels.push("a".to_string());
        let mut b = SimilarityResult::default();
        b.labels.push("b".to_string());

        assert!(session.commit_similarity(&first, a));
        assert!(session.commit_similarity(&second, b));
        assert_eq!(session.similarity().unwrap().labels, vec!["b".to_string()]);
    }

    #[test]
    fn test_slots_are_independent() {
        let mut session = SessionState::new();
        let similarity = session.begin(Slot::Similarity);
        let analysis = session.begin(Slot::Analysis);

        assert!(session.commit_analysis(&analysis, AnalysisResult::default(), "text"));
        assert!(session.commit_similarity(&similarity, SimilarityResult::default()));
    }

    #[test]
    fn test_new_analysis_clears_interactive_and_report() {
        let mut session = SessionState::new();
        let t = session.begin(Slot::Analysis);
        session.commit_analysis(&t, AnalysisResult::default(), "one");

        let t = session.begin(Slot::Interactive);
        assert!(session.commit_interactive(&t, InteractiveResult::default()));
        session.set_report(ReportArtifact {
            report_id: "r1".to_string(),
            view_url: "http://x/static/results/r1/report.html".to_string(),
            download_name: "report.html".to_string(),
        });

        let t = session.begin(Slot::Analysis);
        session.commit_analysis(&t, AnalysisResult::default(), "two");
        assert!(session.interactive().is_none());
        assert!(session.report().is_none());
    }

    #[test]
    fn test_interactive_for_replaced_analysis_is_dropped() {
        let mut session = SessionState::new();
        let t = session.begin(Slot::Analysis);
        session.commit_analysis(&t, AnalysisResult::default(), "one");

        let interactive = session.begin(Slot::Interactive);

        let t = session.begin(Slot::Analysis);
        session.commit_analysis(&t, AnalysisResult::default(), "two");

        assert!(!session.commit_interactive(&interactive, InteractiveResult::default()));
        assert!(session.interactive().is_none());
    }

    #[test]
    fn test_all_visualizations_merge_order() {
        let mut session = SessionState::new();

        let mut analysis = analysis_with_wordcloud("/static/results/a/wordcloud.png");
        analysis
            .visualizations
            .insert("sentiment".to_string(), "/static/results/a/sentiment.png".to_string());
        let t = session.begin(Slot::Analysis);
        session.commit_analysis(&t, analysis, "text");

        let mut interactive = InteractiveResult::default();
        interactive
            .visualizations
            .insert("treemap".to_string(), "/static/results/a/treemap.html".to_string());
        let t = session.begin(Slot::Interactive);
        session.commit_interactive(&t, interactive);

        let mut similarity = SimilarityResult::default();
        let mut viz = VisualizationMap::new();
        viz.insert("wordcloud".to_string(), "/static/results/s/override.png".to_string());
        viz.insert(
            "similarity_heatmap".to_string(),
            "/static/results/s/similarity_heatmap.png".to_string(),
        );
        similarity.visualizations = Some(viz);
        let t = session.begin(Slot::Similarity);
        session.commit_similarity(&t, similarity);

        let keys: Vec<_> = session
            .all_visualizations()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        assert_eq!(
            keys,
            vec![
                "sentiment=/static/results/a/sentiment.png",
                "wordcloud=/static/results/s/override.png",
                "treemap=/static/results/a/treemap.html",
                "similarity_heatmap=/static/results/s/similarity_heatmap.png",
            ]
        );
    }
}
