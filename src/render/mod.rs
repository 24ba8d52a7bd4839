//! Render pipeline
//!
//! Pure projections from cached results to view models. Nothing in here
//! performs I/O; `terminal` draws the view models as text.

mod terminal;

use crate::config::RenderConfig;
use crate::models::{
    AnalysisResult, Capabilities, InteractiveResult, ParsedFile, Sentiment, SimilarityResult,
};
use std::collections::BTreeMap;

/// Characters of parsed file content shown in the preview
pub const FILE_PREVIEW_CHARS: usize = 500;

/// One row of a frequency or weight table
#[derive(Debug, Clone, PartialEq)]
pub struct BarRow {
    pub label: String,
    pub value: f64,
    /// Value as it should be printed
    pub display: String,
    /// Bar width in percent of the largest visible value
    pub percent: f64,
}

/// Sorted, truncated table with proportional bars
#[derive(Debug, Clone, PartialEq)]
pub struct BarTable {
    pub value_header: &'static str,
    pub rows: Vec<BarRow>,
}

impl BarTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Count table: sorted by count descending, at most `limit` rows.
pub fn frequency_table(data: &BTreeMap<String, u64>, limit: usize) -> BarTable {
    let entries = data
        .iter()
        .map(|(label, &count)| (label.clone(), count as f64, count.to_string()))
        .collect();
    bar_table(entries, limit, "頻率")
}

/// Weight table: like [`frequency_table`] but values print with 3 decimals.
pub fn weighted_table(data: &BTreeMap<String, f64>, limit: usize) -> BarTable {
    let entries = data
        .iter()
        .map(|(label, &weight)| (label.clone(), weight, format!("{:.3}", weight)))
        .collect();
    bar_table(entries, limit, "權重")
}

// Bars are scaled to the top value of the visible slice, not of the whole map.
fn bar_table(
    mut entries: Vec<(String, f64, String)>,
    limit: usize,
    value_header: &'static str,
) -> BarTable {
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries.truncate(limit);

    let max = entries.first().map(|e| e.1).unwrap_or(0.0);
    let rows = entries
        .into_iter()
        .map(|(label, value, display)| BarRow {
            percent: if max > 0.0 { value / max * 100.0 } else { 0.0 },
            label,
            value,
            display,
        })
        .collect();

    BarTable { value_header, rows }
}

/// Named entity category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    Person,
    Location,
    Organization,
    Other(String),
}

impl EntityKind {
    pub fn from_key(key: &str) -> Self {
        match key {
            "person" => EntityKind::Person,
            "location" => EntityKind::Location,
            "organization" => EntityKind::Organization,
            other => EntityKind::Other(other.to_string()),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            EntityKind::Person => "人名",
            EntityKind::Location => "地名",
            EntityKind::Organization => "機構名",
            EntityKind::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityGroup {
    pub kind: EntityKind,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityList {
    pub groups: Vec<EntityGroup>,
}

/// Group entities by type, skipping empty groups
pub fn entity_list(entities: &BTreeMap<String, Vec<String>>) -> EntityList {
    let groups = entities
        .iter()
        .filter(|(_, items)| !items.is_empty())
        .map(|(kind, items)| EntityGroup {
            kind: EntityKind::from_key(kind),
            items: items.clone(),
        })
        .collect();
    EntityList { groups }
}

/// Overall sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

impl Tone {
    /// Missing or unrecognized labels are neutral
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some("positive") => Tone::Positive,
            Some("negative") => Tone::Negative,
            _ => Tone::Neutral,
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Tone::Positive => "正面",
            Tone::Negative => "負面",
            Tone::Neutral => "中性",
        }
    }

    /// Terminal glyph for the tone
    pub fn glyph(self) -> &'static str {
        match self {
            Tone::Positive => ":)",
            Tone::Negative => ":(",
            Tone::Neutral => ":|",
        }
    }
}

/// Label text used in statistics; unlike the card, unknown stays unknown
pub fn sentiment_label_text(label: Option<&str>) -> &'static str {
    match label {
        Some("positive") => "正面",
        Some("negative") => "負面",
        Some("neutral") => "中性",
        _ => "未知",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentCard {
    pub tone: Tone,
    pub positive_count: u64,
    pub negative_count: u64,
}

pub fn sentiment_card(sentiment: &Sentiment) -> SentimentCard {
    SentimentCard {
        tone: Tone::from_label(sentiment.sentiment_label.as_deref()),
        positive_count: sentiment.positive_count,
        negative_count: sentiment.negative_count,
    }
}

/// Colour band of a similarity score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Success,
    Warning,
    Info,
    Light,
}

impl Band {
    pub fn for_score(score: f64) -> Self {
        if score > 0.8 {
            Band::Success
        } else if score > 0.6 {
            Band::Warning
        } else if score > 0.4 {
            Band::Info
        } else {
            Band::Light
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixCell {
    pub text: String,
    pub band: Band,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow {
    pub label: String,
    pub cells: Vec<MatrixCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrixView {
    pub headers: Vec<String>,
    pub rows: Vec<MatrixRow>,
}

/// Cut a label to `width` characters, marking the cut with "..."
pub fn truncate_label(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        label.to_string()
    } else {
        let head: String = label.chars().take(width).collect();
        format!("{}...", head)
    }
}

pub fn similarity_matrix(result: &SimilarityResult, label_width: usize) -> SimilarityMatrixView {
    let headers = result
        .labels
        .iter()
        .map(|label| truncate_label(label, label_width))
        .collect();

    let rows = result
        .similarity_matrix
        .iter()
        .enumerate()
        .map(|(i, row)| MatrixRow {
            label: result
                .labels
                .get(i)
                .map(|label| truncate_label(label, label_width))
                .unwrap_or_default(),
            cells: row
                .iter()
                .map(|&score| MatrixCell {
                    text: format!("{:.3}", score),
                    band: Band::for_score(score),
                })
                .collect(),
        })
        .collect();

    SimilarityMatrixView { headers, rows }
}

/// Summary badges shown above the analysis
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsBadges {
    pub total_words: Option<u64>,
    pub avg_word_length: Option<f64>,
    pub sentiment: Option<&'static str>,
}

pub fn stats_badges(result: &AnalysisResult) -> StatsBadges {
    StatsBadges {
        total_words: result.total_words,
        avg_word_length: result.avg_word_length,
        sentiment: result
            .sentiment
            .as_ref()
            .and_then(|s| s.sentiment_label.as_deref())
            .map(|label| sentiment_label_text(Some(label))),
    }
}

/// Key figures listed at the top of a comprehensive report
pub fn report_stats(result: &AnalysisResult) -> Vec<(&'static str, String)> {
    let sentiment = result.sentiment.as_ref();
    vec![
        ("總詞數", result.total_words.unwrap_or(0).to_string()),
        (
            "平均詞長",
            result
                .avg_word_length
                .map(|v| v.to_string())
                .unwrap_or_else(|| "0".to_string()),
        ),
        (
            "情感傾向",
            sentiment_label_text(sentiment.and_then(|s| s.sentiment_label.as_deref())).to_string(),
        ),
        (
            "正面詞數量",
            sentiment.map(|s| s.positive_count).unwrap_or(0).to_string(),
        ),
        (
            "負面詞數量",
            sentiment.map(|s| s.negative_count).unwrap_or(0).to_string(),
        ),
    ]
}

/// Full projection of an analysis; empty sections are `None`
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisView {
    pub badges: StatsBadges,
    pub word_frequency: Option<BarTable>,
    pub pos_distribution: Option<BarTable>,
    pub entities: Option<EntityList>,
    pub sentiment: Option<SentimentCard>,
    pub keywords: Option<BarTable>,
    pub ngrams: Option<BarTable>,
    pub visualizations: Vec<(String, String)>,
}

fn non_empty(table: BarTable) -> Option<BarTable> {
    (!table.is_empty()).then_some(table)
}

pub fn analysis_view(result: &AnalysisResult, config: &RenderConfig) -> AnalysisView {
    AnalysisView {
        badges: stats_badges(result),
        word_frequency: non_empty(frequency_table(
            &result.word_frequency,
            config.word_frequency_limit,
        )),
        pos_distribution: non_empty(frequency_table(&result.pos_distribution, config.pos_limit)),
        entities: (!result.entities.is_empty()).then(|| entity_list(&result.entities)),
        sentiment: result.sentiment.as_ref().map(sentiment_card),
        keywords: non_empty(weighted_table(&result.keywords, config.keyword_limit)),
        ngrams: non_empty(frequency_table(&result.ngrams, config.ngram_limit)),
        visualizations: result
            .visualizations
            .iter()
            .filter(|(key, _)| key.as_str() != "results_json")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

/// Feature availability reported by the service
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityReport {
    pub features: Vec<(&'static str, bool)>,
    pub supported_formats: Vec<String>,
}

pub fn capability_report(caps: &Capabilities) -> CapabilityReport {
    CapabilityReport {
        features: vec![
            ("相似度分析", caps.similarity_analysis),
            ("高級視覺化", caps.advanced_visualization),
            ("任務隊列", caps.task_queue),
            ("文件解析", caps.file_parsing),
            ("GPU 加速", caps.gpu_acceleration),
        ],
        supported_formats: caps.supported_formats.clone(),
    }
}

/// Summary of a parsed upload
#[derive(Debug, Clone, PartialEq)]
pub struct FilePreview {
    pub filename: String,
    pub char_count: usize,
    pub metadata: Vec<(String, String)>,
    pub preview: String,
}

pub fn file_preview(file: &ParsedFile) -> FilePreview {
    let char_count = file.content.chars().count();
    let mut preview: String = file.content.chars().take(FILE_PREVIEW_CHARS).collect();
    if char_count > FILE_PREVIEW_CHARS {
        preview.push_str("...");
    }

    FilePreview {
        filename: file.filename.clone(),
        char_count,
        metadata: file
            .metadata
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect(),
        preview,
    }
}

/// Availability checklist for a group of report sections
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewChecklist {
    pub title: &'static str,
    pub items: Vec<(&'static str, bool)>,
}

/// Checklists of what the next comprehensive report will contain.
///
/// A group is only listed once its source result exists.
pub fn report_previews(
    interactive: Option<&InteractiveResult>,
    similarity: Option<&SimilarityResult>,
) -> Vec<PreviewChecklist> {
    let mut previews = Vec::new();
    let similarity_viz = similarity.and_then(|s| s.visualizations.as_ref());
    let has_viz = |key: &str| {
        interactive.is_some_and(|r| r.visualizations.contains_key(key))
            || similarity_viz.is_some_and(|v| v.contains_key(key))
    };

    let interactive_present = interactive.is_some()
        || similarity_viz.is_some_and(|v| {
            v.contains_key("interactive_heatmap") || v.contains_key("interactive_network")
        });
    if interactive_present {
        previews.push(PreviewChecklist {
            title: "交互式圖表",
            items: vec![
                ("交互式熱力圖", has_viz("interactive_heatmap")),
                ("交互式網絡圖", has_viz("interactive_network")),
                ("詞頻樹狀圖", has_viz("treemap")),
                ("綜合分析儀表板", has_viz("dashboard")),
            ],
        });
    }

    if let Some(result) = similarity {
        let viz = |key: &str| similarity_viz.is_some_and(|v| v.contains_key(key));
        previews.push(PreviewChecklist {
            title: "相似度分析",
            items: vec![
                ("相似度熱力圖", viz("similarity_heatmap")),
                ("相似度網絡圖", viz("similarity_network")),
                ("相似度矩陣", !result.similarity_matrix.is_empty()),
            ],
        });
    }

    previews
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_frequency_table_sorted_and_truncated() {
        let data = counts(&[("天氣", 5), ("陽光", 9), ("出門", 2), ("遊玩", 7)]);
        let table = frequency_table(&data, 3);

        let labels: Vec<_> = table.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["陽光", "遊玩", "天氣"]);
        assert_eq!(table.value_header, "頻率");
    }

    #[test]
    fn test_bars_relative_to_visible_slice() {
        let data = counts(&[("a", 100), ("b", 40), ("c", 20), ("d", 10)]);
        // Full table: b is 40% of a
        let full = frequency_table(&data, 4);
        assert_eq!(full.rows[0].percent, 100.0);
        assert_eq!(full.rows[1].percent, 40.0);

        // Limit 1 keeps only the top row, which is always 100%
        let top = frequency_table(&data, 1);
        assert_eq!(top.rows.len(), 1);
        assert_eq!(top.rows[0].percent, 100.0);
        assert!(full.rows.iter().all(|r| r.percent <= 100.0));
    }

    #[test]
    fn test_zero_values_have_no_bar() {
        let data = counts(&[("a", 0), ("b", 0)]);
        let table = frequency_table(&data, 10);
        assert!(table.rows.iter().all(|r| r.percent == 0.0));
    }

    #[test]
    fn test_weighted_table_three_decimals() {
        let mut data = BTreeMap::new();
        data.insert("天氣".to_string(), 0.5);
        data.insert("陽光".to_string(), 0.25);
        let table = weighted_table(&data, 20);

        assert_eq!(table.rows[0].display, "0.500");
        assert_eq!(table.rows[1].display, "0.250");
        assert_eq!(table.rows[1].percent, 50.0);
        assert_eq!(table.value_header, "權重");
    }

    #[test]
    fn test_entity_list_skips_empty_and_keeps_unknown() {
        let mut entities = BTreeMap::new();
        entities.insert("person".to_string(), vec!["王小明".to_string()]);
        entities.insert("location".to_string(), vec![]);
        entities.insert("time".to_string(), vec!["明天".to_string()]);

        let list = entity_list(&entities);
        assert_eq!(list.groups.len(), 2);
        assert_eq!(list.groups[0].kind, EntityKind::Person);
        assert_eq!(list.groups[0].kind.display_name(), "人名");
        assert_eq!(list.groups[1].kind, EntityKind::Other("time".to_string()));
        assert_eq!(list.groups[1].kind.display_name(), "time");
    }

    #[test]
    fn test_sentiment_defaults_to_neutral() {
        assert_eq!(Tone::from_label(Some("positive")), Tone::Positive);
        assert_eq!(Tone::from_label(Some("negative")), Tone::Negative);
        assert_eq!(Tone::from_label(Some("ecstatic")), Tone::Neutral);
        assert_eq!(Tone::from_label(None), Tone::Neutral);

        let card = sentiment_card(&Sentiment::default());
        assert_eq!(card.tone, Tone::Neutral);
    }

    #[test]
    fn test_similarity_matrix_rendering() {
        let result = SimilarityResult {
            similarity_matrix: vec![
                vec![1.0, 0.723456, 0.31],
                vec![0.723456, 1.0, 0.45],
                vec![0.31, 0.45, 1.0],
            ],
            labels: vec![
                "今天天氣很好".to_string(),
                "今日天候良好".to_string(),
                "明天會下雨".to_string(),
            ],
            ..Default::default()
        };

        let view = similarity_matrix(&result, 20);
        assert_eq!(view.headers.len(), 3);
        assert_eq!(view.rows.len(), 3);
        assert_eq!(view.rows[0].cells[1].text, "0.723");
        assert_eq!(view.rows[0].cells[0].text, "1.000");
        assert_eq!(view.rows[0].cells[0].band, Band::Success);
        assert_eq!(view.rows[0].cells[1].band, Band::Warning);
        assert_eq!(view.rows[1].cells[2].band, Band::Info);
        assert_eq!(view.rows[0].cells[2].band, Band::Light);
    }

    #[test]
    fn test_band_thresholds_are_exclusive() {
        assert_eq!(Band::for_score(0.8), Band::Warning);
        assert_eq!(Band::for_score(0.6), Band::Info);
        assert_eq!(Band::for_score(0.4), Band::Light);
        assert_eq!(Band::for_score(0.81), Band::Success);
    }

    #[test]
    fn test_truncate_label_counts_characters() {
        let label = "今天天氣很好，陽光明媚，適合出門遊玩。我們去公園吧";
        let cut = truncate_label(label, 20);
        assert_eq!(cut.chars().count(), 23);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate_label("短句", 20), "短句");
    }

    #[test]
    fn test_analysis_view_hides_empty_sections() {
        let view = analysis_view(&AnalysisResult::default(), &crate::config::Config::default().render);
        assert!(view.word_frequency.is_none());
        assert!(view.entities.is_none());
        assert!(view.sentiment.is_none());
        assert!(view.keywords.is_none());
        assert!(view.visualizations.is_empty());
    }

    #[test]
    fn test_report_stats_unknown_sentiment() {
        let stats = report_stats(&AnalysisResult::default());
        assert_eq!(stats[0], ("總詞數", "0".to_string()));
        assert_eq!(stats[2], ("情感傾向", "未知".to_string()));
    }

    #[test]
    fn test_file_preview_truncates() {
        let file = ParsedFile {
            filename: "notes.txt".to_string(),
            content: "字".repeat(600),
            metadata: BTreeMap::new(),
        };
        let preview = file_preview(&file);
        assert_eq!(preview.char_count, 600);
        assert_eq!(preview.preview.chars().count(), FILE_PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_report_previews() {
        assert!(report_previews(None, None).is_empty());

        let mut interactive = InteractiveResult::default();
        interactive
            .visualizations
            .insert("treemap".to_string(), "/static/results/a/treemap.html".to_string());
        let previews = report_previews(Some(&interactive), None);
        assert_eq!(previews.len(), 1);
        assert_eq!(previews[0].items[2], ("詞頻樹狀圖", true));
        assert_eq!(previews[0].items[0], ("交互式熱力圖", false));
    }
}
