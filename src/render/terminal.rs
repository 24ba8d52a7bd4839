//! Plain-text drawing of the view models

use super::{
    AnalysisView, Band, BarTable, CapabilityReport, EntityList, FilePreview, PreviewChecklist,
    SentimentCard, SimilarityMatrixView, StatsBadges,
};
use std::fmt;

const BAR_WIDTH: usize = 24;

fn bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(filled.min(BAR_WIDTH))
}

impl fmt::Display for BarTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {:<16} {}", "項目", self.value_header)?;
        for row in &self.rows {
            writeln!(
                f,
                "  {:<16} {:<width$} {}",
                row.label,
                bar(row.percent),
                row.display,
                width = BAR_WIDTH
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for EntityList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.groups.is_empty() {
            return writeln!(f, "  未檢測到命名實體");
        }
        for group in &self.groups {
            writeln!(
                f,
                "  {} ({}): {}",
                group.kind.display_name(),
                group.items.len(),
                group.items.join("、")
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for SentimentCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {} {}", self.tone.glyph(), self.tone.text())?;
        writeln!(f, "  正面詞數: {}", self.positive_count)?;
        writeln!(f, "  負面詞數: {}", self.negative_count)
    }
}

fn band_marker(band: Band) -> char {
    match band {
        Band::Success => '●',
        Band::Warning => '◕',
        Band::Info => '◑',
        Band::Light => '○',
    }
}

impl fmt::Display for SimilarityMatrixView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, header) in self.headers.iter().enumerate() {
            writeln!(f, "  [{}] {}", i + 1, header)?;
        }
        write!(f, "  {:>4}", "")?;
        for i in 0..self.headers.len() {
            write!(f, " {:>7}", format!("[{}]", i + 1))?;
        }
        writeln!(f)?;
        for (i, row) in self.rows.iter().enumerate() {
            write!(f, "  {:>4}", format!("[{}]", i + 1))?;
            for cell in &row.cells {
                write!(f, " {} {}", band_marker(cell.band), cell.text)?;
            }
            writeln!(f, "  {}", row.label)?;
        }
        Ok(())
    }
}

impl fmt::Display for StatsBadges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(total) = self.total_words {
            parts.push(format!("總詞數: {}", total));
        }
        if let Some(avg) = self.avg_word_length {
            parts.push(format!("平均詞長: {}", avg));
        }
        if let Some(sentiment) = self.sentiment {
            parts.push(format!("情感: {}", sentiment));
        }
        writeln!(f, "  {}", parts.join(" | "))
    }
}

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "\n{}", title)?;
    writeln!(f, "{}", "-".repeat(title.chars().count() * 2))
}

impl fmt::Display for AnalysisView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "分析結果")?;
        writeln!(f, "========")?;
        write!(f, "{}", self.badges)?;

        if let Some(table) = &self.word_frequency {
            section(f, "詞頻統計")?;
            write!(f, "{}", table)?;
        }
        if let Some(table) = &self.pos_distribution {
            section(f, "詞性分布")?;
            write!(f, "{}", table)?;
        }
        if let Some(entities) = &self.entities {
            section(f, "命名實體")?;
            write!(f, "{}", entities)?;
        }
        if let Some(card) = &self.sentiment {
            section(f, "情感分析")?;
            write!(f, "{}", card)?;
        }
        if let Some(table) = &self.keywords {
            section(f, "關鍵詞")?;
            write!(f, "{}", table)?;
        }
        if let Some(table) = &self.ngrams {
            section(f, "常見詞組")?;
            write!(f, "{}", table)?;
        }
        if !self.visualizations.is_empty() {
            section(f, "圖表")?;
            for (kind, url) in &self.visualizations {
                writeln!(f, "  {:<24} {}", kind, url)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for CapabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "系統功能狀態")?;
        for (name, available) in &self.features {
            let status = if *available { "✅ 可用" } else { "❌ 不可用" };
            writeln!(f, "  {}: {}", name, status)?;
        }
        if !self.supported_formats.is_empty() {
            writeln!(f, "  支持的文件格式: {}", self.supported_formats.join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Display for FilePreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "文件名: {}", self.filename)?;
        writeln!(f, "內容長度: {} 字符", self.char_count)?;
        for (key, value) in &self.metadata {
            writeln!(f, "{}: {}", key, value)?;
        }
        writeln!(f, "\n解析的內容預覽:")?;
        writeln!(f, "{}", self.preview)
    }
}

impl fmt::Display for PreviewChecklist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        for (name, available) in &self.items {
            let mark = if *available { "✓" } else { "·" };
            writeln!(f, "  {} {}", mark, name)?;
        }
        Ok(())
    }
}
