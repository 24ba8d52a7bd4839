//! Downloadable artifacts
//!
//! Everything the user can save ends up in a [`DownloadSink`]. The default
//! sink writes into the configured output directory.

pub mod bundle;

pub use bundle::{extension_for, BundleExporter, BundleOutcome, BundlePreset};

use crate::error::{Result, TextlensError};
use crate::models::AnalysisResult;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

pub const JSON_EXPORT_NAME: &str = "chinese_text_analysis.json";
pub const CSV_EXPORT_NAME: &str = "chinese_text_word_frequency.csv";
const CSV_HEADER: &str = "詞語,頻率";

/// Destination for downloaded files
pub trait DownloadSink: Send + Sync {
    /// Store `bytes` under `name` and return where it went
    fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes downloads into a directory, creating it on first use
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

}

/// A download name must be a single plain file name
fn check_file_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains('\\') => Ok(()),
        _ => Err(TextlensError::invalid_input(format!(
            "Refusing to save outside the output directory: {}",
            name
        ))),
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        check_file_name(name)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| TextlensError::Io {
            source: e,
            context: format!("Failed to create output directory: {}", self.dir.display()),
        })?;

        let path = self.dir.join(name);
        std::fs::write(&path, bytes).map_err(|e| TextlensError::Io {
            source: e,
            context: format!("Failed to write download: {}", path.display()),
        })?;

        tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }
}

/// Keeps downloads in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every saved file, in save order
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files
            .lock()
            .map(|files| files.clone())
            .unwrap_or_default()
    }

    pub fn names(&self) -> Vec<String> {
        self.files().into_iter().map(|(name, _)| name).collect()
    }
}

impl DownloadSink for MemorySink {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let mut files = self
            .files
            .lock()
            .map_err(|_| TextlensError::Other(anyhow::anyhow!("memory sink lock poisoned")))?;
        files.push((name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(name))
    }
}

/// The full analysis result, pretty-printed
pub fn analysis_json(result: &AnalysisResult) -> Result<String> {
    serde_json::to_string_pretty(result).map_err(|e| TextlensError::Json {
        source: e,
        context: "Failed to serialize analysis result".to_string(),
    })
}

/// Word frequencies as CSV, most frequent first
pub fn word_frequency_csv(result: &AnalysisResult) -> String {
    let mut rows: Vec<(&String, &u64)> = result.word_frequency.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1));

    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for (word, freq) in rows {
        csv.push_str(&format!("\"{}\",{}\n", word.replace('"', "\"\""), freq));
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_result() -> AnalysisResult {
        let mut result = AnalysisResult::default();
        result.word_frequency.insert("陽光".to_string(), 2);
        result.word_frequency.insert("天氣".to_string(), 5);
        result.word_frequency.insert("say \"hi\"".to_string(), 3);
        result.total_words = Some(10);
        result
    }

    #[test]
    fn test_csv_layout() {
        let csv = word_frequency_csv(&sample_result());
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "詞語,頻率");
        assert_eq!(lines[1], "\"天氣\",5");
        assert_eq!(lines[2], "\"say \"\"hi\"\"\",3");
        assert_eq!(lines[3], "\"陽光\",2");
    }

    #[test]
    fn test_csv_without_frequencies() {
        assert_eq!(word_frequency_csv(&AnalysisResult::default()), "詞語,頻率\n");
    }

    #[test]
    fn test_json_parses_back() {
        let result = sample_result();
        let json = analysis_json(&result).unwrap();
        assert!(json.contains("\n  \""));

        let parsed: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_directory_sink_creates_dir() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path().join("nested/downloads"));

        let path = sink.save("out.txt", "繁體".as_bytes()).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "繁體");
    }

    #[test]
    fn test_directory_sink_rejects_paths() {
        let temp = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp.path().join("downloads"));

        for name in ["../escaped.png", "sub/a.png", "/tmp/a.png", "..", "a\\b.png", ""] {
            let err = sink.save(name, b"x").unwrap_err();
            assert!(matches!(err, TextlensError::InvalidInput(_)), "{}", name);
        }
        assert!(!temp.path().join("escaped.png").exists());
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.save("a", b"1").unwrap();
        sink.save("b", b"2").unwrap();
        assert_eq!(sink.names(), vec!["a".to_string(), "b".to_string()]);
    }
}
