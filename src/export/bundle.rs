//! Visualization bundles
//!
//! One requested chart is saved as-is. Several are fetched concurrently and
//! packed into a single ZIP once every fetch has settled; a failed fetch
//! only drops its own entry.

use super::DownloadSink;
use crate::client::AnalysisBackend;
use crate::error::{Result, TextlensError};
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinSet;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const VISUALIZATIONS_ARCHIVE: &str = "chinese_text_analysis_visualizations.zip";
pub const ALL_VISUALIZATIONS_ARCHIVE: &str = "chinese_text_analysis_all_visualizations.zip";

/// Key of the raw-result link, never bundled
pub const RESULTS_JSON_KEY: &str = "results_json";

const BASIC_KEYS: [&str; 5] = [
    "wordcloud",
    "word_frequency",
    "pos_distribution",
    "sentiment",
    "entities",
];

const ADVANCED_KEYS: [&str; 5] = [
    "word_frequency_vertical",
    "word_frequency_pie",
    "keywords",
    "ngrams",
    "word_by_length",
];

/// Named sets of charts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundlePreset {
    Basic,
    Advanced,
    /// Every chart the session knows about
    All,
}

impl BundlePreset {
    /// Fixed keys of the preset; `All` is resolved from the session instead
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            BundlePreset::Basic => &BASIC_KEYS,
            BundlePreset::Advanced => &ADVANCED_KEYS,
            BundlePreset::All => &[],
        }
    }

    pub fn archive_name(self) -> &'static str {
        match self {
            BundlePreset::Basic | BundlePreset::Advanced => VISUALIZATIONS_ARCHIVE,
            BundlePreset::All => ALL_VISUALIZATIONS_ARCHIVE,
        }
    }
}

impl FromStr for BundlePreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(BundlePreset::Basic),
            "advanced" => Ok(BundlePreset::Advanced),
            "all" => Ok(BundlePreset::All),
            other => Err(format!(
                "unknown bundle '{}' (expected basic, advanced or all)",
                other
            )),
        }
    }
}

/// `html` for interactive pages, `png` for everything else
pub fn extension_for(url: &str) -> &'static str {
    if url.contains(".html") {
        "html"
    } else {
        "png"
    }
}

/// File name for a chart; only the last path component of the key is used
fn entry_name(key: &str, url: &str) -> String {
    let stem = key
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or("chart");
    format!("{}.{}", stem, extension_for(url))
}

/// What a bundle request produced
#[derive(Debug, Clone, PartialEq)]
pub enum BundleOutcome {
    /// A single chart saved directly
    Single { path: PathBuf },
    /// One archive holding every chart that could be fetched
    Archive {
        path: PathBuf,
        entries: Vec<String>,
        attempted: usize,
        requested: usize,
    },
}

impl BundleOutcome {
    pub fn path(&self) -> &PathBuf {
        match self {
            BundleOutcome::Single { path } | BundleOutcome::Archive { path, .. } => path,
        }
    }
}

pub struct BundleExporter {
    backend: Arc<dyn AnalysisBackend>,
}

impl BundleExporter {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Self {
        Self { backend }
    }

    /// Download the requested charts.
    ///
    /// `items` pairs each requested key with its URL, `None` when the session
    /// has no such chart. Order is kept inside the archive.
    pub async fn export(
        &self,
        items: &[(String, Option<String>)],
        archive_name: &str,
        sink: &dyn DownloadSink,
    ) -> Result<BundleOutcome> {
        match items {
            [] => Err(TextlensError::invalid_input("無圖表可下載")),
            [(key, url)] => {
                let url = url
                    .as_deref()
                    .ok_or_else(|| TextlensError::invalid_input(format!("沒有可下載的圖表: {}", key)))?;
                let bytes = self.backend.fetch_bytes(url).await?;
                let path = sink.save(&entry_name(key, url), &bytes)?;
                Ok(BundleOutcome::Single { path })
            }
            _ => self.archive(items, archive_name, sink).await,
        }
    }

    async fn archive(
        &self,
        items: &[(String, Option<String>)],
        archive_name: &str,
        sink: &dyn DownloadSink,
    ) -> Result<BundleOutcome> {
        let mut fetched: Vec<Option<(String, Vec<u8>)>> = vec![None; items.len()];
        let mut tasks = JoinSet::new();

        for (index, (key, url)) in items.iter().enumerate() {
            let Some(url) = url.clone() else {
                tracing::debug!("No URL for '{}', skipping", key);
                continue;
            };
            let backend = Arc::clone(&self.backend);
            let name = entry_name(key, &url);
            tasks.spawn(async move {
                let result = backend.fetch_bytes(&url).await;
                (index, name, result)
            });
        }

        let attempted = tasks.len();
        let mut settled = 0;
        while let Some(joined) = tasks.join_next().await {
            settled += 1;
            match joined {
                Ok((index, name, Ok(bytes))) => {
                    tracing::debug!("Fetched {} ({}/{})", name, settled, attempted);
                    fetched[index] = Some((name, bytes));
                }
                Ok((_, name, Err(e))) => {
                    tracing::warn!("Failed to download {}: {}", name, e);
                }
                Err(e) => {
                    tracing::warn!("Download task failed: {}", e);
                }
            }
        }

        let entries: Vec<(String, Vec<u8>)> = fetched.into_iter().flatten().collect();
        let names = entries.iter().map(|(name, _)| name.clone()).collect();
        let bytes = build_zip(&entries)?;
        let path = sink.save(archive_name, &bytes)?;

        tracing::info!(
            "Bundled {} of {} requested charts into {}",
            entries.len(),
            items.len(),
            archive_name
        );

        Ok(BundleOutcome::Archive {
            path,
            entries: names,
            attempted,
            requested: items.len(),
        })
    }
}

/// Pack named files into an in-memory ZIP
pub fn build_zip(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(bytes).map_err(|e| TextlensError::Io {
            source: e,
            context: format!("Failed to add {} to archive", name),
        })?;
    }

    Ok(writer.finish()?.into_inner())
}
