use serde::Serialize;
use std::path::PathBuf;

use crate::matcher::SequenceOutcome;
use crate::ocr::RecognizedText;

const SUMMARY_PREVIEW: usize = 5;

/// Published view of the scan loop. Only the scan loop and its controller
/// write it; observers get clones through a watch channel.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanRunState {
    /// Gates publication: a cycle finishing after stop never lands here.
    pub is_scanning: bool,
    pub last_results: Vec<RecognizedText>,
    pub last_summary: String,
    pub cycle_count: u64,
    pub last_click: Option<SequenceOutcome>,
    pub artifact_dir: Option<PathBuf>,
    pub last_artifact: Option<PathBuf>,
}

impl ScanRunState {
    /// Replaces the previous cycle's results wholesale.
    pub(crate) fn record_results(&mut self, results: Vec<RecognizedText>) {
        self.last_summary = summarize(&results);
        self.last_results = results;
    }
}

/// One-line description of a result set, e.g.
/// `recognized 3 text regions: 确定, 开始, 继续`.
pub fn summarize(results: &[RecognizedText]) -> String {
    if results.is_empty() {
        return "no text recognized".to_string();
    }

    let preview: Vec<&str> = results
        .iter()
        .take(SUMMARY_PREVIEW)
        .map(|item| item.text.as_str())
        .collect();
    let more = results.len().saturating_sub(SUMMARY_PREVIEW);
    let suffix = if more > 0 {
        format!(" (+{more} more)")
    } else {
        String::new()
    };

    format!(
        "recognized {} text regions: {}{}",
        results.len(),
        preview.join(", "),
        suffix
    )
}
