//! Merging per-region recognition results into one text block

use crate::vision::Region;

/// Text recognized inside one region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionResult {
    pub region: Region,
    pub text: String,
    /// Engine confidence in [0, 1], if reported
    pub confidence: Option<f64>,
}

/// Final output of a recognition run
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedResult {
    pub text: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

/// Sort results by (row, col) and join their text
///
/// Regions on the same row are separated by a tab, rows by a newline.
/// Regions whose trimmed text is empty are skipped and do not count toward
/// the mean confidence; a missing confidence counts as 0.
pub fn fuse(mut results: Vec<RegionResult>) -> CombinedResult {
    results.sort_by_key(|r| (r.region.row, r.region.col));

    let mut text = String::new();
    let mut current_row: Option<u32> = None;
    let mut confidence_sum = 0.0;
    let mut contributing = 0usize;

    for result in &results {
        let trimmed = result.text.trim();
        if trimmed.is_empty() {
            continue;
        }

        match current_row {
            Some(row) if row == result.region.row => text.push('\t'),
            Some(_) => text.push('\n'),
            None => {}
        }
        current_row = Some(result.region.row);
        text.push_str(trimmed);

        confidence_sum += result.confidence.unwrap_or(0.0);
        contributing += 1;
    }

    let confidence = if contributing == 0 {
        0.0
    } else {
        confidence_sum / contributing as f64
    };

    CombinedResult { text, confidence }
}
