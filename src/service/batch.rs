use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::models::FilterCriteria;
use crate::service::assemble;
use crate::service::pipeline::ReportRun;

/// Paths of the three artifacts written by one batch run.
#[derive(Debug)]
pub struct ArtifactPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub document: PathBuf,
}

/// Filename suffix of a batch run: the order-date range when both bounds
/// are set, otherwise today's date.
pub fn artifact_suffix(criteria: &FilterCriteria) -> String {
    match (criteria.order_date_start, criteria.order_date_end) {
        (Some(s), Some(e)) => format!("{}_to_{}", s.format("%Y%m%d"), e.format("%Y%m%d")),
        _ => chrono::Local::now().format("%Y%m%d").to_string(),
    }
}

/// Write the JSON, CSV and document artifacts for one finished run under
/// `dir`, creating the directory if needed.
pub fn write_artifacts(run: &ReportRun, dir: &Path) -> Result<ArtifactPaths, ReportError> {
    std::fs::create_dir_all(dir)?;
    let suffix = artifact_suffix(&run.criteria);

    let json = dir.join(format!("sales_report_{suffix}.json"));
    std::fs::write(&json, serde_json::to_string_pretty(&assemble::structured(run))?)?;

    let csv = dir.join(format!("sales_report_{suffix}.csv"));
    std::fs::write(&csv, assemble::to_csv(run)?)?;

    let document = dir.join(format!("sales_report_{suffix}.txt"));
    std::fs::write(&document, assemble::to_document(run))?;

    Ok(ArtifactPaths {
        json,
        csv,
        document,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    #[test]
    fn suffix_uses_the_range_when_both_bounds_are_set() {
        let criteria = FilterCriteria {
            order_date_start: NaiveDate::from_str("2025-11-01").ok(),
            order_date_end: NaiveDate::from_str("2025-11-30").ok(),
            ..Default::default()
        };
        assert_eq!(artifact_suffix(&criteria), "20251101_to_20251130");
    }

    #[test]
    fn suffix_falls_back_to_today_for_partial_ranges() {
        let criteria = FilterCriteria {
            order_date_start: NaiveDate::from_str("2025-11-01").ok(),
            ..Default::default()
        };
        let expected = chrono::Local::now().format("%Y%m%d").to_string();
        assert_eq!(artifact_suffix(&criteria), expected);
    }
}
