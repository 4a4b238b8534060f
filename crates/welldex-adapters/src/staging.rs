//! Download staging: `<data_dir>/<source_tag>/<YYYY-MM-DD>/` (spec.md §4.2,
//! §6). Re-running on the same day reuses the directory; a later day gets a
//! fresh one; the most recent dated directory is the default input for
//! downstream parse/map steps when no download was requested.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};

/// The staging directory for `source_tag` on `today`, creating it if absent.
pub fn stage_dir_for_today(data_dir: &Path, source_tag: &str, today: NaiveDate) -> std::io::Result<PathBuf> {
    let dir = data_dir.join(source_tag).join(today.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Convenience wrapper using the real current date.
pub fn stage_dir_today(data_dir: &Path, source_tag: &str) -> std::io::Result<PathBuf> {
    stage_dir_for_today(data_dir, source_tag, Utc::now().date_naive())
}

/// The most recently dated staging directory for a source, or `None` if
/// it has never been downloaded. Used as the default input when a caller
/// asks to parse/map without re-downloading.
pub fn latest_stage_dir(data_dir: &Path, source_tag: &str) -> Option<PathBuf> {
    let source_dir = data_dir.join(source_tag);
    let entries = std::fs::read_dir(&source_dir).ok()?;

    entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            NaiveDate::parse_from_str(&name, "%Y-%m-%d")
                .ok()
                .map(|date| (date, e.path()))
        })
        .max_by_key(|(date, _)| *date)
        .map(|(_, path)| path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_day_reuses_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let a = stage_dir_for_today(tmp.path(), "tx_rrc", today).unwrap();
        std::fs::write(a.join("marker.txt"), "x").unwrap();
        let b = stage_dir_for_today(tmp.path(), "tx_rrc", today).unwrap();
        assert_eq!(a, b);
        assert!(b.join("marker.txt").exists());
    }

    #[test]
    fn later_day_gets_fresh_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let day1 = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let a = stage_dir_for_today(tmp.path(), "tx_rrc", day1).unwrap();
        let b = stage_dir_for_today(tmp.path(), "tx_rrc", day2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn latest_stage_dir_picks_max_date() {
        let tmp = tempfile::tempdir().unwrap();
        stage_dir_for_today(tmp.path(), "tx_rrc", NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()).unwrap();
        let latest = stage_dir_for_today(tmp.path(), "tx_rrc", NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()).unwrap();
        assert_eq!(latest_stage_dir(tmp.path(), "tx_rrc"), Some(latest));
    }

    #[test]
    fn missing_source_dir_returns_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(latest_stage_dir(tmp.path(), "never_downloaded"), None);
    }
}
