use crate::error::EngineError;
use chrono::NaiveDate;
use configuration::{DuplicatePolicy, Naming};
use core_types::SourceFileRef;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Discovers the dated market-report files in the input directory.
///
/// A source file name starts with a date token of three numeric components
/// (year, month, day) separated by whitespace, `.`, `_` or `-`, optionally
/// followed by free text, and ends with the configured suffix:
/// `2024 03 01.csv`, `2024-3-1.csv`, `2024_03_01 session.csv`.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    pattern: Regex,
    excluded_prefix: String,
    duplicates: DuplicatePolicy,
}

impl ManifestBuilder {
    pub fn new(naming: &Naming, duplicates: DuplicatePolicy) -> Result<Self, EngineError> {
        let pattern = Regex::new(&format!(
            r"^(\d{{4}})[\s._-]+(\d{{1,2}})[\s._-]+(\d{{1,2}})(?:[\s._-].*)?{}$",
            regex::escape(&naming.source_suffix)
        ))?;

        Ok(Self {
            pattern,
            excluded_prefix: naming.excluded_prefix.clone(),
            duplicates,
        })
    }

    /// Lists `dir` and returns its source files in ascending date order.
    ///
    /// Failing to list the directory at all is fatal. Anything else that is
    /// wrong with a single entry only skips that entry.
    pub fn build(&self, dir: &Path) -> Result<Vec<SourceFileRef>, EngineError> {
        let listing = fs::read_dir(dir).map_err(|source| EngineError::InputDirectory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for item in listing {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "Skipping unreadable input directory entry.");
                    continue;
                }
            };
            let path = item.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = item.file_name().to_str().map(str::to_owned) else {
                tracing::debug!(path = %path.display(), "Ignoring file with a non UTF-8 name.");
                continue;
            };
            if let Some(date) = self.date_of(&file_name) {
                files.push(SourceFileRef { date, file_name, path });
            }
        }

        files.sort();
        let files = self.resolve_duplicates(files)?;
        tracing::info!(dir = %dir.display(), files = files.len(), "Source manifest built.");
        Ok(files)
    }

    /// Decodes the date of a source file name.
    ///
    /// Excluded and non-matching names yield `None` silently. A name that
    /// matches but carries an impossible date yields `None` with a warning.
    pub fn date_of(&self, file_name: &str) -> Option<NaiveDate> {
        if !self.excluded_prefix.is_empty() && file_name.starts_with(&self.excluded_prefix) {
            tracing::debug!(file = file_name, "Ignoring excluded source file.");
            return None;
        }

        let caps = self.pattern.captures(file_name)?;
        let year = caps[1].parse::<i32>().ok()?;
        let month = caps[2].parse::<u32>().ok()?;
        let day = caps[3].parse::<u32>().ok()?;

        let date = NaiveDate::from_ymd_opt(year, month, day);
        if date.is_none() {
            tracing::warn!(file = file_name, "Skipping source file whose date token is not a calendar date.");
        }
        date
    }

    /// Collapses files that claim the same date. `files` must be sorted.
    fn resolve_duplicates(&self, files: Vec<SourceFileRef>) -> Result<Vec<SourceFileRef>, EngineError> {
        let mut resolved: Vec<SourceFileRef> = Vec::with_capacity(files.len());

        for file in files {
            if let Some(previous) = resolved.last_mut().filter(|p| p.date == file.date) {
                match self.duplicates {
                    DuplicatePolicy::Reject => {
                        return Err(EngineError::DuplicateSourceDate {
                            date: file.date,
                            first: previous.file_name.clone(),
                            second: file.file_name,
                        });
                    }
                    DuplicatePolicy::LastWins => {
                        tracing::warn!(
                            date = %file.date,
                            dropped = %previous.file_name,
                            kept = %file.file_name,
                            "Two source files claim the same date, keeping the last one."
                        );
                        *previous = file;
                    }
                }
                continue;
            }
            resolved.push(file);
        }

        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(duplicates: DuplicatePolicy) -> ManifestBuilder {
        ManifestBuilder::new(&Naming::default(), duplicates).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_tokens_accept_common_separators() {
        let builder = builder(DuplicatePolicy::LastWins);

        assert_eq!(builder.date_of("2024 03 01.csv"), Some(date(2024, 3, 1)));
        assert_eq!(builder.date_of("2024-3-1.csv"), Some(date(2024, 3, 1)));
        assert_eq!(builder.date_of("2024_03_01 session.csv"), Some(date(2024, 3, 1)));
        assert_eq!(builder.date_of("2024.12.31.csv"), Some(date(2024, 12, 31)));
    }

    #[test]
    fn non_matching_and_excluded_names_are_skipped() {
        let builder = builder(DuplicatePolicy::LastWins);

        assert_eq!(builder.date_of("summary.csv"), None);
        assert_eq!(builder.date_of("2024 03 01.xlsx"), None);
        assert_eq!(builder.date_of("20240301.csv"), None);
        assert_eq!(builder.date_of("~$2024 03 01.csv"), None);
    }

    #[test]
    fn impossible_dates_are_skipped() {
        let builder = builder(DuplicatePolicy::LastWins);
        assert_eq!(builder.date_of("2024 13 01.csv"), None);
        assert_eq!(builder.date_of("2023 02 29.csv"), None);
    }

    #[test]
    fn build_orders_by_date() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["2024 03 04.csv", "2024 02 28.csv", "2024 03 01.csv", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("2024 03 05.csv")).unwrap();

        let files = builder(DuplicatePolicy::LastWins).build(dir.path()).unwrap();
        let dates: Vec<_> = files.iter().map(|f| f.date).collect();
        assert_eq!(dates, vec![date(2024, 2, 28), date(2024, 3, 1), date(2024, 3, 4)]);
    }

    #[test]
    fn duplicate_dates_keep_the_last_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2024 03 01.csv"), "").unwrap();
        fs::write(dir.path().join("2024-03-01 corrected.csv"), "").unwrap();

        let files = builder(DuplicatePolicy::LastWins).build(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "2024-03-01 corrected.csv");
    }

    #[test]
    fn duplicate_dates_can_be_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2024 03 01.csv"), "").unwrap();
        fs::write(dir.path().join("2024-03-01.csv"), "").unwrap();

        let result = builder(DuplicatePolicy::Reject).build(dir.path());
        assert!(matches!(result, Err(EngineError::DuplicateSourceDate { .. })));
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let result = builder(DuplicatePolicy::LastWins).build(&dir.path().join("absent"));
        assert!(matches!(result, Err(EngineError::InputDirectory { .. })));
    }
}
