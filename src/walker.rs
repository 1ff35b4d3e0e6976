//! Directory listing for the dataset hierarchy
//!
//! The dataset is a fixed-depth tree (period / turma / users / student / ...),
//! so there is no recursive walker here: each level lists its own directory
//! with [`list_entries`] and decides what to do with every entry.

use std::path::{Path, PathBuf};

use crate::error::{ExtractError, Result};

/// One directory entry, classified as file or directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

impl Entry {
    pub fn is_file(&self) -> bool {
        !self.is_dir
    }

    /// True for files whose name ends with `suffix` (e.g. `".data"`).
    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.is_file() && self.name.ends_with(suffix)
    }

    /// Parse the whole entry name as a numeric id (turma and student folders).
    pub fn id(&self) -> Result<u32> {
        parse_id(&self.name, &self.path)
    }

    /// Parse the entry name minus `suffix` as a numeric id (`12.data` -> 12).
    pub fn id_before_suffix(&self, suffix: &str) -> Result<u32> {
        let stem = self.name.strip_suffix(suffix).unwrap_or(&self.name);
        parse_id(stem, &self.path)
    }
}

/// Parse a bare integer identifier taken from a file or folder name.
pub fn parse_id(name: &str, path: &Path) -> Result<u32> {
    name.trim()
        .parse::<u32>()
        .map_err(|_| ExtractError::MalformedIdentifier {
            path: path.to_path_buf(),
            name: name.to_string(),
        })
}

/// List the entries of `path`, sorted by raw name.
///
/// Sorting is lexicographic on the entry name, so numeric names come out as
/// `"10" < "9"`. Callers that need numeric order sort by the parsed id.
pub fn list_entries(path: &Path) -> Result<Vec<Entry>> {
    let read_dir = std::fs::read_dir(path).map_err(|source| ExtractError::DirectoryAccess {
        path: path.to_path_buf(),
        source,
    })?;

    let mut entries: Vec<Entry> = read_dir
        .filter_map(|e| e.ok())
        .map(|e| {
            let path = e.path();
            Entry {
                name: e.file_name().to_string_lossy().to_string(),
                is_dir: path.is_dir(),
                path,
            }
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_list_entries_sorted_by_raw_name() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("9")).unwrap();
        fs::create_dir(dir.path().join("10")).unwrap();
        fs::write(dir.path().join("a.data"), "").unwrap();

        let entries = list_entries(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["10", "9", "a.data"]);
        assert!(entries[0].is_dir);
        assert!(entries[2].is_file());
    }

    #[test]
    fn test_list_entries_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = list_entries(&dir.path().join("missing")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DirectoryAccess);
    }

    #[test]
    fn test_entry_ids() {
        let entry = Entry {
            name: "1042.data".to_string(),
            path: PathBuf::from("assessments/1042.data"),
            is_dir: false,
        };
        assert!(entry.has_suffix(".data"));
        assert_eq!(entry.id_before_suffix(".data").unwrap(), 1042);
        assert_eq!(entry.id().unwrap_err().kind(), ErrorKind::MalformedIdentifier);
    }

    #[test]
    fn test_directory_never_matches_suffix() {
        let entry = Entry {
            name: "odd.data".to_string(),
            path: PathBuf::from("odd.data"),
            is_dir: true,
        };
        assert!(!entry.has_suffix(".data"));
    }
}
