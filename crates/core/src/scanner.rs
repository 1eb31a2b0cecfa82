use crate::error::{Result, TallyError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Flat scanner for the input directories.
///
/// Only direct children are listed; subdirectories are skipped, never
/// descended into. Results come back sorted by file name so every run sees
/// the same order.
pub struct FileScanner {
    root: PathBuf,
    extension: Option<String>,
}

impl FileScanner {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: None,
        }
    }

    /// Keep only files whose extension equals `ext` (no leading dot)
    pub fn with_extension(mut self, ext: impl Into<String>) -> Self {
        let ext = ext.into();
        self.extension = Some(ext.trim_start_matches('.').to_string());
        self
    }

    /// List the non-directory entries of the root
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|err| {
                let path = err
                    .path()
                    .map_or_else(|| self.root.clone(), Path::to_path_buf);
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("directory walk failed"));
                TallyError::io(path, source)
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            if !self.matches_extension(path) {
                log::debug!("Skipping {} (extension filter)", path.display());
                continue;
            }

            files.push(path.to_path_buf());
        }

        log::debug!("Found {} files in {}", files.len(), self.root.display());
        Ok(files)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        let Some(expected) = self.extension.as_deref() else {
            return true;
        };
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == expected)
    }
}

/// Final path component as a string, used as the per-file aggregation key
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn filters_by_extension_and_sorts() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("b.csv"), b"").unwrap();
        fs::write(temp.path().join("a.csv"), b"").unwrap();
        fs::write(temp.path().join("notes.txt"), b"").unwrap();
        fs::write(temp.path().join("upper.CSV"), b"").unwrap();

        let files = FileScanner::new(temp.path())
            .with_extension("csv")
            .scan()
            .unwrap();

        let names: Vec<String> = files.iter().map(|p| base_name(p)).collect();
        assert_eq!(names, vec!["a.csv".to_string(), "b.csv".to_string()]);
    }

    #[test]
    fn does_not_descend_into_subdirectories() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("deep.list"), b"").unwrap();
        fs::write(temp.path().join("top.list"), b"").unwrap();

        let files = FileScanner::new(temp.path()).scan().unwrap();

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("top.list"));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let temp = tempdir().unwrap();
        let err = FileScanner::new(temp.path().join("absent"))
            .scan()
            .unwrap_err();
        assert!(matches!(err, TallyError::Io { .. }));
    }

    #[test]
    fn leading_dot_in_extension_is_ignored() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("x.list"), b"").unwrap();
        let files = FileScanner::new(temp.path())
            .with_extension(".list")
            .scan()
            .unwrap();
        assert_eq!(files.len(), 1);
    }
}
