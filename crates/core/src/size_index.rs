use crate::error::{Result, TallyError};
use crate::lines::{decode_field, for_each_line, split_whitespace_runs};
use crate::scanner::FileScanner;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const SIZE_FIELD: usize = 2;
const PATH_FIELD: usize = 3;
/// Listing sizes are signed 64-bit values upstream
const MAX_SIZE: u64 = i64::MAX as u64;

/// Storage path -> size in bytes, built from listing files.
///
/// Listing lines are whitespace-separated with the size in field 2 and the
/// path in field 3 (`2024-01-02 10:00:00 1234 bucket/key`). Extra fields
/// are ignored. Leading whitespace counts as an empty first field, so an
/// indented line is read one column to the right. A later line for the same
/// path replaces the earlier size.
#[derive(Debug, Clone, Default)]
pub struct SizeIndex {
    sizes: HashMap<String, u64>,
}

impl SizeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from every listing file in `dir`.
    ///
    /// Returns the index and the number of listing files read.
    pub fn load(dir: impl AsRef<Path>, extension: &str) -> Result<(Self, usize)> {
        let files = FileScanner::new(dir).with_extension(extension).scan()?;

        let mut index = Self::new();
        for path in &files {
            let file = File::open(path).map_err(|err| TallyError::io(path, err))?;
            let before = index.len();
            index.parse_listing(BufReader::new(file), &path.display().to_string())?;
            log::debug!(
                "Loaded {} ({} new paths)",
                path.display(),
                index.len().saturating_sub(before)
            );
        }

        log::info!(
            "Size index: {} paths from {} listing files",
            index.len(),
            files.len()
        );
        Ok((index, files.len()))
    }

    /// Parse one listing stream into the index; `source` names it in errors
    pub fn parse_listing<R: BufRead>(&mut self, reader: R, source: &str) -> Result<()> {
        for_each_line(reader, source, |line_no, line| {
            let (path, size) = parse_listing_line(line, source, line_no)?;
            self.sizes.insert(path.to_string(), size);
            Ok(())
        })
    }

    pub fn insert(&mut self, path: impl Into<String>, size: u64) {
        self.sizes.insert(path.into(), size);
    }

    /// Size for `path`, or 0 when the path was never listed
    pub fn get(&self, path: &str) -> u64 {
        self.sizes.get(path).copied().unwrap_or(0)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.sizes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

fn parse_listing_line<'a>(
    line: &'a [u8],
    source: &str,
    line_no: usize,
) -> Result<(&'a str, u64)> {
    let fields = split_whitespace_runs(line);
    if fields.len() <= PATH_FIELD {
        return Err(TallyError::parse(
            source,
            line_no,
            format!(
                "expected at least {} whitespace-separated fields, got {}",
                PATH_FIELD + 1,
                fields.len()
            ),
        ));
    }

    let raw_size = decode_field(fields[SIZE_FIELD], "size", source, line_no)?;
    let size = raw_size
        .parse::<u64>()
        .ok()
        .filter(|size| *size <= MAX_SIZE)
        .ok_or_else(|| {
            TallyError::parse(
                source,
                line_no,
                format!("invalid size {raw_size:?}: expected an integer in 0..={MAX_SIZE}"),
            )
        })?;
    let path = decode_field(fields[PATH_FIELD], "path", source, line_no)?;
    Ok((path, size))
}
