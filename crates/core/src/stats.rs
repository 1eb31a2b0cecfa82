use serde::{Deserialize, Serialize};

/// Row counters collected while joining CSV files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStats {
    /// CSV files read
    pub files: usize,

    /// Lines read, headers included
    pub rows: u64,

    /// Lines skipped as headers
    pub header_rows: u64,

    /// Rows counted against a registered namespace
    pub matched_rows: u64,

    /// Rows whose namespace is not in the registry
    pub dropped_rows: u64,

    /// Matched rows whose path had no listed size
    pub unsized_rows: u64,
}

/// Statistics about one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub namespaces: usize,
    pub list_files: usize,
    pub indexed_paths: usize,
    pub join: JoinStats,
    pub total_bytes: u64,
    pub time_ms: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }
}
