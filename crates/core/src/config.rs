use crate::error::{Result, TallyError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Serialization format of the emitted report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }

    pub fn extension(self) -> &'static str {
        self.as_str()
    }
}

/// Directory layout and parsing knobs for one tally run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Directory holding `target/`, `list/` and `csv/`
    pub root: PathBuf,

    /// Registry directory (exactly one file), relative to `root`
    pub target_dir: PathBuf,

    /// Size listing directory, relative to `root`
    pub list_dir: PathBuf,

    /// CSV join directory, relative to `root`
    pub csv_dir: PathBuf,

    /// Extension (without dot) of listing files
    pub list_extension: String,

    /// Extension (without dot) of CSV files
    pub csv_extension: String,

    /// First-field value that marks a CSV header line
    pub header_token: String,

    /// Report path; `result.<format>` in the working directory when unset
    pub output: Option<PathBuf>,

    pub format: OutputFormat,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            target_dir: PathBuf::from("target"),
            list_dir: PathBuf::from("list"),
            csv_dir: PathBuf::from("csv"),
            list_extension: "list".to_string(),
            csv_extension: "csv".to_string(),
            header_token: "id".to_string(),
            output: None,
            format: OutputFormat::Yaml,
        }
    }
}

impl TallyConfig {
    /// Config rooted at `root` with the default layout
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|err| TallyError::invalid_config(err.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| TallyError::io(path, err))?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.list_extension.trim().is_empty() {
            return Err(TallyError::invalid_config("list_extension must not be empty"));
        }
        if self.csv_extension.trim().is_empty() {
            return Err(TallyError::invalid_config("csv_extension must not be empty"));
        }
        if self.header_token.is_empty() {
            return Err(TallyError::invalid_config("header_token must not be empty"));
        }
        Ok(())
    }

    pub fn target_path(&self) -> PathBuf {
        self.root.join(&self.target_dir)
    }

    pub fn list_path(&self) -> PathBuf {
        self.root.join(&self.list_dir)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.root.join(&self.csv_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("result.{}", self.format.extension())))
    }
}
