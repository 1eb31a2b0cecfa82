use crate::config::OutputFormat;
use crate::error::{Result, TallyError};
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root of the emitted document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub registry: Registry,
}

impl Report {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn to_string_pretty(&self, format: OutputFormat) -> Result<String> {
        let mut rendered = match format {
            OutputFormat::Yaml => serde_yaml::to_string(self)?,
            OutputFormat::Json => serde_json::to_string_pretty(self)?,
        };
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }
        Ok(rendered)
    }

    /// Serialize and replace `path` in one step.
    ///
    /// The document is rendered in full before anything touches the disk and
    /// lands through a sibling temp file, so a failed run leaves no partial
    /// report behind.
    pub fn write(&self, path: &Path, format: OutputFormat) -> Result<()> {
        let rendered = self.to_string_pretty(format)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| TallyError::io(parent, err))?;
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = std::path::PathBuf::from(tmp_name);

        std::fs::write(&tmp, rendered.as_bytes()).map_err(|err| TallyError::io(&tmp, err))?;
        if let Err(err) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(TallyError::io(path, err));
        }

        log::info!("Wrote {} report to {}", format.as_str(), path.display());
        Ok(())
    }
}
