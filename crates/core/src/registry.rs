use crate::error::{Result, TallyError};
use crate::lines::{decode_field, for_each_line, split_on};
use crate::scanner::{base_name, FileScanner};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Row count and byte total for one (namespace, CSV file) pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStat {
    pub count: u64,
    pub sum: u64,
}

impl FileStat {
    /// One more row of `size` bytes, or `None` if a counter would overflow
    pub fn checked_record(self, size: u64) -> Option<Self> {
        Some(Self {
            count: self.count.checked_add(1)?,
            sum: self.sum.checked_add(size)?,
        })
    }
}

/// One aggregation bucket from the registry file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "file_sumallys")]
    pub files: BTreeMap<String, FileStat>,
    pub sum: u64,
    pub sum_str: String,
}

impl NamespaceRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }
}

/// The registry file's namespaces plus their rolled-up total
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub registry_id: i64,
    pub namespaces: BTreeMap<String, NamespaceRecord>,
    pub sum: u64,
    pub sum_str: String,
}

impl Registry {
    /// Load the single registry file found in `dir`.
    ///
    /// The file name is the numeric registry id; each line is `id,name`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let files = FileScanner::new(dir).scan()?;

        let path = match files.as_slice() {
            [single] => single,
            [] => {
                return Err(TallyError::MissingTarget {
                    dir: dir.to_path_buf(),
                })
            }
            _ => {
                return Err(TallyError::AmbiguousTarget {
                    dir: dir.to_path_buf(),
                    count: files.len(),
                })
            }
        };

        let name = base_name(path);
        let registry_id = name
            .parse::<i64>()
            .map_err(|_| TallyError::InvalidRegistryId { name: name.clone() })?;

        let file = File::open(path).map_err(|err| TallyError::io(path, err))?;
        let registry = Self::parse(registry_id, BufReader::new(file), &name)?;

        log::info!(
            "Registry {}: {} namespaces",
            registry.registry_id,
            registry.namespaces.len()
        );
        Ok(registry)
    }

    /// Build a registry from `id,name` lines; `source` names the stream in errors
    pub fn parse<R: BufRead>(registry_id: i64, reader: R, source: &str) -> Result<Self> {
        let mut registry = Self {
            registry_id,
            ..Default::default()
        };

        for_each_line(reader, source, |line_no, line| {
            let fields = split_on(line, b',');
            if fields.len() < 2 {
                return Err(TallyError::parse(source, line_no, "expected `id,name`"));
            }
            let id = decode_field(fields[0], "namespace id", source, line_no)?;
            let name = decode_field(fields[1], "namespace name", source, line_no)?;

            let previous = registry
                .namespaces
                .insert(id.to_string(), NamespaceRecord::new(id, name));
            if let Some(previous) = previous {
                log::warn!(
                    "{source}:{line_no}: namespace {id} redefined ({:?} -> {name:?})",
                    previous.name
                );
            }
            Ok(())
        })?;

        Ok(registry)
    }

    pub fn contains(&self, namespace_id: &str) -> bool {
        self.namespaces.contains_key(namespace_id)
    }
}
