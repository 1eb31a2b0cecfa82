use crate::error::{Result, TallyError};
use crate::lines::{decode_field, for_each_line, split_on};
use crate::registry::Registry;
use crate::scanner::{base_name, FileScanner};
use crate::size_index::SizeIndex;
use crate::stats::JoinStats;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const NAMESPACE_FIELD: usize = 1;
const PATH_FIELD: usize = 2;

/// Streams CSV join rows into a registry.
///
/// Each data row is `<row id>,<namespace id>,<storage path>[,...]`. Rows
/// for a registered namespace bump the counters keyed by the CSV file's own
/// name and add the listed size of the storage path. Rows for unknown
/// namespaces are dropped without touching the registry.
pub struct Aggregator<'a> {
    registry: &'a mut Registry,
    sizes: &'a SizeIndex,
    header_token: &'a str,
    stats: JoinStats,
}

impl<'a> Aggregator<'a> {
    pub fn new(registry: &'a mut Registry, sizes: &'a SizeIndex, header_token: &'a str) -> Self {
        Self {
            registry,
            sizes,
            header_token,
            stats: JoinStats::default(),
        }
    }

    /// Ingest every CSV file in `dir`, in file name order
    pub fn ingest_dir(&mut self, dir: impl AsRef<Path>, extension: &str) -> Result<()> {
        let files = FileScanner::new(dir).with_extension(extension).scan()?;
        for path in &files {
            self.ingest_file(path)?;
        }
        Ok(())
    }

    pub fn ingest_file(&mut self, path: &Path) -> Result<()> {
        log::info!("Joining {}", path.display());
        let file = File::open(path).map_err(|err| TallyError::io(path, err))?;
        let filename = base_name(path);
        self.ingest_reader(BufReader::new(file), &filename, &path.display().to_string())
    }

    /// Ingest one CSV stream whose rows are keyed under `filename`
    pub fn ingest_reader<R: BufRead>(
        &mut self,
        reader: R,
        filename: &str,
        source: &str,
    ) -> Result<()> {
        let before = self.stats;

        for_each_line(reader, source, |line_no, line| {
            self.ingest_line(line, line_no, filename, source)
        })?;

        self.stats.files += 1;
        log::debug!(
            "{source}: {} rows, {} matched, {} dropped",
            self.stats.rows - before.rows,
            self.stats.matched_rows - before.matched_rows,
            self.stats.dropped_rows - before.dropped_rows
        );
        Ok(())
    }

    fn ingest_line(
        &mut self,
        line: &[u8],
        line_no: usize,
        filename: &str,
        source: &str,
    ) -> Result<()> {
        self.stats.rows += 1;

        let fields = split_on(line, b',');
        if fields[0] == self.header_token.as_bytes() {
            self.stats.header_rows += 1;
            return Ok(());
        }
        if fields.len() <= PATH_FIELD {
            return Err(TallyError::parse(
                source,
                line_no,
                format!(
                    "expected at least {} comma-separated fields, got {}",
                    PATH_FIELD + 1,
                    fields.len()
                ),
            ));
        }

        let namespace_id = decode_field(fields[NAMESPACE_FIELD], "namespace id", source, line_no)?;
        let Some(namespace) = self.registry.namespaces.get_mut(namespace_id) else {
            self.stats.dropped_rows += 1;
            return Ok(());
        };
        let storage_path = decode_field(fields[PATH_FIELD], "path", source, line_no)?;

        if !self.sizes.contains(storage_path) {
            log::debug!("{source}:{line_no}: no listed size for {storage_path}");
            self.stats.unsized_rows += 1;
        }
        let stat = namespace.files.entry(filename.to_string()).or_default();
        *stat = stat
            .checked_record(self.sizes.get(storage_path))
            .ok_or_else(|| {
                TallyError::overflow(format!(
                    "{source}:{line_no}: namespace {namespace_id}, file {filename}"
                ))
            })?;
        self.stats.matched_rows += 1;
        Ok(())
    }

    pub fn stats(&self) -> &JoinStats {
        &self.stats
    }

    pub fn finish(self) -> JoinStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FileStat;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn registry() -> Registry {
        Registry::parse(1, "1,Alpha\n3,Gamma\n".as_bytes(), "1").unwrap()
    }

    fn sizes() -> SizeIndex {
        let mut index = SizeIndex::new();
        index.insert("/a/b/f.csv", 100);
        index.insert("/a/b/g.csv", 50);
        index
    }

    #[test]
    fn counts_rows_under_csv_file_name() {
        let mut registry = registry();
        let sizes = sizes();
        let mut agg = Aggregator::new(&mut registry, &sizes, "id");
        agg.ingest_reader(
            "id,ns,path\n7,1,/a/b/f.csv\n8,1,/a/b/g.csv\n".as_bytes(),
            "a.csv",
            "a.csv",
        )
        .unwrap();
        let stats = agg.finish();

        assert_eq!(
            registry.namespaces["1"].files["a.csv"],
            FileStat {
                count: 2,
                sum: 150
            }
        );
        assert_eq!(stats.header_rows, 1);
        assert_eq!(stats.matched_rows, 2);
        assert_eq!(stats.files, 1);
    }

    #[test]
    fn unknown_namespace_is_dropped_silently() {
        let mut registry = registry();
        let untouched = registry.clone();
        let sizes = sizes();
        let mut agg = Aggregator::new(&mut registry, &sizes, "id");
        agg.ingest_reader("9,2,/a/b/f.csv\n".as_bytes(), "a.csv", "a.csv")
            .unwrap();
        let stats = agg.finish();

        assert_eq!(registry, untouched);
        assert!(!registry.contains("2"));
        assert_eq!(stats.dropped_rows, 1);
    }

    #[test]
    fn unlisted_path_counts_with_zero_size() {
        let mut registry = registry();
        let sizes = sizes();
        let mut agg = Aggregator::new(&mut registry, &sizes, "id");
        agg.ingest_reader("1,3,/missing\n".as_bytes(), "b.csv", "b.csv")
            .unwrap();
        let stats = agg.finish();

        assert_eq!(
            registry.namespaces["3"].files["b.csv"],
            FileStat { count: 1, sum: 0 }
        );
        assert_eq!(stats.unsized_rows, 1);
    }

    #[test]
    fn header_is_detected_by_value_anywhere() {
        let mut registry = registry();
        let sizes = sizes();
        let mut agg = Aggregator::new(&mut registry, &sizes, "id");
        agg.ingest_reader(
            "1,1,/a/b/f.csv\nid,ns,path\n2,1,/a/b/f.csv\n".as_bytes(),
            "a.csv",
            "a.csv",
        )
        .unwrap();

        assert_eq!(registry.namespaces["1"].files["a.csv"].count, 2);
    }

    #[test]
    fn short_row_is_a_parse_error() {
        let mut registry = registry();
        let sizes = sizes();
        let mut agg = Aggregator::new(&mut registry, &sizes, "id");
        let err = agg
            .ingest_reader("1,1\n".as_bytes(), "a.csv", "a.csv")
            .unwrap_err();
        assert!(matches!(err, TallyError::Parse { line: 1, .. }));
    }

    #[test]
    fn ingest_dir_keys_each_file_separately() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.csv"), "id,ns,path\n1,1,/a/b/f.csv\n").unwrap();
        fs::write(temp.path().join("b.csv"), "id,ns,path\n2,1,/a/b/g.csv\n").unwrap();
        fs::write(temp.path().join("c.txt"), "3,1,/a/b/f.csv\n").unwrap();

        let mut registry = registry();
        let sizes = sizes();
        let mut agg = Aggregator::new(&mut registry, &sizes, "id");
        agg.ingest_dir(temp.path(), "csv").unwrap();
        assert_eq!(agg.stats().files, 2);

        let files = &registry.namespaces["1"].files;
        assert_eq!(files.len(), 2);
        assert_eq!(files["a.csv"], FileStat { count: 1, sum: 100 });
        assert_eq!(files["b.csv"], FileStat { count: 1, sum: 50 });
    }

    #[test]
    fn non_utf8_trailing_column_still_counts() {
        let mut registry = registry();
        let sizes = sizes();
        let mut agg = Aggregator::new(&mut registry, &sizes, "id");
        agg.ingest_reader(
            &b"id,ns,path,memo\n7,1,/a/b/f.csv,\x82\xa0\x82\xa2\n"[..],
            "a.csv",
            "a.csv",
        )
        .unwrap();

        assert_eq!(
            registry.namespaces["1"].files["a.csv"],
            FileStat { count: 1, sum: 100 }
        );
    }

    #[test]
    fn non_utf8_path_is_a_parse_error() {
        let mut registry = registry();
        let sizes = sizes();
        let mut agg = Aggregator::new(&mut registry, &sizes, "id");
        let err = agg
            .ingest_reader(&b"7,1,/a/\x82\xa0\n"[..], "a.csv", "a.csv")
            .unwrap_err();
        assert!(matches!(err, TallyError::Parse { line: 1, .. }));
    }

    #[test]
    fn byte_sum_overflow_aborts() {
        let mut registry = registry();
        let mut sizes = SizeIndex::new();
        sizes
            .parse_listing("x 1 9223372036854775807 /max\n".as_bytes(), "mem")
            .unwrap();
        let mut agg = Aggregator::new(&mut registry, &sizes, "id");
        let err = agg
            .ingest_reader("1,1,/max\n2,1,/max\n3,1,/max\n".as_bytes(), "a.csv", "a.csv")
            .unwrap_err();

        match err {
            TallyError::Overflow { context } => assert!(context.contains("a.csv:3")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
