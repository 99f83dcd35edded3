use std::{
    collections::HashMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use omwtk_reconcile::{ReportBucket, ReportSection, ReportSink, SynsetId};
use parking_lot::Mutex;

/// Writes each report bucket to its own text file under a directory.
pub struct TextReportSink {
    dir: PathBuf,
    writers: Mutex<HashMap<ReportBucket, BufWriter<File>>>,
}

impl TextReportSink {
    /// Creates (truncating) one file per bucket under `dir`.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating report directory {}", dir.display()))?;
        let mut writers = HashMap::new();
        for bucket in ReportBucket::ALL {
            let path = dir.join(bucket.file_name());
            let file = File::create(&path)
                .with_context(|| format!("creating report {}", path.display()))?;
            writers.insert(bucket, BufWriter::new(file));
        }
        Ok(Self {
            dir,
            writers: Mutex::new(writers),
        })
    }

    /// Flushes every bucket file.
    pub fn flush(&self) -> Result<()> {
        for writer in self.writers.lock().values_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Writes the ids tagged `DIFF`, one per line.
    pub fn write_diff_ids(&self, ids: &[SynsetId]) -> Result<PathBuf> {
        let path = self.dir.join("omw_gwn_diff_ssids.txt");
        let mut body = String::new();
        for id in ids {
            body.push_str(&id.to_string());
            body.push('\n');
        }
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

impl ReportSink for TextReportSink {
    fn append(&self, section: ReportSection) -> Result<()> {
        let mut writers = self.writers.lock();
        let writer = writers
            .get_mut(&section.bucket)
            .with_context(|| format!("no writer for {:?}", section.bucket))?;
        writeln!(writer, "{}", section.header)?;
        writeln!(writer, "{}", "-".repeat(section.header.chars().count()))?;
        for line in &section.lines {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_sections_to_bucket_files() {
        let dir = tempdir().unwrap();
        let sink = TextReportSink::create(dir.path().join("reports")).unwrap();
        sink.append(ReportSection {
            bucket: ReportBucket::Diff,
            header: "[DIFF] 02084071-n".into(),
            lines: vec!["OMW: a".into(), "GWN: b".into()],
        })
        .unwrap();
        sink.flush().unwrap();

        let diff = fs::read_to_string(dir.path().join("reports/omw_gwn_diff.txt")).unwrap();
        assert_eq!(diff, "[DIFF] 02084071-n\n-----------------\nOMW: a\nGWN: b\n\n");
        let master = fs::read_to_string(dir.path().join("reports/omw_gwn_report.txt")).unwrap();
        assert!(master.is_empty());
    }

    #[test]
    fn writes_diff_id_list() {
        let dir = tempdir().unwrap();
        let sink = TextReportSink::create(dir.path()).unwrap();
        let ids: Vec<SynsetId> = vec!["02084071-n".parse().unwrap(), "00001740-a".parse().unwrap()];
        let path = sink.write_diff_ids(&ids).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "02084071-n\n00001740-a\n");
    }
}
