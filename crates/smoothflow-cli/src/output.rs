//! Report writers and terminal output.

use crate::error::Result;
use colored::Colorize;
use smoothflow::driver::CertificationRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes certification rows to a text report and a CSV report side by side.
///
/// Both files start with the run settings, then the column header. Rows are
/// flushed as they arrive so partial runs leave usable reports.
pub(crate) struct ReportWriter {
    txt: BufWriter<File>,
    csv: csv::Writer<File>,
}

impl ReportWriter {
    /// Create both reports and write the settings and header lines.
    pub(crate) fn create(txt_path: &Path, csv_path: &Path, settings: &[(&str, String)]) -> Result<Self> {
        let mut txt = BufWriter::new(File::create(txt_path)?);
        writeln!(txt, "{}", smoothflow::driver::settings_line(settings))?;
        writeln!(txt, "{}", CertificationRecord::tsv_header())?;
        txt.flush()?;

        let mut csv = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(csv_path)?;
        csv.write_record(settings.iter().map(|(k, v)| format!("{k}: {v}")))?;
        csv.write_record(CertificationRecord::HEADER)?;
        csv.flush()?;

        Ok(Self { txt, csv })
    }

    /// Append one row to both reports.
    pub(crate) fn write(&mut self, record: &CertificationRecord) -> Result<()> {
        writeln!(self.txt, "{}", record.to_tsv())?;
        self.txt.flush()?;
        self.csv.write_record([
            record.idx.to_string(),
            record.label.to_string(),
            record.predict.to_string(),
            record.radius.to_string(),
            record.correct.to_string(),
            record.time.clone(),
        ])?;
        self.csv.flush()?;
        Ok(())
    }
}

/// Print a section header
pub(crate) fn section(title: &str) {
    println!("\n{}", format!("=== {title} ===").cyan().bold());
}

/// Print a key-value pair
pub(crate) fn kv(key: &str, value: impl std::fmt::Display) {
    println!("  {}: {}", key.white().bold(), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use smoothflow::smooth::{Certification, Prediction};

    #[test]
    fn test_reports_have_settings_header_and_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let txt_path = dir.path().join("r.txt");
        let csv_path = dir.path().join("r.csv");
        let settings = [("sigma", "0.5".to_string()), ("N", "1000".to_string())];
        let mut writer = ReportWriter::create(&txt_path, &csv_path, &settings).expect("create");

        let cert = Certification {
            prediction: Prediction::Abstain,
            radius: 0.0,
            p_a: 0.4,
            candidate: 2,
            n_a: 400,
            n: 1000,
        };
        writer
            .write(&CertificationRecord::new(5, 2, &cert, Duration::from_secs(1)))
            .expect("write");
        drop(writer);

        let txt = std::fs::read_to_string(&txt_path).expect("read txt");
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "sigma: 0.5 | N: 1000");
        assert!(lines[1].starts_with("idx\t\tlabel"));
        assert_eq!(lines[2], "5\t\t2\t\t-1\t\t0.0\t\t0\t\t0:00:01");

        let csv = std::fs::read_to_string(&csv_path).expect("read csv");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "sigma: 0.5,N: 1000");
        assert_eq!(lines[1], "idx,label,predict,radius,correct,time");
        assert_eq!(lines[2], "5,2,-1,0,0,0:00:01");
    }
}
