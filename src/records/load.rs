use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::demo::demo_records;
use super::parse::parse_records;
use super::record::DataRecord;

/// Where the viewer takes its records from.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordSource {
    File(PathBuf),
    Demo(usize),
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Demo(count) => write!(f, "demo ({count} records)"),
        }
    }
}

pub fn load_records(source: &RecordSource) -> Result<Vec<DataRecord>> {
    match source {
        RecordSource::File(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read record file {}", path.display()))?;
            parse_records(&raw)
                .with_context(|| format!("failed to parse record file {}", path.display()))
        }
        RecordSource::Demo(count) => Ok(demo_records(*count)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_records_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"[{{"label": "disk", "size": 7}}]"#).expect("write records");

        let records =
            load_records(&RecordSource::File(file.path().to_path_buf())).expect("records load");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "disk");
    }

    #[test]
    fn missing_file_reports_path() {
        let source = RecordSource::File(PathBuf::from("/definitely/not/here.json"));
        let error = load_records(&source).expect_err("missing file fails");
        assert!(format!("{error:#}").contains("/definitely/not/here.json"));
    }

    #[test]
    fn demo_source_generates_requested_count() {
        let records = load_records(&RecordSource::Demo(12)).expect("demo records");
        assert_eq!(records.len(), 12);
    }
}
