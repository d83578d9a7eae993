use std::fs::{self, File};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::models::{CoexpError, CoexpResult};

/// Opens a headerless tab-separated file. Rows may have differing field counts; callers
/// validate the shape themselves so they can report the offending line.
pub fn read_tsv(path: &Path) -> CoexpResult<csv::Reader<File>> {
    let file = File::open(path).map_err(|e| CoexpError::io(path, e))?;
    Ok(ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(file))
}

/// 1-based line number of a record, as reported by the csv reader.
pub fn record_line(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

/// Turns a csv read failure (e.g. invalid UTF-8) into a parse error naming the file.
pub fn record_error(path: &Path, err: csv::Error) -> CoexpError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    CoexpError::parse(path, line, err.to_string())
}

/// A record that only holds whitespace.
pub fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

/// Parses one expression field. An empty field means the tissue has no value for
/// this gene; `NaN` is kept as a present-but-missing value.
pub fn parse_expression_value(raw: &str) -> Result<Option<f64>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("'{}' is not a number", raw))
}

pub fn ensure_output_dir(dir: &Path) -> CoexpResult<()> {
    fs::create_dir_all(dir).map_err(|e| CoexpError::io(dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_is_absent_and_nan_is_kept() {
        assert_eq!(parse_expression_value(""), Ok(None));
        assert_eq!(parse_expression_value("2.5"), Ok(Some(2.5)));
        assert!(parse_expression_value("NaN").unwrap().unwrap().is_nan());
        assert!(parse_expression_value("high").is_err());
    }

    #[test]
    fn invalid_utf8_is_reported_with_path_and_line() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("table.tsv");
        fs::write(&path, b"GeneID\tleaf\nG\xe91\t1\n").unwrap();

        let mut reader = read_tsv(&path).unwrap();
        let err = reader
            .records()
            .find_map(Result::err)
            .map(|e| record_error(&path, e))
            .unwrap();
        match err {
            CoexpError::Parse { path: p, line, .. } => {
                assert_eq!(p, path);
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn creates_nested_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        ensure_output_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // second call on an existing directory is fine
        ensure_output_dir(&nested).unwrap();
    }
}
