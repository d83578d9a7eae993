use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::helper_functions::{read_tsv, record_error};
use crate::models::{CoexpError, CoexpResult, Dataset};

/// Two-column `key<TAB>value` lookup table. Used for both the gene name mapping and
/// the functional annotation file. Later rows overwrite earlier ones. Text that is not
/// valid UTF-8 (Latin-1 annotation dumps) is decoded lossily.
pub struct MappingDataset {
    pub path: PathBuf,
}

impl Dataset for MappingDataset {
    type Output = HashMap<String, String>;

    fn load(&self) -> CoexpResult<HashMap<String, String>> {
        info!("Reading mapping table from {}", self.path.display());
        let mut reader = read_tsv(&self.path)?;

        let mut mapping = HashMap::new();
        for record in reader.byte_records() {
            let record = record.map_err(|e| record_error(&self.path, e))?;
            if record.iter().all(<[u8]>::is_empty) {
                continue;
            }
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            if record.len() < 2 {
                let err = CoexpError::parse(
                    &self.path,
                    line,
                    format!("expected two tab-separated columns, found {}", record.len()),
                );
                error!("Failed to read mapping table: {}", err);
                return Err(err);
            }

            let key = String::from_utf8_lossy(&record[0]);
            let value = String::from_utf8_lossy(&record[1]);
            if key.is_empty() || value.is_empty() {
                warn!("{}:{}: empty key or value, row skipped", self.path.display(), line);
                continue;
            }
            mapping.insert(key.into_owned(), value.into_owned());
        }

        info!("Loaded {} entries", mapping.len());
        Ok(mapping)
    }
}

/// Loads the table when a path was given; an absent optional file is an empty mapping.
pub fn load_optional_mapping(path: Option<&Path>) -> CoexpResult<HashMap<String, String>> {
    match path {
        Some(path) => MappingDataset {
            path: path.to_path_buf(),
        }
        .load(),
        None => Ok(HashMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn last_duplicate_wins_and_extra_columns_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("names.tsv");
        fs::write(&path, "AT1G01010\tNAC001\textra\n\nAT1G01020\tARV1\nAT1G01010\tANAC001\n").unwrap();

        let mapping = MappingDataset { path }.load().unwrap();
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["AT1G01010"], "ANAC001");
        assert_eq!(mapping["AT1G01020"], "ARV1");
    }

    #[test]
    fn annotation_text_keeps_inner_spaces() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ann.tsv");
        fs::write(&path, "MYB12\tR2R3-MYB transcription factor, flavonol regulator\n").unwrap();

        let mapping = MappingDataset { path }.load().unwrap();
        assert_eq!(mapping["MYB12"], "R2R3-MYB transcription factor, flavonol regulator");
    }

    #[test]
    fn single_column_row_is_a_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.tsv");
        fs::write(&path, "G1\tname\nG2\n").unwrap();

        let err = MappingDataset { path }.load().unwrap_err();
        assert!(matches!(err, CoexpError::Parse { line: 2, .. }));
    }

    #[test]
    fn latin1_annotation_is_decoded_lossily() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ann.tsv");
        fs::write(&path, b"G1\tkinase\nG2\tprot\xe9ine kinase\n").unwrap();

        let mapping = MappingDataset { path }.load().unwrap();
        assert_eq!(mapping["G1"], "kinase");
        assert_eq!(mapping["G2"], "prot\u{FFFD}ine kinase");
    }

    #[test]
    fn empty_value_row_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("names.tsv");
        fs::write(&path, "G1\t\nG2\tPAL1\n\tORPHAN\n").unwrap();

        let mapping = MappingDataset { path }.load().unwrap();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping["G2"], "PAL1");
        assert!(!mapping.contains_key("G1"));
    }

    #[test]
    fn absent_optional_file_is_empty() {
        assert!(load_optional_mapping(None).unwrap().is_empty());
    }
}
