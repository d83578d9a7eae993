use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use tracing::{info, warn};

use crate::models::{CoexpError, CoexpResult, Dataset};

/// Candidate gene list, one identifier per line, no header.
pub struct CandidateList {
    pub path: PathBuf,
}

impl Dataset for CandidateList {
    type Output = Vec<String>;

    fn load(&self) -> CoexpResult<Vec<String>> {
        info!("Reading candidate genes from {}", self.path.display());
        let file = File::open(&self.path).map_err(|e| CoexpError::io(&self.path, e))?;

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| CoexpError::io(&self.path, e))?;
            let candidate = line.trim();
            if candidate.is_empty() {
                continue;
            }
            // the id becomes the report file name inside the output directory
            if !is_file_name_safe(candidate) {
                return Err(CoexpError::parse(
                    &self.path,
                    idx as u64 + 1,
                    format!("candidate id '{}' cannot be used as a report file name", candidate),
                ));
            }
            if !seen.insert(candidate.to_string()) {
                warn!("Candidate {} listed more than once, processing it once", candidate);
                continue;
            }
            candidates.push(candidate.to_string());
        }

        info!("Number of candidate genes: {}", candidates.len());
        Ok(candidates)
    }
}

fn is_file_name_safe(candidate: &str) -> bool {
    candidate != "." && candidate != ".." && !candidate.contains(['/', '\\', '\0'])
}
