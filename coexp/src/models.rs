use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Tissue name -> expression value for a single gene. Keys are kept sorted so the
/// tissue basis of a candidate is always iterated in the same order.
pub type ExpressionProfile = BTreeMap<String, f64>;

/// Internal gene identifier -> display gene name.
pub type NameMapping = HashMap<String, String>;

/// Gene identifier (or display name) -> free-text functional annotation.
pub type AnnotationMapping = HashMap<String, String>;

pub type CoexpResult<T> = Result<T, CoexpError>;

#[derive(Debug, Error)]
pub enum CoexpError {
    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl CoexpError {
    pub fn parse(path: impl Into<PathBuf>, line: u64, message: impl Into<String>) -> Self {
        CoexpError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoexpError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Something that can be read from disk into an in-memory table.
pub trait Dataset {
    type Output;

    fn load(&self) -> CoexpResult<Self::Output>;
}

/// Tissue x gene expression matrix. Built once by the loader and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ExpressionTable {
    tissues: Vec<String>,
    gene_order: Vec<String>,
    profiles: HashMap<String, ExpressionProfile>,
}

impl ExpressionTable {
    pub fn new(tissues: Vec<String>) -> Self {
        ExpressionTable {
            tissues,
            gene_order: Vec::new(),
            profiles: HashMap::new(),
        }
    }

    /// Inserts or replaces a gene profile. A replaced gene keeps its original position
    /// in the iteration order; the previous profile is returned.
    pub fn insert(&mut self, gene_id: String, profile: ExpressionProfile) -> Option<ExpressionProfile> {
        let previous = self.profiles.insert(gene_id.clone(), profile);
        if previous.is_none() {
            self.gene_order.push(gene_id);
        }
        previous
    }

    pub fn profile(&self, gene_id: &str) -> Option<&ExpressionProfile> {
        self.profiles.get(gene_id)
    }

    pub fn contains(&self, gene_id: &str) -> bool {
        self.profiles.contains_key(gene_id)
    }

    /// Genes in the order they first appeared in the source file.
    pub fn genes(&self) -> impl Iterator<Item = (&str, &ExpressionProfile)> + '_ {
        self.gene_order
            .iter()
            .filter_map(move |gene| self.profiles.get(gene).map(|p| (gene.as_str(), p)))
    }

    pub fn tissues(&self) -> &[String] {
        &self.tissues
    }

    pub fn gene_count(&self) -> usize {
        self.gene_order.len()
    }
}

/// One co-expressed partner of a candidate gene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoexpressionResult {
    pub gene_id: String,
    pub correlation: f64,
    /// Raw, unadjusted two-sided p-value.
    pub p_value: f64,
}
