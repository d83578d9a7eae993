use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use crate::helper_functions::{is_blank, parse_expression_value, read_tsv, record_error, record_line};
use crate::models::{CoexpError, CoexpResult, Dataset, ExpressionProfile, ExpressionTable};

/// Tab-separated expression matrix: `GeneID<TAB>tissue...` header, one gene per row.
pub struct ExpressionDataset {
    pub path: PathBuf,
}

impl Dataset for ExpressionDataset {
    type Output = ExpressionTable;

    fn load(&self) -> CoexpResult<ExpressionTable> {
        info!("Reading expression data from {}", self.path.display());
        match self.read_table() {
            Ok(table) => {
                info!(
                    "Loaded {} genes across {} tissues",
                    table.gene_count(),
                    table.tissues().len()
                );
                Ok(table)
            }
            Err(e) => {
                error!("Failed to read expression table: {}", e);
                Err(e)
            }
        }
    }
}

impl ExpressionDataset {
    fn read_table(&self) -> CoexpResult<ExpressionTable> {
        let mut reader = read_tsv(&self.path)?;
        let mut records = reader.records();

        let header = loop {
            match records.next() {
                Some(record) => {
                    let record = record.map_err(|e| record_error(&self.path, e))?;
                    if !is_blank(&record) {
                        break record;
                    }
                }
                None => return Err(CoexpError::parse(&self.path, 1, "missing header row")),
            }
        };
        let tissues: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
        debug!("Tissues: {:?}", tissues);

        let mut table = ExpressionTable::new(tissues);
        for record in records {
            let record = record.map_err(|e| record_error(&self.path, e))?;
            if is_blank(&record) {
                continue;
            }
            let line = record_line(&record);
            let gene_id = &record[0];
            if gene_id.is_empty() {
                return Err(CoexpError::parse(&self.path, line, "empty gene identifier"));
            }

            let value_count = record.len() - 1;
            if value_count > table.tissues().len() {
                return Err(CoexpError::parse(
                    &self.path,
                    line,
                    format!(
                        "gene {} has {} values but the header names {} tissues",
                        gene_id,
                        value_count,
                        table.tissues().len()
                    ),
                ));
            }

            let mut profile = ExpressionProfile::new();
            for (tissue, raw) in table.tissues().iter().zip(record.iter().skip(1)) {
                let value = parse_expression_value(raw).map_err(|message| {
                    CoexpError::parse(&self.path, line, format!("tissue {}: {}", tissue, message))
                })?;
                if let Some(value) = value {
                    profile.insert(tissue.clone(), value);
                }
            }

            if table.insert(gene_id.to_string(), profile).is_some() {
                warn!("Gene {} listed more than once, keeping line {}", gene_id, line);
            }
        }

        Ok(table)
    }
}
