use std::path::{Path, PathBuf};

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::models::{AnnotationMapping, CoexpError, CoexpResult, CoexpressionResult, NameMapping};

pub const REPORT_HEADER: [&str; 5] = [
    "CandidateGene",
    "GeneID",
    "SpearmanCorrelation",
    "adjusted_p-value",
    "FunctionalAnnotation",
];

pub const MISSING_ANNOTATION: &str = "N/A";

/// Resolves display names and functional annotations for report rows.
pub struct Annotator<'a> {
    names: &'a NameMapping,
    annotations: &'a AnnotationMapping,
}

impl<'a> Annotator<'a> {
    pub fn new(names: &'a NameMapping, annotations: &'a AnnotationMapping) -> Self {
        Annotator { names, annotations }
    }

    pub fn display_name<'s>(&'s self, gene_id: &'s str) -> &'s str {
        self.names.get(gene_id).map(String::as_str).unwrap_or(gene_id)
    }

    /// Annotation keyed by display name, then by raw id, then [`MISSING_ANNOTATION`].
    pub fn annotation(&self, gene_id: &str) -> &'a str {
        let names: &'a NameMapping = self.names;
        let annotations: &'a AnnotationMapping = self.annotations;

        let by_display_name = || names.get(gene_id).and_then(|name| annotations.get(name));
        let by_raw_id = || annotations.get(gene_id);

        by_display_name()
            .or_else(by_raw_id)
            .map(String::as_str)
            .unwrap_or(MISSING_ANNOTATION)
    }
}

/// Bonferroni-style correction by the number of genes in the expression table.
/// Not clamped to 1.
pub fn adjusted_p_value(raw_p_value: f64, gene_count: usize) -> f64 {
    raw_p_value * gene_count as f64
}

/// Shortest round-trippable text for a report number. Very small or very large
/// magnitudes use scientific notation (`1e-37`) instead of a long decimal expansion.
pub fn format_number(value: f64) -> String {
    let magnitude = value.abs();
    if value != 0.0 && magnitude.is_finite() && !(1e-4..1e16).contains(&magnitude) {
        format!("{:e}", value)
    } else {
        value.to_string()
    }
}

pub fn report_path(output_dir: &Path, candidate: &str) -> PathBuf {
    output_dir.join(format!("{}.txt", candidate))
}

/// Writes one candidate's ranked results as a tab-separated report.
pub fn write_candidate_report(
    path: &Path,
    candidate: &str,
    ranked: &[CoexpressionResult],
    annotator: &Annotator<'_>,
    gene_count: usize,
) -> CoexpResult<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Never)
        .from_path(path)?;
    wtr.write_record(REPORT_HEADER)?;

    let candidate_name = annotator.display_name(candidate);
    for entry in ranked {
        let correlation = format_number(entry.correlation);
        let adjusted = format_number(adjusted_p_value(entry.p_value, gene_count));
        wtr.write_record([
            candidate_name,
            annotator.display_name(&entry.gene_id),
            correlation.as_str(),
            adjusted.as_str(),
            annotator.annotation(&entry.gene_id),
        ])?;
    }
    wtr.flush().map_err(|e| CoexpError::io(path, e))?;

    debug!("Wrote {} rows to {}", ranked.len(), path.display());
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "CandidateGene")]
    pub candidate: String,
    #[serde(rename = "GeneID")]
    pub gene: String,
    #[serde(rename = "SpearmanCorrelation")]
    pub correlation: f64,
    #[serde(rename = "adjusted_p-value")]
    pub adjusted_p_value: f64,
    #[serde(rename = "FunctionalAnnotation")]
    pub annotation: String,
}

/// Reads a report written by [`write_candidate_report`].
pub fn read_candidate_report(path: &Path) -> CoexpResult<Vec<ReportRow>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .from_path(path)?;
    let rows = reader.deserialize().collect::<Result<Vec<ReportRow>, _>>()?;
    Ok(rows)
}
