use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::analysis::coexpression::{compare_candidate_against_all, rank_results, CoexpressionThresholds};
use crate::data_handling::candidates::CandidateList;
use crate::data_handling::expression_atlas::ExpressionDataset;
use crate::data_handling::mapping_table::load_optional_mapping;
use crate::helper_functions::ensure_output_dir;
use crate::models::{CoexpError, CoexpResult, Dataset, ExpressionTable};
use crate::report::{report_path, write_candidate_report, Annotator};

/// Everything one run needs, as collected from the command line.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub candidates_path: PathBuf,
    pub expression_path: PathBuf,
    pub output_dir: PathBuf,
    pub mapping_path: Option<PathBuf>,
    pub annotation_path: Option<PathBuf>,
    pub thresholds: CoexpressionThresholds,
    /// Worker threads for candidate processing; 0 lets rayon decide.
    pub threads: usize,
    pub summary_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub candidate: String,
    pub in_expression_table: bool,
    pub coexpressed_genes: usize,
    pub report: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub gene_count: usize,
    pub tissue_count: usize,
    pub thresholds: CoexpressionThresholds,
    pub candidates: Vec<CandidateSummary>,
}

pub fn run(config: &PipelineConfig) -> CoexpResult<RunSummary> {
    let names = load_optional_mapping(config.mapping_path.as_deref())?;
    let annotations = load_optional_mapping(config.annotation_path.as_deref())?;
    ensure_output_dir(&config.output_dir)?;

    let table = ExpressionDataset {
        path: config.expression_path.clone(),
    }
    .load()?;
    let candidates = CandidateList {
        path: config.candidates_path.clone(),
    }
    .load()?;

    let annotator = Annotator::new(&names, &annotations);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;

    info!(
        "Scoring {} candidates against {} genes on {} threads",
        candidates.len(),
        table.gene_count(),
        pool.current_num_threads()
    );
    let summaries = pool.install(|| {
        candidates
            .par_iter()
            .map(|candidate| {
                process_candidate(candidate, &table, &annotator, &config.thresholds, &config.output_dir)
            })
            .collect::<CoexpResult<Vec<_>>>()
    })?;

    let summary = RunSummary {
        gene_count: table.gene_count(),
        tissue_count: table.tissues().len(),
        thresholds: config.thresholds,
        candidates: summaries,
    };

    if let Some(path) = &config.summary_path {
        write_summary(path, &summary)?;
    }

    Ok(summary)
}

fn process_candidate(
    candidate: &str,
    table: &ExpressionTable,
    annotator: &Annotator<'_>,
    thresholds: &CoexpressionThresholds,
    output_dir: &Path,
) -> CoexpResult<CandidateSummary> {
    let in_expression_table = table.contains(candidate);
    if !in_expression_table {
        warn!("{} has no expression profile, writing an empty report", candidate);
    }

    let mut coexpressed = compare_candidate_against_all(candidate, table, thresholds);
    rank_results(&mut coexpressed);

    let path = report_path(output_dir, candidate);
    write_candidate_report(&path, candidate, &coexpressed, annotator, table.gene_count())?;
    info!("{}: {} co-expressed genes -> {}", candidate, coexpressed.len(), path.display());

    Ok(CandidateSummary {
        candidate: candidate.to_string(),
        in_expression_table,
        coexpressed_genes: coexpressed.len(),
        report: path,
    })
}

fn write_summary(path: &Path, summary: &RunSummary) -> CoexpResult<()> {
    let file = File::create(path).map_err(|e| CoexpError::io(path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)?;
    info!("Run summary written to {}", path.display());
    Ok(())
}
