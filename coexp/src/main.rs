use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use coexp::analysis::coexpression::{CoexpressionThresholds, MAX_P_VALUE, MIN_CORRELATION, MIN_TOTAL_EXPRESSION};
use coexp::pipeline::{run, PipelineConfig};

#[derive(Debug, Parser)]
#[command(name = "coexp", about = "Find genes co-expressed with a set of candidate genes")]
struct Args {
    /// Candidate gene list (one ID per line)
    #[arg(long = "in", value_name = "FILE")]
    candidates: PathBuf,

    /// Expression table (GeneID followed by one column per tissue)
    #[arg(long = "exp", value_name = "FILE")]
    expression: PathBuf,

    /// Output directory, one <candidate>.txt report per candidate
    #[arg(long = "out", value_name = "DIR")]
    output_dir: PathBuf,

    /// Gene name mapping table (internal ID, display name)
    #[arg(long, value_name = "FILE")]
    mapping: Option<PathBuf>,

    /// Functional annotation table (ID or name, description)
    #[arg(long = "ann", value_name = "FILE")]
    annotation: Option<PathBuf>,

    /// Comparison genes must exceed this summed expression
    #[arg(long, default_value_t = MIN_TOTAL_EXPRESSION)]
    min_total_expression: f64,

    /// Spearman correlation must exceed this value
    #[arg(long, default_value_t = MIN_CORRELATION)]
    min_correlation: f64,

    /// Raw p-value must be below this value
    #[arg(long, default_value_t = MAX_P_VALUE)]
    max_p_value: f64,

    /// Worker threads (0 = all cores)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Write a JSON run summary to this path
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,
}

impl From<Args> for PipelineConfig {
    fn from(args: Args) -> Self {
        PipelineConfig {
            candidates_path: args.candidates,
            expression_path: args.expression,
            output_dir: args.output_dir,
            mapping_path: args.mapping,
            annotation_path: args.annotation,
            thresholds: CoexpressionThresholds {
                min_total_expression: args.min_total_expression,
                min_correlation: args.min_correlation,
                max_p_value: args.max_p_value,
            },
            threads: args.threads,
            summary_path: args.summary,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PipelineConfig::from(Args::parse());
    info!("Starting co-expression analysis");

    let summary = run(&config).with_context(|| {
        format!(
            "co-expression analysis of {} failed",
            config.candidates_path.display()
        )
    })?;

    info!(
        "Done. {} reports in {}",
        summary.candidates.len(),
        config.output_dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn required_flags_and_defaults() {
        let args = Args::try_parse_from(["coexp", "--in", "c.txt", "--exp", "e.tsv", "--out", "out"]).unwrap();
        let config = PipelineConfig::from(args);
        assert_eq!(config.candidates_path, PathBuf::from("c.txt"));
        assert_eq!(config.thresholds, CoexpressionThresholds::default());
        assert!(config.mapping_path.is_none());
        assert!(config.annotation_path.is_none());
        assert_eq!(config.threads, 0);
    }

    #[test]
    fn missing_required_flag_is_rejected() {
        let err = Args::try_parse_from(["coexp", "--in", "c.txt", "--out", "out"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn optional_tables_and_thresholds() {
        let args = Args::try_parse_from([
            "coexp", "--in", "c.txt", "--exp", "e.tsv", "--out", "out",
            "--mapping", "names.tsv", "--ann", "ann.tsv", "--min-correlation", "0.5",
        ])
        .unwrap();
        let config = PipelineConfig::from(args);
        assert_eq!(config.mapping_path, Some(PathBuf::from("names.tsv")));
        assert_eq!(config.annotation_path, Some(PathBuf::from("ann.tsv")));
        assert_eq!(config.thresholds.min_correlation, 0.5);
    }
}
