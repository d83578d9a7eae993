use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::analysis::correlation::spearman_correlation;
use crate::models::{CoexpressionResult, ExpressionProfile, ExpressionTable};

// --------------------------------------------------------
//  Default inclusion thresholds
// --------------------------------------------------------
pub const MIN_TOTAL_EXPRESSION: f64 = 30.0;
pub const MIN_CORRELATION: f64 = 0.3;
pub const MAX_P_VALUE: f64 = 0.05;

/// All three bounds are strict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoexpressionThresholds {
    pub min_total_expression: f64,
    pub min_correlation: f64,
    pub max_p_value: f64,
}

impl Default for CoexpressionThresholds {
    fn default() -> Self {
        CoexpressionThresholds {
            min_total_expression: MIN_TOTAL_EXPRESSION,
            min_correlation: MIN_CORRELATION,
            max_p_value: MAX_P_VALUE,
        }
    }
}

impl CoexpressionThresholds {
    pub fn admits(&self, total_expression: f64, correlation: f64, p_value: f64) -> bool {
        !correlation.is_nan()
            && total_expression > self.min_total_expression
            && correlation > self.min_correlation
            && p_value < self.max_p_value
    }
}

/// Eligibility pass: sum of the comparison gene's values over the candidate's tissues.
/// Tissues where only the candidate is NaN still count here even though the pairing
/// pass drops them.
pub fn total_expression(candidate: &ExpressionProfile, other: &ExpressionProfile) -> f64 {
    candidate
        .keys()
        .filter_map(|tissue| other.get(tissue))
        .filter(|value| !value.is_nan())
        .sum()
}

/// Pairing pass: (candidate, other) values for tissues where both are present and not NaN.
pub fn paired_values(candidate: &ExpressionProfile, other: &ExpressionProfile) -> (Vec<f64>, Vec<f64>) {
    candidate
        .iter()
        .filter_map(|(tissue, &x)| other.get(tissue).map(|&y| (x, y)))
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .unzip()
}

/// Correlates one candidate against every other gene of the table and keeps the genes
/// passing `thresholds`. The result is in table order; see [`rank_results`].
pub fn compare_candidate_against_all(
    candidate: &str,
    table: &ExpressionTable,
    thresholds: &CoexpressionThresholds,
) -> Vec<CoexpressionResult> {
    let candidate_profile = match table.profile(candidate) {
        Some(profile) => profile,
        None => {
            debug!("Candidate {} is not in the expression table", candidate);
            return Vec::new();
        }
    };

    let mut coexpressed = Vec::new();
    for (gene_id, profile) in table.genes() {
        if gene_id == candidate {
            continue;
        }

        let total = total_expression(candidate_profile, profile);
        let (x, y) = paired_values(candidate_profile, profile);
        let test = match spearman_correlation(&x, &y) {
            Some(test) => test,
            None => {
                debug!("{} vs {}: correlation undefined over {} pairs", candidate, gene_id, x.len());
                continue;
            }
        };

        if thresholds.admits(total, test.rho, test.p_value) {
            coexpressed.push(CoexpressionResult {
                gene_id: gene_id.to_string(),
                correlation: test.rho,
                p_value: test.p_value,
            });
        }
    }

    debug!("{}: {} co-expressed genes", candidate, coexpressed.len());
    coexpressed
}

/// Descending correlation; equal correlations fall back to gene id.
pub fn rank_results(results: &mut [CoexpressionResult]) {
    results.sort_by(|a, b| {
        b.correlation
            .partial_cmp(&a.correlation)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.gene_id.cmp(&b.gene_id))
    });
}
