//! Co-expression analysis for candidate genes.
//!
//! Every candidate's expression profile is correlated (Spearman) against all other
//! genes of a tissue x gene expression matrix. Sufficiently expressed genes with a
//! significant positive correlation end up in a ranked, annotated report per candidate.

pub mod analysis;
pub mod data_handling;
pub mod helper_functions;
pub mod models;
pub mod pipeline;
pub mod report;
