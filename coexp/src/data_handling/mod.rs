pub mod candidates;
pub mod expression_atlas;
pub mod mapping_table;
