pub mod coexpression;
pub mod correlation;
