pub mod matcher;
pub mod mirror;
pub mod phases;
pub mod postprocess;
pub mod runner;
pub mod subset_sum;

pub use phases::{PhaseContext, PhaseEngine, PhaseOutcome};
pub use runner::ReconRunner;
