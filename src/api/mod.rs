pub mod handlers;

pub use handlers::{health_check, run_recon, AppState};
