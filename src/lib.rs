pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod host;
pub mod models;
pub mod normalize;
pub mod reference;
pub mod service;

pub use config::AppConfig;
pub use db::{create_pool, create_pool_with_retry};
pub use error::ReconError;
pub use service::ReconRunner;
