pub mod pool;
pub mod queries;
pub mod staging;

pub use pool::{create_pool, create_pool_with_retry};
