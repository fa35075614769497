

pub mod config;
pub mod error;

pub use config::{CatalogBackend, PartscoutConfig, RouterConfig};
pub use error::{PartscoutError, Result};
