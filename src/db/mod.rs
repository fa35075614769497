

pub mod catalog;
pub mod client;
pub mod memory;

pub use catalog::{CatalogError, CatalogStore, HelixCatalog, ProductRecord};
pub use client::{HelixClient, HelixClientError};
pub use memory::InMemoryCatalog;
