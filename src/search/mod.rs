

pub mod cache;
pub mod router;
pub mod vector;

pub use cache::{CacheStats, SearchCache};
pub use router::{QueryRouter, RouterError, RoutedResults};
pub use vector::{cosine_similarity, VectorIndex, VectorSearchError};
