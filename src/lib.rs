pub mod api;
pub mod cache;
pub mod enricher;
pub mod export;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod utils;

pub use cache::EtfCache;
pub use models::{Config, EnrichedRecord, NormalizedRecord};
pub use pipeline::Pipeline;
