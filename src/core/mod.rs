pub mod adjacency;
pub mod aggregator;
pub mod dataset;
pub mod engine;
pub mod geo;
pub mod integrity;
pub mod loader;
pub mod metrics;
pub mod report;
pub mod scorer;
pub mod slug;
pub mod sweep;
pub mod variants;

pub use crate::domain::model::{LinkSet, PolicyWeights, SweepReport};
pub use crate::domain::ports::{ConfigProvider, GeoLookup, Pipeline, Scorer, Storage};
pub use crate::utils::error::Result;
