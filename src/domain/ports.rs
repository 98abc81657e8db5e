use crate::domain::model::{Coordinates, InboundTally, LinkCandidate, PolicyWeights};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn dataset(&self) -> &crate::config::DatasetConfig;
    fn policy(&self) -> &crate::config::PolicyConfig;
    fn sweep(&self) -> &crate::config::SweepConfig;
    fn output(&self) -> &crate::config::OutputConfig;
}

/// Read-only geography the scorer needs. Implemented by the loaded dataset.
pub trait GeoLookup {
    fn cluster_of(&self, slug: &str) -> Option<&str>;
    fn coordinates_of(&self, slug: &str) -> Option<Coordinates>;
    /// True when `from`'s adjacency list names `to`.
    fn is_adjacent(&self, from: &str, to: &str) -> bool;
}

/// Scores an aggregator-ordered candidate list for one target and returns it
/// ranked best first.
pub trait Scorer {
    fn score(
        &self,
        geo: &dyn GeoLookup,
        target: &str,
        candidates: Vec<LinkCandidate>,
        weights: &PolicyWeights,
        inbound: &InboundTally,
    ) -> Vec<LinkCandidate>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Loaded: Send;
    type Computed: Send;

    async fn extract(&self) -> Result<Self::Loaded>;
    async fn transform(&self, data: Self::Loaded) -> Result<Self::Computed>;
    async fn load(&self, result: Self::Computed) -> Result<String>;
}
