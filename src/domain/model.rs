use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical suburb or cluster identifier (lower-case, hyphenated).
pub type Slug = String;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "lon", alias = "longitude")]
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suburb {
    pub slug: Slug,
    pub name: String,
    pub coordinates: Option<Coordinates>,
    pub cluster_slug: Option<Slug>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub slug: Slug,
    pub name: String,
    pub suburb_slugs: Vec<Slug>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyWeights {
    pub weight_cluster: f64,
    pub weight_distance: f64,
    pub weight_reciprocal_edge: f64,
    pub weight_hub_damping: f64,
    pub distance_scale_km: f64,
}

impl Default for PolicyWeights {
    fn default() -> Self {
        Self {
            weight_cluster: 1.0,
            weight_distance: 1.0,
            weight_reciprocal_edge: 0.5,
            weight_hub_damping: 0.5,
            distance_scale_km: 10.0,
        }
    }
}

/// The four scalar weights that the variant generator perturbs multiplicatively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightName {
    Cluster,
    Distance,
    ReciprocalEdge,
    HubDamping,
}

impl WeightName {
    pub const SCALARS: [WeightName; 4] = [
        WeightName::Cluster,
        WeightName::Distance,
        WeightName::ReciprocalEdge,
        WeightName::HubDamping,
    ];

    pub fn key(self) -> &'static str {
        match self {
            WeightName::Cluster => "weightCluster",
            WeightName::Distance => "weightDistance",
            WeightName::ReciprocalEdge => "weightReciprocalEdge",
            WeightName::HubDamping => "weightHubDamping",
        }
    }
}

impl PolicyWeights {
    pub fn get(&self, name: WeightName) -> f64 {
        match name {
            WeightName::Cluster => self.weight_cluster,
            WeightName::Distance => self.weight_distance,
            WeightName::ReciprocalEdge => self.weight_reciprocal_edge,
            WeightName::HubDamping => self.weight_hub_damping,
        }
    }

    pub fn with(mut self, name: WeightName, value: f64) -> Self {
        match name {
            WeightName::Cluster => self.weight_cluster = value,
            WeightName::Distance => self.weight_distance = value,
            WeightName::ReciprocalEdge => self.weight_reciprocal_edge = value,
            WeightName::HubDamping => self.weight_hub_damping = value,
        }
        self
    }

    pub fn scaled(self, name: WeightName, factor: f64) -> Self {
        let value = self.get(name) * factor;
        self.with(name, value)
    }

    /// Identity of a configuration. Two variants with the same signature
    /// produce the same link sets and are evaluated once.
    pub fn signature(&self) -> String {
        format!(
            "c={:.6}|d={:.6}|r={:.6}|h={:.6}|s={:.6}",
            self.weight_cluster,
            self.weight_distance,
            self.weight_reciprocal_edge,
            self.weight_hub_damping,
            self.distance_scale_km
        )
    }
}

/// Where a candidate came from, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceTag {
    #[serde(rename = "self")]
    SelfLink,
    Adjacency,
    AdjacencyOverride,
    Proximity,
    Curated,
    ClusterFill,
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourceTag::SelfLink => "self",
            SourceTag::Adjacency => "adjacency",
            SourceTag::AdjacencyOverride => "adjacency-override",
            SourceTag::Proximity => "proximity",
            SourceTag::Curated => "curated",
            SourceTag::ClusterFill => "cluster-fill",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkCandidate {
    pub suburb_slug: Slug,
    pub score: f64,
    pub source_tags: Vec<SourceTag>,
}

impl LinkCandidate {
    pub fn new(suburb_slug: impl Into<Slug>, tag: SourceTag) -> Self {
        Self {
            suburb_slug: suburb_slug.into(),
            score: 0.0,
            source_tags: vec![tag],
        }
    }

    pub fn is_self(&self) -> bool {
        self.source_tags.contains(&SourceTag::SelfLink)
    }
}

/// One (service, suburb) page's related links. With `includeSelf` the page's
/// own suburb is the first entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSet {
    pub service: String,
    pub suburb: Slug,
    pub neighbors: Vec<Slug>,
}

impl LinkSet {
    /// Outbound edges to other suburbs, self-links excluded.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.neighbors
            .iter()
            .filter(move |n| **n != self.suburb)
            .map(move |n| (self.suburb.as_str(), n.as_str()))
    }
}

/// Inbound selections per suburb within one batch (one variant run).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundTally {
    counts: BTreeMap<Slug, usize>,
}

impl InboundTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, slug: &str) -> usize {
        self.counts.get(slug).copied().unwrap_or(0)
    }

    pub fn record(&mut self, slug: &str) {
        *self.counts.entry(slug.to_string()).or_insert(0) += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepMetrics {
    pub gini: f64,
    pub avg_km: Option<f64>,
    pub cluster_purity: f64,
    pub total_links: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepResult {
    pub kind: String,
    pub weights: PolicyWeights,
    pub metrics: SweepMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub generated_at: String,
    pub service: String,
    pub variants_tried: usize,
    pub ranking: Vec<SweepResult>,
}
