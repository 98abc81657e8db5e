use crate::domain::model::PolicyWeights;
use crate::utils::error::{GeoLinkError, Result};
use crate::utils::validation::{
    validate_positive_number, validate_range, validate_strictly_positive, validate_weight, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The policy block: scoring weights plus selection limits.
///
/// Keys are camelCase to match the JSON block the content pipeline already
/// ships; keys this struct does not know are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyConfig {
    pub weight_cluster: f64,
    pub weight_distance: f64,
    pub weight_reciprocal_edge: f64,
    pub weight_hub_damping: f64,
    pub distance_scale_km: f64,
    pub neighbors_max: usize,
    pub neighbors_min: usize,
    /// Selections a single suburb may receive per batch before it is only
    /// used to reach `neighbors_min`.
    pub global_inbound_cap: Option<usize>,
    /// Add missing back-edges to the adjacency graph after loading.
    pub enforce_reciprocity: bool,
    /// How many nearest suburbs the proximity source contributes.
    pub proximity_depth: usize,
    pub include_self: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let weights = PolicyWeights::default();
        Self {
            weight_cluster: weights.weight_cluster,
            weight_distance: weights.weight_distance,
            weight_reciprocal_edge: weights.weight_reciprocal_edge,
            weight_hub_damping: weights.weight_hub_damping,
            distance_scale_km: weights.distance_scale_km,
            neighbors_max: 6,
            neighbors_min: 3,
            global_inbound_cap: None,
            enforce_reciprocity: false,
            proximity_depth: 8,
            include_self: false,
        }
    }
}

impl PolicyConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GeoLinkError::IoError)?;
        Self::from_json_str(&content).map_err(|e| match e {
            GeoLinkError::ConfigValidationError { message, .. } => {
                GeoLinkError::ConfigValidationError {
                    field: path.as_ref().display().to_string(),
                    message,
                }
            }
            other => other,
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| GeoLinkError::ConfigValidationError {
            field: "policy".to_string(),
            message: format!("JSON parsing error: {}", e),
        })
    }

    pub fn weights(&self) -> PolicyWeights {
        PolicyWeights {
            weight_cluster: self.weight_cluster,
            weight_distance: self.weight_distance,
            weight_reciprocal_edge: self.weight_reciprocal_edge,
            weight_hub_damping: self.weight_hub_damping,
            distance_scale_km: self.distance_scale_km,
        }
    }
}

impl Validate for PolicyConfig {
    fn validate(&self) -> Result<()> {
        validate_weight("policy.weightCluster", self.weight_cluster)?;
        validate_weight("policy.weightDistance", self.weight_distance)?;
        validate_weight("policy.weightReciprocalEdge", self.weight_reciprocal_edge)?;
        validate_weight("policy.weightHubDamping", self.weight_hub_damping)?;
        validate_strictly_positive("policy.distanceScaleKm", self.distance_scale_km)?;
        validate_positive_number("policy.neighborsMax", self.neighbors_max, 1)?;
        validate_range("policy.proximityDepth", self.proximity_depth, 1, 256)?;

        if self.neighbors_min > self.neighbors_max {
            return Err(GeoLinkError::InvalidConfigValueError {
                field: "policy.neighborsMin".to_string(),
                value: self.neighbors_min.to_string(),
                reason: format!("Must not exceed neighborsMax ({})", self.neighbors_max),
            });
        }

        if let Some(cap) = self.global_inbound_cap {
            validate_positive_number("policy.globalInboundCap", cap, 1)?;
        }

        Ok(())
    }
}
