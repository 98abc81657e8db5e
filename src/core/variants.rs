use crate::domain::model::{PolicyWeights, WeightName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Smallest distance scale a variant may use.
pub const MIN_DISTANCE_SCALE_KM: f64 = 1.0;

/// How far the sweep perturbs the baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum VariantMode {
    #[default]
    Small,
    Medium,
}

impl VariantMode {
    pub fn scale_factors(self) -> [f64; 4] {
        match self {
            VariantMode::Small => [0.85, 0.95, 1.05, 1.15],
            VariantMode::Medium => [0.8, 0.9, 1.1, 1.2],
        }
    }

    pub fn distance_deltas_km(self) -> [f64; 5] {
        match self {
            VariantMode::Small => [-5.0, -2.0, 0.0, 2.0, 5.0],
            VariantMode::Medium => [-10.0, -5.0, 0.0, 5.0, 10.0],
        }
    }

    /// First factor above 1.0; the combos move by this much.
    fn up_factor(self) -> f64 {
        match self {
            VariantMode::Small => 1.05,
            VariantMode::Medium => 1.1,
        }
    }

    fn down_factor(self) -> f64 {
        match self {
            VariantMode::Small => 0.95,
            VariantMode::Medium => 0.9,
        }
    }
}

impl fmt::Display for VariantMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantMode::Small => f.write_str("small"),
            VariantMode::Medium => f.write_str("medium"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicyVariant {
    pub kind: String,
    pub weights: PolicyWeights,
}

impl PolicyVariant {
    fn new(kind: impl Into<String>, weights: PolicyWeights) -> Self {
        Self {
            kind: kind.into(),
            weights,
        }
    }
}

/// Every variant the mode describes, in generation order, duplicates included.
pub fn generate_candidate_variants(baseline: &PolicyWeights, mode: VariantMode) -> Vec<PolicyVariant> {
    let mut variants = vec![PolicyVariant::new("baseline", *baseline)];

    for name in WeightName::SCALARS {
        for factor in mode.scale_factors() {
            variants.push(PolicyVariant::new(
                format!("tweak:{}", name.key()),
                baseline.scaled(name, factor),
            ));
        }
    }

    for delta in mode.distance_deltas_km() {
        let weights = PolicyWeights {
            distance_scale_km: (baseline.distance_scale_km + delta).max(MIN_DISTANCE_SCALE_KM),
            ..*baseline
        };
        variants.push(PolicyVariant::new("tweak:distanceScaleKm", weights));
    }

    variants.push(PolicyVariant::new(
        "combo:distance+hub",
        baseline
            .scaled(WeightName::Distance, mode.up_factor())
            .scaled(WeightName::HubDamping, mode.up_factor()),
    ));
    variants.push(PolicyVariant::new(
        "combo:cluster-distance",
        baseline
            .scaled(WeightName::Cluster, mode.up_factor())
            .scaled(WeightName::Distance, mode.down_factor()),
    ));

    variants
}

/// Candidate variants with signature duplicates removed; the first
/// occurrence wins, so the baseline is always kept.
pub fn generate_variants(baseline: &PolicyWeights, mode: VariantMode) -> Vec<PolicyVariant> {
    let candidates = generate_candidate_variants(baseline, mode);
    let before = candidates.len();

    let mut seen = BTreeSet::new();
    let variants: Vec<PolicyVariant> = candidates
        .into_iter()
        .filter(|v| seen.insert(v.weights.signature()))
        .collect();

    tracing::debug!(
        "Generated {} {} variants ({} duplicates dropped)",
        variants.len(),
        mode,
        before - variants.len()
    );
    variants
}
