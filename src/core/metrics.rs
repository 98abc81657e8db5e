use crate::core::geo::haversine_km;
use crate::domain::model::{LinkSet, Slug, SweepMetrics};
use crate::domain::ports::GeoLookup;
use std::collections::BTreeMap;

/// Gini coefficient of a non-negative distribution: 0 when every value is
/// equal, approaching 1 as one value takes everything. Empty and all-zero
/// inputs are 0.
pub fn gini(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let total: f64 = sorted.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let mut running = 0.0;
    let cumulative: f64 = sorted
        .iter()
        .map(|value| {
            running += value;
            running
        })
        .sum();

    let n = n as f64;
    ((n + 1.0 - 2.0 * cumulative / total) / n).clamp(0.0, 1.0)
}

/// Scores one batch of link sets on fairness, locality and cohesion.
pub struct MetricEvaluator<'a> {
    geo: &'a dyn GeoLookup,
}

impl<'a> MetricEvaluator<'a> {
    pub fn new(geo: &'a dyn GeoLookup) -> Self {
        Self { geo }
    }

    pub fn evaluate(&self, link_sets: &[LinkSet]) -> SweepMetrics {
        // population: every page and every linked suburb, zero counts included
        let mut inbound: BTreeMap<&Slug, usize> = BTreeMap::new();
        let mut total_links = 0;
        let mut same_cluster = 0;
        let mut km_sum = 0.0;
        let mut km_pairs = 0;

        for set in link_sets {
            inbound.entry(&set.suburb).or_insert(0);
            for neighbor in &set.neighbors {
                let count = inbound.entry(neighbor).or_insert(0);
                if *neighbor == set.suburb {
                    continue;
                }
                *count += 1;
                total_links += 1;

                if let (Some(a), Some(b)) = (self.geo.cluster_of(&set.suburb), self.geo.cluster_of(neighbor)) {
                    if a == b {
                        same_cluster += 1;
                    }
                }
                if let (Some(a), Some(b)) = (
                    self.geo.coordinates_of(&set.suburb),
                    self.geo.coordinates_of(neighbor),
                ) {
                    km_sum += haversine_km(a, b);
                    km_pairs += 1;
                }
            }
        }

        let counts: Vec<f64> = inbound.values().map(|&c| c as f64).collect();

        SweepMetrics {
            gini: gini(&counts),
            avg_km: (km_pairs > 0).then(|| km_sum / km_pairs as f64),
            cluster_purity: if total_links > 0 {
                same_cluster as f64 / total_links as f64
            } else {
                0.0
            },
            total_links,
        }
    }
}
