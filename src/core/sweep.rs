use crate::config::PolicyConfig;
use crate::core::dataset::GeoDataset;
use crate::core::metrics::MetricEvaluator;
use crate::core::scorer::LinkRecommender;
use crate::core::variants::{generate_variants, PolicyVariant, VariantMode};
use crate::domain::model::{SweepReport, SweepResult};
use std::cmp::Ordering;

/// Sweep ranking: lower Gini first, then shorter average distance (variants
/// with no measurable distance last), then higher cluster purity. Equal
/// results keep generation order because the sort is stable.
pub fn compare_results(a: &SweepResult, b: &SweepResult) -> Ordering {
    let (ma, mb) = (&a.metrics, &b.metrics);
    ma.gini
        .total_cmp(&mb.gini)
        .then_with(|| match (ma.avg_km, mb.avg_km) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| mb.cluster_purity.total_cmp(&ma.cluster_purity))
}

pub fn rank_results(results: &mut [SweepResult]) {
    results.sort_by(compare_results);
}

/// Runs every variant of one service over the same dataset, one after another.
pub struct SweepRunner<'a> {
    dataset: &'a GeoDataset,
    policy: &'a PolicyConfig,
}

impl<'a> SweepRunner<'a> {
    pub fn new(dataset: &'a GeoDataset, policy: &'a PolicyConfig) -> Self {
        Self { dataset, policy }
    }

    pub fn evaluate_variant(&self, service: &str, variant: &PolicyVariant) -> SweepResult {
        let link_sets = LinkRecommender::new(self.dataset, self.policy)
            .recommend_batch(service, &variant.weights);
        let metrics = MetricEvaluator::new(self.dataset).evaluate(&link_sets);

        tracing::debug!(
            "{}: gini={:.4} avgKm={:?} purity={:.3} links={}",
            variant.kind,
            metrics.gini,
            metrics.avg_km,
            metrics.cluster_purity,
            metrics.total_links
        );

        SweepResult {
            kind: variant.kind.clone(),
            weights: variant.weights,
            metrics,
        }
    }

    /// Evaluates the variants of `mode`, ranks them and keeps the best `top`.
    pub fn run(&self, service: &str, mode: VariantMode, top: usize) -> SweepReport {
        let variants = generate_variants(&self.policy.weights(), mode);
        tracing::info!(
            "🔬 Sweeping {} {} variants for {} ({} pages)",
            variants.len(),
            mode,
            service,
            self.dataset.targets_for(service).count()
        );

        let mut ranking: Vec<SweepResult> = variants
            .iter()
            .map(|variant| self.evaluate_variant(service, variant))
            .collect();
        rank_results(&mut ranking);
        ranking.truncate(top);

        if let Some(best) = ranking.first() {
            tracing::info!(
                "🏆 Best variant {} (gini {:.4}, purity {:.3})",
                best.kind,
                best.metrics.gini,
                best.metrics.cluster_purity
            );
        }

        SweepReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            service: service.to_string(),
            variants_tried: variants.len(),
            ranking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::located_dataset;
    use crate::domain::model::{PolicyWeights, SweepMetrics};

    fn result(kind: &str, gini: f64, avg_km: Option<f64>, purity: f64) -> SweepResult {
        SweepResult {
            kind: kind.to_string(),
            weights: PolicyWeights::default(),
            metrics: SweepMetrics {
                gini,
                avg_km,
                cluster_purity: purity,
                total_links: 10,
            },
        }
    }

    #[test]
    fn test_rank_results_ordering() {
        let mut results = vec![
            result("no-distance", 0.1, None, 0.9),
            result("far", 0.1, Some(9.0), 0.9),
            result("near-impure", 0.1, Some(3.0), 0.2),
            result("near-pure", 0.1, Some(3.0), 0.8),
            result("unfair", 0.4, Some(1.0), 1.0),
            result("fair", 0.05, Some(20.0), 0.0),
            result("near-pure-later", 0.1, Some(3.0), 0.8),
        ];
        rank_results(&mut results);

        let kinds: Vec<&str> = results.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["fair", "near-pure", "near-pure-later", "near-impure", "far", "no-distance", "unfair"]
        );
    }

    #[test]
    fn test_sweep_ranking_is_monotonic_and_truncated() {
        let dataset = located_dataset(&[
            ("a", Some("north"), Some((0.0, 0.0))),
            ("b", Some("north"), Some((0.0, 0.03))),
            ("c", Some("north"), Some((0.03, 0.0))),
            ("d", Some("south"), Some((0.1, 0.1))),
            ("e", Some("south"), Some((0.12, 0.1))),
            ("f", Some("south"), Some((0.1, 0.13))),
        ]);
        let policy = PolicyConfig {
            neighbors_max: 2,
            neighbors_min: 1,
            ..PolicyConfig::default()
        };

        let report = SweepRunner::new(&dataset, &policy).run("bond-cleaning", VariantMode::Small, 5);

        assert_eq!(report.service, "bond-cleaning");
        assert_eq!(report.variants_tried, 23);
        assert_eq!(report.ranking.len(), 5);
        for pair in report.ranking.windows(2) {
            assert_ne!(compare_results(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    #[test]
    fn test_sweep_is_deterministic() {
        let dataset = located_dataset(&[
            ("a", Some("north"), Some((0.0, 0.0))),
            ("b", Some("north"), Some((0.0, 0.02))),
            ("c", Some("east"), Some((0.02, 0.0))),
        ]);
        let policy = PolicyConfig::default();
        let runner = SweepRunner::new(&dataset, &policy);

        let first = runner.run("svc", VariantMode::Medium, 10);
        let second = runner.run("svc", VariantMode::Medium, 10);
        assert_eq!(first.ranking, second.ranking);
    }
}
