use crate::config::PolicyConfig;
use crate::core::aggregator::CandidateAggregator;
use crate::core::dataset::GeoDataset;
use crate::core::geo::haversine_km;
use crate::domain::model::{InboundTally, LinkCandidate, LinkSet, PolicyWeights, Slug};
use crate::domain::ports::{GeoLookup, Scorer};

/// Linear scoring over four signals:
///
/// ```text
/// score = weightCluster        * same_cluster
///       + weightDistance       * exp(-km / distanceScaleKm)
///       - weightHubDamping     * ln(1 + inbound)
///       + weightReciprocalEdge * reciprocal
/// ```
///
/// A missing coordinate on either side zeroes the distance term. Self-links
/// are never scored and stay at the head of the list.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedScorer;

impl WeightedScorer {
    pub fn score_one(
        &self,
        geo: &dyn GeoLookup,
        target: &str,
        candidate: &str,
        weights: &PolicyWeights,
        inbound: &InboundTally,
    ) -> f64 {
        let same_cluster = match (geo.cluster_of(target), geo.cluster_of(candidate)) {
            (Some(a), Some(b)) if a == b => 1.0,
            _ => 0.0,
        };

        let distance_decay = match (geo.coordinates_of(target), geo.coordinates_of(candidate)) {
            (Some(a), Some(b)) if weights.distance_scale_km > 0.0 => {
                (-haversine_km(a, b) / weights.distance_scale_km).exp()
            }
            _ => 0.0,
        };

        let hub_penalty = (1.0 + inbound.count(candidate) as f64).ln();

        let reciprocal = if geo.is_adjacent(candidate, target) {
            1.0
        } else {
            0.0
        };

        weights.weight_cluster * same_cluster + weights.weight_distance * distance_decay
            - weights.weight_hub_damping * hub_penalty
            + weights.weight_reciprocal_edge * reciprocal
    }
}

impl Scorer for WeightedScorer {
    fn score(
        &self,
        geo: &dyn GeoLookup,
        target: &str,
        candidates: Vec<LinkCandidate>,
        weights: &PolicyWeights,
        inbound: &InboundTally,
    ) -> Vec<LinkCandidate> {
        let (pinned, rest): (Vec<_>, Vec<_>) = candidates.into_iter().partition(LinkCandidate::is_self);

        let mut ranked: Vec<(usize, LinkCandidate)> = rest
            .into_iter()
            .enumerate()
            .map(|(position, mut candidate)| {
                candidate.score = self.score_one(geo, target, &candidate.suburb_slug, weights, inbound);
                (position, candidate)
            })
            .collect();

        ranked.sort_by(|(pa, a), (pb, b)| {
            b.score
                .total_cmp(&a.score)
                .then(pa.cmp(pb))
                .then_with(|| a.suburb_slug.cmp(&b.suburb_slug))
        });

        pinned
            .into_iter()
            .chain(ranked.into_iter().map(|(_, candidate)| candidate))
            .collect()
    }
}

/// Picks the final neighbors from a ranked list.
///
/// Up to `neighbors_max` non-self candidates are taken in rank order. Those
/// already at `global_inbound_cap` are passed over, and only taken back (best
/// first) when the page would otherwise end up with fewer than
/// `neighbors_min`. Self-links are kept and do not count against either bound.
pub fn select_neighbors(
    ranked: &[LinkCandidate],
    policy: &PolicyConfig,
    inbound: &InboundTally,
) -> Vec<Slug> {
    let capped = |slug: &str| {
        policy
            .global_inbound_cap
            .is_some_and(|cap| inbound.count(slug) >= cap)
    };

    let mut chosen = vec![false; ranked.len()];
    let mut picked = 0;
    let mut deferred = Vec::new();

    for (i, candidate) in ranked.iter().enumerate() {
        if candidate.is_self() {
            chosen[i] = true;
        } else if picked < policy.neighbors_max {
            if capped(&candidate.suburb_slug) {
                deferred.push(i);
            } else {
                chosen[i] = true;
                picked += 1;
            }
        }
    }

    for i in deferred {
        if picked >= policy.neighbors_min.min(policy.neighbors_max) {
            break;
        }
        chosen[i] = true;
        picked += 1;
    }

    ranked
        .iter()
        .zip(chosen)
        .filter(|(_, keep)| *keep)
        .map(|(candidate, _)| candidate.suburb_slug.clone())
        .collect()
}

/// Produces `LinkSet`s for a whole service: aggregate, score, select, with
/// one inbound tally shared across the batch so hub damping sees earlier
/// selections.
pub struct LinkRecommender<'a, S: Scorer = WeightedScorer> {
    dataset: &'a GeoDataset,
    policy: &'a PolicyConfig,
    scorer: S,
}

impl<'a> LinkRecommender<'a, WeightedScorer> {
    pub fn new(dataset: &'a GeoDataset, policy: &'a PolicyConfig) -> Self {
        Self::with_scorer(dataset, policy, WeightedScorer)
    }
}

impl<'a, S: Scorer> LinkRecommender<'a, S> {
    pub fn with_scorer(dataset: &'a GeoDataset, policy: &'a PolicyConfig, scorer: S) -> Self {
        Self {
            dataset,
            policy,
            scorer,
        }
    }

    /// One page's link set, recording its selections in `inbound`.
    pub fn recommend(
        &self,
        service: &str,
        suburb: &str,
        weights: &PolicyWeights,
        inbound: &mut InboundTally,
    ) -> LinkSet {
        let aggregator = CandidateAggregator::new(self.dataset, self.policy.proximity_depth);
        let candidates = aggregator.aggregate(service, suburb, self.policy.include_self);
        let ranked = self
            .scorer
            .score(self.dataset, suburb, candidates, weights, inbound);
        let neighbors = select_neighbors(&ranked, self.policy, inbound);

        for neighbor in neighbors.iter().filter(|n| n.as_str() != suburb) {
            inbound.record(neighbor);
        }

        LinkSet {
            service: service.to_string(),
            suburb: suburb.to_string(),
            neighbors,
        }
    }

    /// Every covered suburb of `service`, in slug order.
    pub fn recommend_batch(&self, service: &str, weights: &PolicyWeights) -> Vec<LinkSet> {
        let mut inbound = InboundTally::new();
        let sets: Vec<LinkSet> = self
            .dataset
            .targets_for(service)
            .map(|suburb| self.recommend(service, suburb, weights, &mut inbound))
            .collect();

        tracing::debug!(
            "Recommended links for {} pages of {} ({} edges)",
            sets.len(),
            service,
            sets.iter().map(|s| s.edges().count()).sum::<usize>()
        );
        sets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use crate::core::test_support::{documents, located_dataset};
    use crate::domain::model::SourceTag;
    use serde_json::json;

    fn policy() -> PolicyConfig {
        PolicyConfig::default()
    }

    #[test]
    fn test_cluster_mate_outranks_same_distance_outsider() {
        // both candidates ~3 km from the target, one shares its cluster
        let docs = documents(
            json!({"ipswich": ["goodna", "redbank"], "logan": ["woodridge"]}),
            json!({"goodna": ["redbank"], "redbank": ["goodna"]}),
            json!([
                {"slug": "goodna", "lat": 0.0, "lng": 0.0},
                {"slug": "redbank", "lat": 0.027, "lng": 0.0},
                {"slug": "woodridge", "lat": -0.027, "lng": 0.0}
            ]),
        );
        let dataset = GeoDataset::assemble(docs, &DatasetConfig::default(), false);
        let weights = PolicyWeights::default();
        let inbound = InboundTally::new();

        let mate = WeightedScorer.score_one(&dataset, "goodna", "redbank", &weights, &inbound);
        let outsider = WeightedScorer.score_one(&dataset, "goodna", "woodridge", &weights, &inbound);
        // cluster bonus (1.0) plus reciprocal bonus (0.5) at equal distance
        assert!((mate - outsider - 1.5).abs() < 1e-9);

        let ranked = WeightedScorer.score(
            &dataset,
            "goodna",
            vec![
                LinkCandidate::new("woodridge", SourceTag::Proximity),
                LinkCandidate::new("redbank", SourceTag::Proximity),
            ],
            &weights,
            &inbound,
        );
        assert_eq!(ranked[0].suburb_slug, "redbank");
    }

    #[test]
    fn test_missing_coordinates_zero_distance_term() {
        let dataset = located_dataset(&[("a", Some("x"), None), ("b", Some("x"), Some((0.0, 0.0)))]);
        let score = WeightedScorer.score_one(
            &dataset,
            "a",
            "b",
            &PolicyWeights::default(),
            &InboundTally::new(),
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_hub_penalty_uses_batch_inbound() {
        let dataset = located_dataset(&[("a", None, None), ("b", None, None)]);
        let mut inbound = InboundTally::new();
        inbound.record("b");
        inbound.record("b");
        inbound.record("b");

        let score = WeightedScorer.score_one(&dataset, "a", "b", &PolicyWeights::default(), &inbound);
        assert!((score + 0.5 * 4f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_ties_keep_aggregator_order() {
        let dataset = located_dataset(&[("t", None, None), ("z", None, None), ("m", None, None)]);
        let ranked = WeightedScorer.score(
            &dataset,
            "t",
            vec![
                LinkCandidate::new("z", SourceTag::Curated),
                LinkCandidate::new("m", SourceTag::ClusterFill),
            ],
            &PolicyWeights::default(),
            &InboundTally::new(),
        );
        let order: Vec<&str> = ranked.iter().map(|c| c.suburb_slug.as_str()).collect();
        assert_eq!(order, vec!["z", "m"]);
    }

    #[test]
    fn test_isolated_suburb_links_to_itself() {
        let dataset = located_dataset(&[("lonely", None, None), ("elsewhere", Some("far"), None)]);
        let policy = PolicyConfig {
            include_self: true,
            ..policy()
        };
        let recommender = LinkRecommender::new(&dataset, &policy);
        let mut inbound = InboundTally::new();

        let set = recommender.recommend("bond-cleaning", "lonely", &PolicyWeights::default(), &mut inbound);
        assert_eq!(set.neighbors, vec!["lonely".to_string()]);
        assert_eq!(set.edges().count(), 0);
        assert_eq!(inbound.count("lonely"), 0);
    }

    #[test]
    fn test_selection_honours_max_and_cap() {
        let ranked: Vec<LinkCandidate> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|s| LinkCandidate::new(*s, SourceTag::Proximity))
            .collect();
        let mut inbound = InboundTally::new();
        inbound.record("a");
        inbound.record("b");

        let policy = PolicyConfig {
            neighbors_max: 3,
            neighbors_min: 3,
            global_inbound_cap: Some(1),
            ..policy()
        };
        assert_eq!(select_neighbors(&ranked, &policy, &inbound), vec!["c", "d", "e"]);

        // not enough uncapped candidates: the best capped ones fill up to the floor
        let policy = PolicyConfig {
            neighbors_max: 4,
            neighbors_min: 4,
            ..policy
        };
        assert_eq!(
            select_neighbors(&ranked, &policy, &inbound),
            vec!["a", "c", "d", "e"]
        );
    }

    #[test]
    fn test_batch_is_deterministic_and_dampens_hubs() {
        let dataset = located_dataset(&[
            ("hub", Some("north"), Some((0.0, 0.0))),
            ("a", Some("north"), Some((0.0, 0.02))),
            ("b", Some("north"), Some((0.02, 0.0))),
            ("c", Some("north"), Some((0.0, -0.02))),
            ("d", Some("north"), Some((-0.02, 0.0))),
        ]);
        let policy = PolicyConfig {
            neighbors_max: 1,
            neighbors_min: 1,
            weight_hub_damping: 5.0,
            ..policy()
        };
        let recommender = LinkRecommender::new(&dataset, &policy);
        let weights = policy.weights();

        let first = recommender.recommend_batch("svc", &weights);
        let second = recommender.recommend_batch("svc", &weights);
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);

        // "a" picks the hub first; a heavy damping weight then steers later
        // pages away from it
        assert_eq!(first[0].suburb, "a");
        assert_eq!(first[0].neighbors, vec!["hub"]);
        let hub_inbound = first
            .iter()
            .filter(|s| s.neighbors.contains(&"hub".to_string()))
            .count();
        assert!(hub_inbound < 4);
    }
}
