use crate::core::dataset::GeoDataset;
use crate::domain::model::{LinkCandidate, Slug, SourceTag};
use crate::domain::ports::GeoLookup;
use std::collections::BTreeMap;

/// Merges the link sources for one (service, suburb) page into a single
/// precedence-ordered candidate list:
///
/// 1. adjacency overrides when the dataset ships them, else the adjacency graph
/// 2. proximity ranking
/// 3. curated neighbors for the suburb's cluster
/// 4. the rest of the cluster, alphabetically
///
/// A later source only appends slugs that are not already present; a slug
/// named by several sources keeps its first position and collects every tag.
pub struct CandidateAggregator<'a> {
    dataset: &'a GeoDataset,
    proximity_depth: usize,
}

impl<'a> CandidateAggregator<'a> {
    pub fn new(dataset: &'a GeoDataset, proximity_depth: usize) -> Self {
        Self {
            dataset,
            proximity_depth,
        }
    }

    pub fn aggregate(&self, service: &str, suburb: &str, include_self: bool) -> Vec<LinkCandidate> {
        let mut pool = CandidatePool::new(suburb);

        match self.dataset.overrides() {
            Some(overrides) if overrides.has_entry(suburb) => {
                pool.extend(overrides.neighbors(suburb), SourceTag::AdjacencyOverride)
            }
            _ => pool.extend(self.dataset.adjacency().neighbors(suburb), SourceTag::Adjacency),
        }

        pool.extend(
            self.dataset
                .proximity()
                .nearest(suburb, self.proximity_depth)
                .map(|(slug, _)| slug),
            SourceTag::Proximity,
        );

        pool.extend(self.dataset.curated_for(suburb), SourceTag::Curated);

        if let Some(cluster) = self.dataset.cluster_of(suburb).and_then(|c| self.dataset.cluster(c)) {
            // suburb_slugs is kept sorted by the loader
            pool.extend(&cluster.suburb_slugs, SourceTag::ClusterFill);
        }

        let mut candidates: Vec<LinkCandidate> = pool
            .into_candidates()
            .into_iter()
            .filter(|c| self.dataset.is_covered(service, &c.suburb_slug))
            .collect();

        if candidates.is_empty() {
            tracing::debug!(
                "No eligible candidates for {}/{}, falling back to self-link",
                service,
                suburb
            );
            return vec![LinkCandidate::new(suburb, SourceTag::SelfLink)];
        }

        if include_self {
            candidates.insert(0, LinkCandidate::new(suburb, SourceTag::SelfLink));
        }

        candidates
    }
}

/// Insertion-ordered, de-duplicated candidate accumulator.
struct CandidatePool<'t> {
    target: &'t str,
    order: Vec<LinkCandidate>,
    index: BTreeMap<Slug, usize>,
}

impl<'t> CandidatePool<'t> {
    fn new(target: &'t str) -> Self {
        Self {
            target,
            order: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    fn extend<'s, I>(&mut self, slugs: I, tag: SourceTag)
    where
        I: IntoIterator<Item = &'s Slug>,
    {
        for slug in slugs {
            if slug == self.target {
                continue;
            }
            match self.index.get(slug) {
                Some(&position) => {
                    let tags = &mut self.order[position].source_tags;
                    if !tags.contains(&tag) {
                        tags.push(tag);
                    }
                }
                None => {
                    self.index.insert(slug.clone(), self.order.len());
                    self.order.push(LinkCandidate::new(slug.clone(), tag));
                }
            }
        }
    }

    fn into_candidates(self) -> Vec<LinkCandidate> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use crate::core::test_support::{documents, located_dataset};
    use serde_json::json;

    fn slugs(candidates: &[LinkCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.suburb_slug.as_str()).collect()
    }

    #[test]
    fn test_precedence_order_and_dedup() {
        let mut docs = documents(
            json!({"ipswich": ["goodna", "redbank", "gailes", "bellbird-park", "camira"]}),
            json!({"goodna": ["camira"]}),
            json!([
                {"slug": "goodna", "lat": -27.610, "lng": 152.890},
                {"slug": "redbank", "lat": -27.600, "lng": 152.870},
                {"slug": "gailes", "lat": -27.612, "lng": 152.910},
                {"slug": "bellbird-park"},
                {"slug": "camira"}
            ]),
        );
        docs.curated = Some(serde_json::from_value(json!({"ipswich": {"goodna": ["gailes", "bellbird-park"]}})).unwrap());
        let dataset = GeoDataset::assemble(docs, &DatasetConfig::default(), false);

        let aggregator = CandidateAggregator::new(&dataset, 8);
        let candidates = aggregator.aggregate("bond-cleaning", "goodna", false);

        // adjacency, proximity (gailes ~2 km, redbank ~2.3 km), curated, fill
        assert_eq!(slugs(&candidates), vec!["camira", "gailes", "redbank", "bellbird-park"]);
        assert_eq!(
            candidates[1].source_tags,
            vec![SourceTag::Proximity, SourceTag::Curated, SourceTag::ClusterFill]
        );
        assert!(candidates.iter().all(|c| c.suburb_slug != "goodna"));
    }

    #[test]
    fn test_override_takes_precedence_without_duplication() {
        let mut docs = documents(
            json!({}),
            json!({"a": ["c"]}),
            json!([
                {"slug": "a", "lat": 0.0, "lng": 0.0},
                {"slug": "b", "lat": 0.0, "lng": 0.01},
                {"slug": "c", "lat": 0.0, "lng": 0.02},
                {"slug": "d", "lat": 0.0, "lng": 0.03}
            ]),
        );
        docs.overrides = Some(serde_json::from_value(json!({"a": ["d", "b"]})).unwrap());
        let dataset = GeoDataset::assemble(docs, &DatasetConfig::default(), false);

        let candidates = CandidateAggregator::new(&dataset, 8).aggregate("any", "a", false);

        assert_eq!(slugs(&candidates), vec!["d", "b", "c"]);
        assert_eq!(
            candidates[0].source_tags,
            vec![SourceTag::AdjacencyOverride, SourceTag::Proximity]
        );
        // the plain adjacency entry (a -> c) is replaced by the override
        assert_eq!(candidates[2].source_tags, vec![SourceTag::Proximity]);
    }

    #[test]
    fn test_coverage_filters_candidates() {
        let mut docs = documents(
            json!({"ipswich": ["goodna", "redbank", "gailes"]}),
            json!({"goodna": ["redbank", "gailes"]}),
            json!(["goodna", "redbank", "gailes"]),
        );
        docs.coverage = Some(serde_json::from_value(json!({"bond-cleaning": ["goodna", "gailes"]})).unwrap());
        let dataset = GeoDataset::assemble(docs, &DatasetConfig::default(), false);

        let candidates = CandidateAggregator::new(&dataset, 8).aggregate("bond-cleaning", "goodna", false);
        assert_eq!(slugs(&candidates), vec!["gailes"]);

        let open = CandidateAggregator::new(&dataset, 8).aggregate("window-cleaning", "goodna", false);
        assert_eq!(slugs(&open), vec!["redbank", "gailes"]);
    }

    #[test]
    fn test_unresolvable_coverage_stays_restricted() {
        let mut docs = documents(
            json!({"ipswich": ["goodna", "redbank", "gailes"]}),
            json!({"goodna": ["redbank", "gailes"]}),
            json!(["goodna", "redbank", "gailes"]),
        );
        docs.coverage = Some(serde_json::from_value(json!({"bond-cleaning": ["atlantis"]})).unwrap());
        let dataset = GeoDataset::assemble(docs, &DatasetConfig::default(), false);

        assert!(!dataset.is_open("bond-cleaning"));
        assert_eq!(dataset.targets_for("bond-cleaning").count(), 0);

        let candidates = CandidateAggregator::new(&dataset, 8).aggregate("bond-cleaning", "goodna", false);
        assert_eq!(slugs(&candidates), vec!["goodna"]);
        assert!(candidates[0].is_self());
    }

    #[test]
    fn test_empty_pool_falls_back_to_self() {
        let dataset = located_dataset(&[("lonely", None, None)]);
        let aggregator = CandidateAggregator::new(&dataset, 8);

        for include_self in [true, false] {
            let candidates = aggregator.aggregate("bond-cleaning", "lonely", include_self);
            assert_eq!(slugs(&candidates), vec!["lonely"]);
            assert!(candidates[0].is_self());
        }
    }

    #[test]
    fn test_include_self_prepends() {
        let dataset = located_dataset(&[
            ("a", Some("north"), Some((0.0, 0.0))),
            ("b", Some("north"), Some((0.0, 0.01))),
        ]);
        let candidates = CandidateAggregator::new(&dataset, 8).aggregate("svc", "a", true);
        assert_eq!(slugs(&candidates), vec!["a", "b"]);
        assert!(candidates[0].is_self());
    }
}
