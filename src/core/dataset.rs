use crate::config::{DatasetConfig, PolicyConfig};
use crate::core::adjacency::AdjacencyGraph;
use crate::core::geo::ProximityIndex;
use crate::core::integrity::{DatasetSource, IntegrityIssue, IntegrityReport};
use crate::core::loader::{
    AdjacencyDoc, ClustersDoc, CuratedEntry, DatasetReader, SourceDocuments,
};
use crate::core::slug::{normalize, Canonicalizer};
use crate::core::Storage;
use crate::domain::model::{Cluster, Coordinates, Slug, Suburb};
use crate::domain::ports::GeoLookup;
use crate::utils::error::Result;
use std::collections::{BTreeMap, BTreeSet};

/// Curated neighbor lists keyed by canonical cluster.
#[derive(Debug, Clone, PartialEq)]
enum CuratedLists {
    PerSuburb(BTreeMap<Slug, Vec<Slug>>),
    ClusterOrder(Vec<Slug>),
}

/// The loaded geography. Built once per run and passed by reference to every
/// stage; nothing in it changes after construction.
#[derive(Debug, Clone)]
pub struct GeoDataset {
    suburbs: BTreeMap<Slug, Suburb>,
    clusters: BTreeMap<Slug, Cluster>,
    adjacency: AdjacencyGraph,
    overrides: Option<AdjacencyGraph>,
    curated: BTreeMap<Slug, CuratedLists>,
    /// `None` marks an open service (empty list in the coverage map).
    coverage: BTreeMap<String, Option<BTreeSet<Slug>>>,
    proximity: ProximityIndex,
    integrity: IntegrityReport,
}

impl GeoDataset {
    /// Reads every dataset document from `storage` and assembles the context.
    /// In strict mode any integrity issue is an error; otherwise issues are
    /// logged and kept on the dataset for inspection.
    pub async fn load<S: Storage>(
        storage: &S,
        config: &DatasetConfig,
        policy: &PolicyConfig,
    ) -> Result<Self> {
        let documents = DatasetReader::new(storage, config).read_all().await?;
        let dataset = Self::assemble(documents, config, policy.enforce_reciprocity);

        tracing::info!(
            "🗺️ Loaded {} suburbs, {} clusters, {} adjacency edges, {} located suburbs",
            dataset.suburbs.len(),
            dataset.clusters.len(),
            dataset.adjacency.edge_count(),
            dataset.proximity.len()
        );

        if config.strict {
            dataset.integrity.clone().into_strict_result()?;
        } else if !dataset.integrity.is_clean() {
            dataset.integrity.log_warnings();
        }

        Ok(dataset)
    }

    /// Canonicalizes and cross-references the parsed documents.
    pub fn assemble(
        documents: SourceDocuments,
        config: &DatasetConfig,
        enforce_reciprocity: bool,
    ) -> Self {
        let canon = Canonicalizer::new(&config.cluster_aliases);
        let mut integrity = IntegrityReport::default();
        for issue in documents.unreadable {
            integrity.push(issue);
        }

        let mut suburbs = build_registry(&documents.suburbs.entries());

        if let Some(meta) = &documents.suburb_meta {
            for (raw, record) in meta {
                let Some(slug) = canon.suburb(raw, |s| suburbs.contains_key(s)) else {
                    tracing::debug!("Ignoring metadata for unknown suburb {}", raw);
                    continue;
                };
                if let Some(suburb) = suburbs.get_mut(&slug) {
                    if let Some(coords) = record.coordinates() {
                        suburb.coordinates = Some(coords);
                    }
                    if let Some(name) = &record.name {
                        suburb.name = name.clone();
                    }
                }
            }
        }

        let clusters = assign_clusters(&documents.clusters, &canon, &mut suburbs, &mut integrity);

        let mut adjacency = normalize_adjacency(
            &documents.adjacency,
            DatasetSource::Adjacency,
            &canon,
            &suburbs,
            &mut integrity,
        );
        for (from, to) in adjacency.non_reciprocal_edges() {
            integrity.push(IntegrityIssue::NonReciprocalEdge { from, to });
        }
        if enforce_reciprocity {
            let added = adjacency.symmetrize();
            if added > 0 {
                tracing::info!("🔁 Added {} back-edges to make adjacency reciprocal", added);
            }
        }

        let overrides = documents.overrides.as_ref().map(|doc| {
            normalize_adjacency(doc, DatasetSource::AdjacencyOverrides, &canon, &suburbs, &mut integrity)
        });

        let mut curated = BTreeMap::new();
        for (raw_cluster, entry) in documents.curated.iter().flatten() {
            let cluster = canon.cluster(raw_cluster);
            let source = DatasetSource::CuratedNeighbors;
            let lists = match entry {
                CuratedEntry::ClusterOrder(order) => CuratedLists::ClusterOrder(resolve_list(
                    order, source, &cluster, &canon, &suburbs, &mut integrity,
                )),
                CuratedEntry::PerSuburb(map) => {
                    let mut per_suburb: BTreeMap<Slug, Vec<Slug>> = BTreeMap::new();
                    for (raw_suburb, neighbors) in map {
                        let Some(slug) = canon.suburb(raw_suburb, |s| suburbs.contains_key(s)) else {
                            integrity.push(IntegrityIssue::UnknownSuburb {
                                source,
                                reference: raw_suburb.clone(),
                                context: Some(cluster.clone()),
                            });
                            continue;
                        };
                        let resolved = resolve_list(neighbors, source, &slug, &canon, &suburbs, &mut integrity);
                        let list = per_suburb.entry(slug).or_default();
                        for neighbor in resolved {
                            if !list.contains(&neighbor) {
                                list.push(neighbor);
                            }
                        }
                    }
                    CuratedLists::PerSuburb(per_suburb)
                }
            };
            curated.insert(cluster, lists);
        }

        let mut coverage = BTreeMap::new();
        for (service, raws) in documents.coverage.iter().flatten() {
            let service = normalize(service);
            // a restricted list stays restricted even when none of it resolves
            let covered = (!raws.is_empty()).then(|| {
                resolve_list(raws, DatasetSource::Coverage, &service, &canon, &suburbs, &mut integrity)
                    .into_iter()
                    .collect::<BTreeSet<Slug>>()
            });
            coverage.insert(service, covered);
        }

        let mut points = BTreeMap::new();
        for suburb in suburbs.values() {
            match suburb.coordinates {
                Some(coords) => {
                    points.insert(suburb.slug.clone(), coords);
                }
                None => integrity.push(IntegrityIssue::MissingCoordinates {
                    suburb: suburb.slug.clone(),
                }),
            }
        }
        let proximity = ProximityIndex::build(&points);

        Self {
            suburbs,
            clusters,
            adjacency,
            overrides,
            curated,
            coverage,
            proximity,
            integrity,
        }
    }

    pub fn suburbs(&self) -> impl Iterator<Item = &Suburb> {
        self.suburbs.values()
    }

    pub fn suburb(&self, slug: &str) -> Option<&Suburb> {
        self.suburbs.get(slug)
    }

    pub fn suburb_count(&self) -> usize {
        self.suburbs.len()
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    pub fn cluster(&self, slug: &str) -> Option<&Cluster> {
        self.clusters.get(slug)
    }

    pub fn adjacency(&self) -> &AdjacencyGraph {
        &self.adjacency
    }

    /// The hand-curated or test-injected adjacency, when the dataset ships one.
    pub fn overrides(&self) -> Option<&AdjacencyGraph> {
        self.overrides.as_ref()
    }

    pub fn proximity(&self) -> &ProximityIndex {
        &self.proximity
    }

    pub fn integrity(&self) -> &IntegrityReport {
        &self.integrity
    }

    /// Curated neighbors for `slug` within its cluster; empty when none.
    pub fn curated_for(&self, slug: &str) -> &[Slug] {
        let Some(cluster) = self.cluster_of(slug) else {
            return &[];
        };
        match self.curated.get(cluster) {
            Some(CuratedLists::ClusterOrder(order)) => order,
            Some(CuratedLists::PerSuburb(map)) => map.get(slug).map(Vec::as_slice).unwrap_or(&[]),
            None => &[],
        }
    }

    /// Service ids known to the coverage map.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.coverage.keys().map(String::as_str)
    }

    /// A service is open when the coverage map does not restrict it.
    pub fn is_open(&self, service: &str) -> bool {
        !matches!(self.coverage.get(service), Some(Some(_)))
    }

    pub fn is_covered(&self, service: &str, slug: &str) -> bool {
        match self.coverage.get(service) {
            Some(Some(covered)) => covered.contains(slug),
            _ => true,
        }
    }

    /// Suburbs that get a page for `service`, in slug order.
    pub fn targets_for<'a>(&'a self, service: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.suburbs
            .keys()
            .filter(move |slug| self.is_covered(service, slug))
            .map(String::as_str)
    }
}

impl GeoLookup for GeoDataset {
    fn cluster_of(&self, slug: &str) -> Option<&str> {
        self.suburbs.get(slug)?.cluster_slug.as_deref()
    }

    fn coordinates_of(&self, slug: &str) -> Option<Coordinates> {
        self.suburbs.get(slug)?.coordinates
    }

    fn is_adjacent(&self, from: &str, to: &str) -> bool {
        self.adjacency.contains(from, to)
    }
}

fn display_name(slug: &str) -> String {
    slug.split('-')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_registry(entries: &[(String, crate::core::loader::SuburbRecord)]) -> BTreeMap<Slug, Suburb> {
    let mut suburbs = BTreeMap::new();
    for (raw, record) in entries {
        let slug = normalize(raw);
        if slug.is_empty() || suburbs.contains_key(&slug) {
            continue;
        }
        suburbs.insert(
            slug.clone(),
            Suburb {
                name: record.name.clone().unwrap_or_else(|| display_name(&slug)),
                coordinates: record.coordinates(),
                cluster_slug: None,
                slug,
            },
        );
    }
    suburbs
}

fn resolve_list(
    raws: &[String],
    source: DatasetSource,
    context: &str,
    canon: &Canonicalizer,
    suburbs: &BTreeMap<Slug, Suburb>,
    integrity: &mut IntegrityReport,
) -> Vec<Slug> {
    let mut resolved: Vec<Slug> = Vec::with_capacity(raws.len());
    for raw in raws {
        match canon.suburb(raw, |s| suburbs.contains_key(s)) {
            Some(slug) if !resolved.contains(&slug) => resolved.push(slug),
            Some(_) => {}
            None => integrity.push(IntegrityIssue::UnknownSuburb {
                source,
                reference: raw.clone(),
                context: Some(context.to_string()),
            }),
        }
    }
    resolved
}

fn assign_clusters(
    doc: &ClustersDoc,
    canon: &Canonicalizer,
    suburbs: &mut BTreeMap<Slug, Suburb>,
    integrity: &mut IntegrityReport,
) -> BTreeMap<Slug, Cluster> {
    // (canonical slug) -> (display name, raw member refs), merged across aliases
    let mut grouped: BTreeMap<Slug, (Option<String>, Vec<String>)> = BTreeMap::new();
    let mut add = |raw_slug: &str, name: Option<&String>, members: Vec<String>| {
        let entry = grouped.entry(canon.cluster(raw_slug)).or_default();
        if entry.0.is_none() {
            entry.0 = name.cloned();
        }
        entry.1.extend(members);
    };

    match doc {
        ClustersDoc::Listed { clusters } => {
            for cluster in clusters {
                let members = cluster.suburbs.iter().map(|r| r.slug().to_string()).collect();
                add(&cluster.slug, cluster.name.as_ref(), members);
            }
        }
        ClustersDoc::Keyed(map) => {
            for (slug, members) in map {
                add(slug, None, members.iter().map(|r| r.slug().to_string()).collect());
            }
        }
    }

    let mut clusters = BTreeMap::new();
    for (cluster_slug, (name, raw_members)) in grouped {
        let mut members = Vec::new();
        for raw in &raw_members {
            let Some(slug) = canon.suburb(raw, |s| suburbs.contains_key(s)) else {
                integrity.push(IntegrityIssue::UnknownSuburb {
                    source: DatasetSource::Clusters,
                    reference: raw.clone(),
                    context: Some(cluster_slug.clone()),
                });
                continue;
            };
            let Some(suburb) = suburbs.get_mut(&slug) else {
                continue;
            };
            match suburb.cluster_slug.clone() {
                None => {
                    suburb.cluster_slug = Some(cluster_slug.clone());
                    members.push(slug);
                }
                Some(existing) if existing == cluster_slug => {}
                Some(existing) => integrity.push(IntegrityIssue::DuplicateClusterMembership {
                    suburb: slug,
                    kept: existing,
                    dropped: cluster_slug.clone(),
                }),
            }
        }
        members.sort();
        members.dedup();

        clusters.insert(
            cluster_slug.clone(),
            Cluster {
                name: name.unwrap_or_else(|| display_name(&cluster_slug)),
                slug: cluster_slug,
                suburb_slugs: members,
            },
        );
    }
    clusters
}

fn normalize_adjacency(
    doc: &AdjacencyDoc,
    source: DatasetSource,
    canon: &Canonicalizer,
    suburbs: &BTreeMap<Slug, Suburb>,
    integrity: &mut IntegrityReport,
) -> AdjacencyGraph {
    let mut graph = AdjacencyGraph::new();
    for (raw_from, entry) in doc {
        let Some(from) = canon.suburb(raw_from, |s| suburbs.contains_key(s)) else {
            integrity.push(IntegrityIssue::UnknownSuburb {
                source,
                reference: raw_from.clone(),
                context: None,
            });
            continue;
        };
        graph.touch(&from);
        for to in resolve_list(entry.neighbors(), source, &from, canon, suburbs, integrity) {
            graph.add_edge(&from, &to);
        }
    }
    graph
}
