//! Reads the dataset documents through a `Storage` and parses their accepted
//! shapes. Required documents abort the run when missing or malformed;
//! optional ones degrade to `None`.

use crate::config::DatasetConfig;
use crate::core::integrity::{DatasetSource, IntegrityIssue};
use crate::core::Storage;
use crate::domain::model::Coordinates;
use crate::utils::error::{GeoLinkError, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

/// `{ cluster: [suburb...] }` or `{ clusters: [{slug, name, suburbs}] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ClustersDoc {
    Listed { clusters: Vec<ClusterEntry> },
    Keyed(BTreeMap<String, Vec<SuburbRef>>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterEntry {
    pub slug: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "suburbSlugs", alias = "suburb_slugs")]
    pub suburbs: Vec<SuburbRef>,
}

/// A suburb named either by a bare string or by an object with a slug.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SuburbRef {
    Slug(String),
    Entry {
        slug: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl SuburbRef {
    pub fn slug(&self) -> &str {
        match self {
            SuburbRef::Slug(slug) | SuburbRef::Entry { slug, .. } => slug,
        }
    }
}

/// `[neighbor...]` or `{ adjacent_suburbs: [neighbor...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdjacencyEntry {
    List(Vec<String>),
    Detailed {
        #[serde(alias = "adjacentSuburbs")]
        adjacent_suburbs: Vec<String>,
    },
}

impl AdjacencyEntry {
    pub fn neighbors(&self) -> &[String] {
        match self {
            AdjacencyEntry::List(list) => list,
            AdjacencyEntry::Detailed { adjacent_suburbs } => adjacent_suburbs,
        }
    }
}

pub type AdjacencyDoc = BTreeMap<String, AdjacencyEntry>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuburbRecord {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default, alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(default, alias = "lon", alias = "longitude")]
    pub lng: Option<f64>,
}

impl SuburbRecord {
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates.or(match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RegistryItem {
    Slug(String),
    Record(SuburbRecord),
}

/// `[{slug,...}]`, `[slug...]`, `{ suburbs: [...] }` or `{ slug: {...} }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RegistryDoc {
    Listed(Vec<RegistryItem>),
    Wrapped { suburbs: Vec<RegistryItem> },
    Keyed(BTreeMap<String, SuburbRecord>),
}

impl RegistryDoc {
    /// (raw slug, record) pairs in document order; entries without a slug are skipped.
    pub fn entries(&self) -> Vec<(String, SuburbRecord)> {
        let from_items = |items: &[RegistryItem]| {
            items
                .iter()
                .filter_map(|item| match item {
                    RegistryItem::Slug(slug) => Some((slug.clone(), SuburbRecord::default())),
                    RegistryItem::Record(record) => {
                        record.slug.clone().map(|slug| (slug, record.clone()))
                    }
                })
                .collect::<Vec<_>>()
        };

        match self {
            RegistryDoc::Listed(items) | RegistryDoc::Wrapped { suburbs: items } => from_items(items),
            RegistryDoc::Keyed(map) => map
                .iter()
                .map(|(slug, record)| (slug.clone(), record.clone()))
                .collect(),
        }
    }
}

pub type SuburbMetaDoc = BTreeMap<String, SuburbRecord>;
pub type CoverageDoc = BTreeMap<String, Vec<String>>;

/// Per cluster: either suburb -> curated neighbors, or one curated order for
/// the whole cluster.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CuratedEntry {
    PerSuburb(BTreeMap<String, Vec<String>>),
    ClusterOrder(Vec<String>),
}

pub type CuratedDoc = BTreeMap<String, CuratedEntry>;

/// Every parsed input, before canonicalization.
#[derive(Debug, Clone)]
pub struct SourceDocuments {
    pub clusters: ClustersDoc,
    pub adjacency: AdjacencyDoc,
    pub suburbs: RegistryDoc,
    pub suburb_meta: Option<SuburbMetaDoc>,
    pub coverage: Option<CoverageDoc>,
    pub curated: Option<CuratedDoc>,
    pub overrides: Option<AdjacencyDoc>,
    /// Optional documents that existed but could not be parsed.
    pub unreadable: Vec<IntegrityIssue>,
}

fn parse_document<T: DeserializeOwned>(file: &str, data: &[u8]) -> Result<T> {
    serde_json::from_slice(data).map_err(|e| GeoLinkError::MalformedDatasetError {
        file: file.to_string(),
        field: if e.line() > 0 {
            format!("line {}, column {}", e.line(), e.column())
        } else {
            "document".to_string()
        },
        message: e.to_string(),
    })
}

fn is_not_found(err: &GeoLinkError) -> bool {
    matches!(err, GeoLinkError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound)
}

pub struct DatasetReader<'a, S: Storage> {
    storage: &'a S,
    config: &'a DatasetConfig,
}

impl<'a, S: Storage> DatasetReader<'a, S> {
    pub fn new(storage: &'a S, config: &'a DatasetConfig) -> Self {
        Self { storage, config }
    }

    async fn read_required<T: DeserializeOwned>(&self, file: &str) -> Result<T> {
        tracing::debug!("Reading required dataset file {}", file);
        let data = match self.storage.read_file(file).await {
            Ok(data) => data,
            Err(e) if is_not_found(&e) => {
                return Err(GeoLinkError::MissingDatasetError {
                    file: file.to_string(),
                })
            }
            Err(e) => return Err(e),
        };
        parse_document(file, &data)
    }

    async fn read_optional<T: DeserializeOwned>(
        &self,
        file: Option<&str>,
        source: DatasetSource,
        unreadable: &mut Vec<IntegrityIssue>,
    ) -> Option<T> {
        let file = file?;

        let parsed = match self.storage.read_file(file).await {
            Ok(data) => parse_document(file, &data),
            Err(e) if is_not_found(&e) => {
                tracing::warn!("Optional dataset file {} not found, using an empty {}", file, source);
                return None;
            }
            Err(e) => Err(e),
        };

        match parsed {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!("Ignoring unreadable optional file {}: {}", file, e);
                unreadable.push(IntegrityIssue::UnreadableOptionalSource {
                    source,
                    message: e.to_string(),
                });
                None
            }
        }
    }

    /// Reads every configured document. Fails before returning anything if a
    /// required document is missing or malformed.
    pub async fn read_all(&self) -> Result<SourceDocuments> {
        let clusters = self.read_required(&self.config.clusters).await?;
        let adjacency = self.read_required(&self.config.adjacency).await?;
        let suburbs = self.read_required(&self.config.suburbs).await?;

        let mut unreadable = Vec::new();
        let suburb_meta = self
            .read_optional(self.config.suburb_meta.as_deref(), DatasetSource::SuburbMeta, &mut unreadable)
            .await;
        let coverage = self
            .read_optional(self.config.coverage.as_deref(), DatasetSource::Coverage, &mut unreadable)
            .await;
        let curated = self
            .read_optional(
                self.config.curated_neighbors.as_deref(),
                DatasetSource::CuratedNeighbors,
                &mut unreadable,
            )
            .await;
        let overrides = self
            .read_optional(
                self.config.adjacency_overrides.as_deref(),
                DatasetSource::AdjacencyOverrides,
                &mut unreadable,
            )
            .await;

        Ok(SourceDocuments {
            clusters,
            adjacency,
            suburbs,
            suburb_meta,
            coverage,
            curated,
            overrides,
            unreadable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clusters_doc_accepts_both_shapes() {
        let keyed: ClustersDoc =
            serde_json::from_str(r#"{"ipswich": ["goodna", "redbank"]}"#).unwrap();
        assert!(matches!(keyed, ClustersDoc::Keyed(ref map) if map["ipswich"].len() == 2));

        let listed: ClustersDoc = serde_json::from_str(
            r#"{"clusters": [{"slug": "ipswich-region", "name": "Ipswich", "suburbs": ["goodna", {"slug": "redbank"}]}]}"#,
        )
        .unwrap();
        match listed {
            ClustersDoc::Listed { clusters } => {
                assert_eq!(clusters[0].slug, "ipswich-region");
                assert_eq!(clusters[0].suburbs[1].slug(), "redbank");
            }
            other => panic!("expected listed clusters, got {:?}", other),
        }
    }

    #[test]
    fn test_adjacency_doc_accepts_both_shapes() {
        let doc: AdjacencyDoc = serde_json::from_str(
            r#"{"goodna": ["redbank"], "redbank": {"adjacent_suburbs": ["goodna", "gailes"]}}"#,
        )
        .unwrap();
        assert_eq!(doc["goodna"].neighbors(), ["redbank"]);
        assert_eq!(doc["redbank"].neighbors(), ["goodna", "gailes"]);
    }

    #[test]
    fn test_registry_shapes() {
        let listed: RegistryDoc = serde_json::from_str(
            r#"[{"slug": "goodna", "name": "Goodna", "lat": -27.61, "lng": 152.89}, "redbank"]"#,
        )
        .unwrap();
        let entries = listed.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].1.coordinates(),
            Some(Coordinates { lat: -27.61, lng: 152.89 })
        );
        assert_eq!(entries[1].0, "redbank");

        let keyed: RegistryDoc = serde_json::from_str(
            r#"{"goodna": {"name": "Goodna", "coordinates": {"lat": -27.61, "lng": 152.89}}}"#,
        )
        .unwrap();
        assert_eq!(keyed.entries()[0].0, "goodna");

        let wrapped: RegistryDoc =
            serde_json::from_str(r#"{"suburbs": [{"slug": "goodna"}]}"#).unwrap();
        assert_eq!(wrapped.entries()[0].0, "goodna");
    }

    #[test]
    fn test_read_all_degrades_optional_documents() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let write = |file: &str, content: &str| std::fs::write(temp_dir.path().join(file), content).unwrap();
        write("clusters.json", r#"{"ipswich": ["goodna"]}"#);
        write("adjacency.json", r#"{"goodna": []}"#);
        write("suburbs.json", r#"["goodna"]"#);
        write("curated-neighbors.json", "not json");

        let storage = crate::config::cli::LocalStorage::new(temp_dir.path());
        let config = DatasetConfig::default();
        let documents = tokio_test::block_on(DatasetReader::new(&storage, &config).read_all()).unwrap();

        assert!(documents.coverage.is_none());
        assert!(documents.curated.is_none());
        assert_eq!(documents.unreadable.len(), 1);
        assert!(matches!(
            documents.unreadable[0],
            IntegrityIssue::UnreadableOptionalSource {
                source: DatasetSource::CuratedNeighbors,
                ..
            }
        ));

        std::fs::remove_file(temp_dir.path().join("suburbs.json")).unwrap();
        let err = tokio_test::block_on(DatasetReader::new(&storage, &config).read_all()).unwrap_err();
        assert!(matches!(err, GeoLinkError::MissingDatasetError { ref file } if file == "suburbs.json"));
    }

    #[test]
    fn test_read_all_degrades_io_failures_on_optional_documents() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let write = |file: &str, content: &str| std::fs::write(temp_dir.path().join(file), content).unwrap();
        write("clusters.json", r#"{"ipswich": ["goodna"]}"#);
        write("adjacency.json", r#"{"goodna": []}"#);
        write("suburbs.json", r#"["goodna"]"#);
        // a directory where a file is expected fails to read without being NotFound
        std::fs::create_dir(temp_dir.path().join("service-coverage.json")).unwrap();

        let storage = crate::config::cli::LocalStorage::new(temp_dir.path());
        let config = DatasetConfig::default();
        let documents = tokio_test::block_on(DatasetReader::new(&storage, &config).read_all()).unwrap();

        assert!(documents.coverage.is_none());
        assert_eq!(documents.unreadable.len(), 1);
        assert!(matches!(
            documents.unreadable[0],
            IntegrityIssue::UnreadableOptionalSource {
                source: DatasetSource::Coverage,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_document_names_file_and_position() {
        let err = parse_document::<AdjacencyDoc>("adjacency.json", b"{\"goodna\": [").unwrap_err();
        match err {
            GeoLinkError::MalformedDatasetError { file, field, .. } => {
                assert_eq!(file, "adjacency.json");
                assert!(field.starts_with("line 1"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
