use crate::domain::model::Slug;
use crate::utils::error::GeoLinkError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Which input document an issue was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetSource {
    Clusters,
    Adjacency,
    AdjacencyOverrides,
    Coverage,
    CuratedNeighbors,
    SuburbMeta,
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DatasetSource::Clusters => "clusters",
            DatasetSource::Adjacency => "adjacency",
            DatasetSource::AdjacencyOverrides => "adjacency overrides",
            DatasetSource::Coverage => "service coverage",
            DatasetSource::CuratedNeighbors => "curated neighbors",
            DatasetSource::SuburbMeta => "suburb metadata",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum IntegrityIssue {
    NonReciprocalEdge {
        from: Slug,
        to: Slug,
    },
    UnknownSuburb {
        source: DatasetSource,
        reference: String,
        context: Option<String>,
    },
    DuplicateClusterMembership {
        suburb: Slug,
        kept: Slug,
        dropped: Slug,
    },
    MissingCoordinates {
        suburb: Slug,
    },
    UnreadableOptionalSource {
        source: DatasetSource,
        message: String,
    },
}

impl IntegrityIssue {
    pub fn kind(&self) -> &'static str {
        match self {
            IntegrityIssue::NonReciprocalEdge { .. } => "non-reciprocal-edge",
            IntegrityIssue::UnknownSuburb { .. } => "unknown-suburb",
            IntegrityIssue::DuplicateClusterMembership { .. } => "duplicate-cluster-membership",
            IntegrityIssue::MissingCoordinates { .. } => "missing-coordinates",
            IntegrityIssue::UnreadableOptionalSource { .. } => "unreadable-optional-source",
        }
    }
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityIssue::NonReciprocalEdge { from, to } => {
                write!(f, "{} lists {} as adjacent but {} does not list {}", from, to, to, from)
            }
            IntegrityIssue::UnknownSuburb {
                source,
                reference,
                context: Some(context),
            } => write!(f, "{} references unknown suburb '{}' (in {})", source, reference, context),
            IntegrityIssue::UnknownSuburb {
                source,
                reference,
                context: None,
            } => write!(f, "{} references unknown suburb '{}'", source, reference),
            IntegrityIssue::DuplicateClusterMembership {
                suburb,
                kept,
                dropped,
            } => write!(
                f,
                "{} belongs to clusters {} and {}; keeping {}",
                suburb, kept, dropped, kept
            ),
            IntegrityIssue::MissingCoordinates { suburb } => {
                write!(f, "{} has no coordinates", suburb)
            }
            IntegrityIssue::UnreadableOptionalSource { source, message } => {
                write!(f, "{} could not be parsed and was ignored: {}", source, message)
            }
        }
    }
}

/// Everything the loader noticed but could work around.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntegrityReport {
    issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn push(&mut self, issue: IntegrityIssue) {
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[IntegrityIssue] {
        &self.issues
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn counts_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Lenient mode: one warning per issue kind, details at debug.
    pub fn log_warnings(&self) {
        for issue in &self.issues {
            tracing::debug!("integrity: {}", issue);
        }
        for (kind, count) in self.counts_by_kind() {
            tracing::warn!("⚠️ {} data-integrity issue(s) of kind {}", count, kind);
        }
    }

    /// Strict mode: any issue aborts the run.
    pub fn into_strict_result(self) -> Result<Self, GeoLinkError> {
        match self.issues.first() {
            None => Ok(self),
            Some(first) => Err(GeoLinkError::IntegrityError {
                count: self.issues.len(),
                first: first.to_string(),
            }),
        }
    }
}
