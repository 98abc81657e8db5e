pub mod links_pipeline;
pub mod sweep_pipeline;

pub use links_pipeline::LinksPipeline;
pub use sweep_pipeline::SweepPipeline;

use crate::config::SweepConfig;
use crate::core::dataset::GeoDataset;
use crate::core::slug::normalize;
use std::collections::HashSet;

/// Used when neither the config nor the coverage map names a service.
pub const DEFAULT_SERVICE: &str = "bond-cleaning";

/// The service a sweep evaluates: `sweep.service`, else the first configured
/// production service, else the first service in the coverage map.
pub fn primary_service(sweep: &SweepConfig, dataset: &GeoDataset) -> String {
    sweep
        .service
        .as_deref()
        .or_else(|| sweep.services.first().map(String::as_str))
        .map(normalize)
        .or_else(|| dataset.services().next().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_SERVICE.to_string())
}

/// Services the production link run renders: `sweep.services`, else every
/// service in the coverage map, else the primary service alone.
pub fn production_services(sweep: &SweepConfig, dataset: &GeoDataset) -> Vec<String> {
    let mut services: Vec<String> = if !sweep.services.is_empty() {
        sweep.services.iter().map(|s| normalize(s)).collect()
    } else {
        dataset.services().map(str::to_string).collect()
    };
    let mut seen = HashSet::new();
    services.retain(|service| seen.insert(service.clone()));

    if services.is_empty() {
        services.push(primary_service(sweep, dataset));
    }
    services
}

/// Joins an output directory and file name the way the reports are logged.
pub(crate) fn output_file(dir: &str, file: &str) -> String {
    format!("{}/{}", dir.trim_end_matches('/'), file)
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::core::Storage;
    use crate::utils::error::{GeoLinkError, Result};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    pub struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn put(&self, path: &str, data: serde_json::Value) {
            let bytes = serde_json::to_vec(&data).unwrap();
            self.files.lock().await.insert(path.to_string(), bytes);
        }

        pub async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }

        pub async fn paths(&self) -> Vec<String> {
            let mut paths: Vec<String> = self.files.lock().await.keys().cloned().collect();
            paths.sort();
            paths
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.files.lock().await.get(path).cloned().ok_or_else(|| {
                GeoLinkError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} not found", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files.lock().await.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    /// Two clusters of three located suburbs with reciprocal adjacency and a
    /// coverage map restricting one service.
    pub async fn seeded_dataset() -> MockStorage {
        let storage = MockStorage::new();
        storage
            .put(
                "clusters.json",
                serde_json::json!({
                    "ipswich": ["goodna", "redbank", "gailes"],
                    "logan": ["woodridge", "kingston", "slacks-creek"]
                }),
            )
            .await;
        storage
            .put(
                "adjacency.json",
                serde_json::json!({
                    "goodna": ["redbank", "gailes"],
                    "redbank": ["goodna"],
                    "gailes": ["goodna"],
                    "woodridge": ["kingston", "slacks-creek"],
                    "kingston": ["woodridge"],
                    "slacks-creek": ["woodridge"]
                }),
            )
            .await;
        storage
            .put(
                "suburbs.json",
                serde_json::json!([
                    {"slug": "goodna", "name": "Goodna", "lat": -27.610, "lng": 152.890},
                    {"slug": "redbank", "name": "Redbank", "lat": -27.600, "lng": 152.870},
                    {"slug": "gailes", "name": "Gailes", "lat": -27.612, "lng": 152.910},
                    {"slug": "woodridge", "name": "Woodridge", "lat": -27.633, "lng": 153.110},
                    {"slug": "kingston", "name": "Kingston", "lat": -27.660, "lng": 153.114},
                    {"slug": "slacks-creek", "name": "Slacks Creek", "lat": -27.640, "lng": 153.130}
                ]),
            )
            .await;
        storage
            .put(
                "service-coverage.json",
                serde_json::json!({
                    "bond-cleaning": ["goodna", "redbank", "gailes", "woodridge", "kingston"],
                    "window-cleaning": []
                }),
            )
            .await;
        storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use crate::core::test_support::documents;
    use serde_json::json;

    #[test]
    fn test_service_resolution_order() {
        let mut docs = documents(json!({}), json!({}), json!(["goodna"]));
        docs.coverage = Some(serde_json::from_value(json!({"end-of-lease": [], "carpet": []})).unwrap());
        let dataset = GeoDataset::assemble(docs, &DatasetConfig::default(), false);

        let mut sweep = SweepConfig::default();
        assert_eq!(primary_service(&sweep, &dataset), "carpet");
        assert_eq!(production_services(&sweep, &dataset), vec!["carpet", "end-of-lease"]);

        sweep.services = vec!["Window Cleaning".to_string()];
        assert_eq!(primary_service(&sweep, &dataset), "window-cleaning");
        assert_eq!(production_services(&sweep, &dataset), vec!["window-cleaning"]);

        sweep.service = Some("bond-cleaning".to_string());
        assert_eq!(primary_service(&sweep, &dataset), "bond-cleaning");

        let bare = GeoDataset::assemble(
            documents(json!({}), json!({}), json!(["goodna"])),
            &DatasetConfig::default(),
            false,
        );
        assert_eq!(primary_service(&SweepConfig::default(), &bare), DEFAULT_SERVICE);
        assert_eq!(output_file("./output/", "links.csv"), "./output/links.csv");
    }

    #[test]
    fn test_production_services_drop_repeats_in_order() {
        let dataset = GeoDataset::assemble(
            documents(json!({}), json!({}), json!(["goodna"])),
            &DatasetConfig::default(),
            false,
        );
        let sweep = SweepConfig {
            services: vec![
                "window-cleaning".to_string(),
                "bond-cleaning".to_string(),
                "Window Cleaning".to_string(),
            ],
            ..SweepConfig::default()
        };

        assert_eq!(
            production_services(&sweep, &dataset),
            vec!["window-cleaning", "bond-cleaning"]
        );
    }
}
