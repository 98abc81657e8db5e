use crate::app::pipelines::{output_file, production_services};
use crate::core::dataset::GeoDataset;
use crate::core::report::{links_csv, links_json};
use crate::core::scorer::LinkRecommender;
use crate::core::{ConfigProvider, LinkSet, Pipeline, Storage};
use crate::utils::error::Result;

/// Production link run: configured weights, every service, every covered
/// suburb. Writes `links.json` and `links.csv`.
pub struct LinksPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) source: S,
    pub(crate) sink: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> LinksPipeline<S, C> {
    pub fn new(source: S, sink: S, config: C) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for LinksPipeline<S, C> {
    type Loaded = GeoDataset;
    type Computed = Vec<LinkSet>;

    async fn extract(&self) -> Result<GeoDataset> {
        GeoDataset::load(&self.source, self.config.dataset(), self.config.policy()).await
    }

    async fn transform(&self, dataset: GeoDataset) -> Result<Vec<LinkSet>> {
        let policy = self.config.policy();
        let weights = policy.weights();
        let recommender = LinkRecommender::new(&dataset, policy);

        let mut link_sets = Vec::new();
        for service in production_services(self.config.sweep(), &dataset) {
            let sets = recommender.recommend_batch(&service, &weights);
            tracing::info!("🔗 {}: {} pages", service, sets.len());
            link_sets.extend(sets);
        }
        Ok(link_sets)
    }

    async fn load(&self, link_sets: Vec<LinkSet>) -> Result<String> {
        let output = self.config.output();
        let json = links_json(&link_sets)?;
        let json_file = format!("{}.json", output.links_basename);
        let csv_file = format!("{}.csv", output.links_basename);

        self.sink.write_file(&json_file, json.as_bytes()).await?;
        self.sink.write_file(&csv_file, &links_csv(&link_sets)?).await?;

        if self.config.sweep().print_json {
            println!("{}", json);
        }

        Ok(format!(
            "{}, {}",
            output_file(&output.path, &json_file),
            output_file(&output.path, &csv_file)
        ))
    }
}
