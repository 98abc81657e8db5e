use crate::app::pipelines::{output_file, primary_service};
use crate::core::dataset::GeoDataset;
use crate::core::report::{sweep_html, sweep_json, sweep_markdown};
use crate::core::sweep::SweepRunner;
use crate::core::{ConfigProvider, Pipeline, Storage, SweepReport};
use crate::utils::error::{GeoLinkError, Result};

/// Loads the dataset, sweeps policy variants for the primary service and
/// writes `policy.sweep.{json,md,html}`.
///
/// `source` is rooted at the dataset directory and `sink` at the output
/// directory; nothing is written unless the dataset loads.
pub struct SweepPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) source: S,
    pub(crate) sink: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> SweepPipeline<S, C> {
    pub fn new(source: S, sink: S, config: C) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for SweepPipeline<S, C> {
    type Loaded = GeoDataset;
    type Computed = SweepReport;

    async fn extract(&self) -> Result<GeoDataset> {
        GeoDataset::load(&self.source, self.config.dataset(), self.config.policy()).await
    }

    async fn transform(&self, dataset: GeoDataset) -> Result<SweepReport> {
        let sweep = self.config.sweep();
        let service = primary_service(sweep, &dataset);

        if dataset.targets_for(&service).next().is_none() {
            return Err(GeoLinkError::UnknownServiceError { service });
        }
        if !dataset.is_open(&service) {
            tracing::debug!("{} is restricted by the coverage map", service);
        }

        let report = SweepRunner::new(&dataset, self.config.policy()).run(&service, sweep.mode, sweep.top);
        Ok(report)
    }

    async fn load(&self, report: SweepReport) -> Result<String> {
        let output = self.config.output();
        let json = sweep_json(&report)?;
        let mut written = Vec::new();

        if output.wants("json") {
            let file = format!("{}.json", output.sweep_basename);
            self.sink.write_file(&file, json.as_bytes()).await?;
            written.push(file);
        }
        if output.wants("md") {
            let file = format!("{}.md", output.sweep_basename);
            self.sink.write_file(&file, sweep_markdown(&report).as_bytes()).await?;
            written.push(file);
        }
        if output.wants("html") {
            let file = format!("{}.html", output.sweep_basename);
            self.sink.write_file(&file, sweep_html(&report).as_bytes()).await?;
            written.push(file);
        }

        if self.config.sweep().print_json {
            println!("{}", json);
        }

        tracing::debug!("Wrote {} sweep artifacts", written.len());
        Ok(written
            .iter()
            .map(|file| output_file(&output.path, file))
            .collect::<Vec<_>>()
            .join(", "))
    }
}
