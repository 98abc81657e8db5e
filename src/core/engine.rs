use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives a pipeline through load, compute and write, logging each phase.
pub struct BatchEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> BatchEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting batch run");

        tracing::info!("📥 Loading dataset...");
        let loaded = self.pipeline.extract().await?;
        self.monitor.log_phase("load");

        tracing::info!("🔄 Computing...");
        let computed = self.pipeline.transform(loaded).await?;
        self.monitor.log_phase("compute");

        tracing::info!("💾 Writing outputs...");
        let output = self.pipeline.load(computed).await?;
        self.monitor.log_phase("write");
        self.monitor.log_final();

        tracing::info!("✅ Output saved to: {}", output);
        Ok(output)
    }
}
