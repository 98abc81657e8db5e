pub mod cli;
pub mod policy_config;
pub mod project_config;

pub use policy_config::PolicyConfig;
pub use project_config::{DatasetConfig, MonitoringConfig, OutputConfig, ProjectConfig, SweepConfig};

#[cfg(feature = "cli")]
use crate::core::variants::VariantMode;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "geo-link-engine")]
#[command(about = "Sweep link-scoring policy variants and rank them by fairness, locality and cluster coherence")]
pub struct CliConfig {
    /// Project config file (TOML, or JSON by extension)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory holding the geo dataset JSON files
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Directory the sweep report is written to
    #[arg(long)]
    pub output_path: Option<String>,

    /// JSON policy block overriding the config's [policy] section
    #[arg(long)]
    pub policy: Option<String>,

    /// Perturbation set: small or medium
    #[arg(long, value_enum)]
    pub variants: Option<VariantMode>,

    /// Override the primary service
    #[arg(long)]
    pub service: Option<String>,

    /// Number of ranked variants to report
    #[arg(long)]
    pub top: Option<usize>,

    /// Also print the JSON payload to stdout
    #[arg(long)]
    pub json: bool,

    /// Fail on any data-integrity issue
    #[arg(long)]
    pub strict: bool,

    /// Show the configuration and variant plan without computing
    #[arg(long)]
    pub dry_run: bool,

    /// Log CPU/memory usage per phase
    #[arg(long)]
    pub monitor: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the project config and applies command-line overrides on top.
    pub fn resolve(&self) -> Result<ProjectConfig> {
        let mut config = ProjectConfig::load_or_default(self.config.as_deref())?;

        if let Some(policy_path) = &self.policy {
            config.policy = PolicyConfig::from_file(policy_path)?;
            tracing::info!("Policy block loaded from {}", policy_path);
        }
        if let Some(data_dir) = &self.data_dir {
            config.dataset.root = data_dir.clone();
        }
        if let Some(output_path) = &self.output_path {
            config.output.path = output_path.clone();
        }
        if let Some(mode) = self.variants {
            config.sweep.mode = mode;
        }
        if let Some(service) = &self.service {
            config.sweep.service = Some(service.clone());
        }
        if let Some(top) = self.top {
            config.sweep.top = top;
        }
        if self.strict {
            config.dataset.strict = true;
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }
        config.sweep.print_json = self.json;

        Ok(config)
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags_override_defaults() {
        let cli = CliConfig::parse_from([
            "geo-link-engine",
            "--config",
            "/nonexistent/never.toml",
        ]);
        assert!(cli.resolve().is_err());

        let cli = CliConfig::parse_from([
            "geo-link-engine",
            "--variants=medium",
            "--service=end-of-lease",
            "--top=3",
            "--json",
            "--data-dir",
            "/tmp/geo",
        ]);
        assert_eq!(cli.variants, Some(VariantMode::Medium));
        assert_eq!(cli.top, Some(3));
        assert!(cli.json);
        assert_eq!(cli.data_dir.as_deref(), Some("/tmp/geo"));
        assert_eq!(cli.service.as_deref(), Some("end-of-lease"));
    }
}
