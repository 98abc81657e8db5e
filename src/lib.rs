pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, PolicyConfig, ProjectConfig};

pub use app::pipelines::{LinksPipeline, SweepPipeline};
pub use core::{dataset::GeoDataset, engine::BatchEngine, variants::VariantMode};
pub use utils::error::{GeoLinkError, Result};
