use clap::Parser;
use geo_link_engine::utils::{logger, validation::Validate};
use geo_link_engine::{BatchEngine, LinksPipeline, LocalStorage, PolicyConfig, ProjectConfig};

#[derive(Parser, Debug)]
#[command(name = "links")]
#[command(about = "Render production related-suburb links for every service page")]
struct LinksArgs {
    /// Project config file (TOML, or JSON by extension)
    #[arg(short, long)]
    config: Option<String>,

    /// Directory holding the geo dataset JSON files
    #[arg(long)]
    data_dir: Option<String>,

    /// Directory links.json and links.csv are written to
    #[arg(long)]
    output_path: Option<String>,

    /// JSON policy block overriding the config's [policy] section
    #[arg(long)]
    policy: Option<String>,

    /// Restrict the run to these services (repeatable)
    #[arg(long = "service")]
    services: Vec<String>,

    /// Prepend each page's own suburb to its links
    #[arg(long)]
    include_self: bool,

    /// Also print links.json to stdout
    #[arg(long)]
    json: bool,

    /// Fail on any data-integrity issue
    #[arg(long)]
    strict: bool,

    /// Log CPU/memory usage per phase
    #[arg(long)]
    monitor: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl LinksArgs {
    fn resolve(&self) -> geo_link_engine::Result<ProjectConfig> {
        let mut config = ProjectConfig::load_or_default(self.config.as_deref())?;

        if let Some(policy_path) = &self.policy {
            config.policy = PolicyConfig::from_file(policy_path)?;
        }
        if let Some(data_dir) = &self.data_dir {
            config.dataset.root = data_dir.clone();
        }
        if let Some(output_path) = &self.output_path {
            config.output.path = output_path.clone();
        }
        if !self.services.is_empty() {
            config.sweep.services = self.services.clone();
        }
        if self.include_self {
            config.policy.include_self = true;
        }
        if self.strict {
            config.dataset.strict = true;
        }
        if self.monitor {
            config.monitoring.enabled = true;
        }
        config.sweep.print_json = self.json;

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = LinksArgs::parse();
    logger::init_cli_logger(args.verbose);

    tracing::info!("🔗 Starting production link run");

    let config = match args.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    let monitor_enabled = config.monitoring.enabled;
    let source = LocalStorage::new(config.dataset.root.clone());
    let sink = LocalStorage::new(config.output.path.clone());
    let engine = BatchEngine::new_with_monitoring(LinksPipeline::new(source, sink, config), monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            if !args.json {
                println!("✅ Links written to: {}", output_path);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Link run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }
}
