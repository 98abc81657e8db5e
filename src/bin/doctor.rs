use clap::Parser;
use geo_link_engine::utils::logger;
use geo_link_engine::{GeoDataset, LocalStorage, ProjectConfig};

#[derive(Parser, Debug)]
#[command(name = "doctor")]
#[command(about = "Check the geo dataset for integrity issues; exits non-zero if any are found")]
struct DoctorArgs {
    /// Project config file (TOML, or JSON by extension)
    #[arg(short, long)]
    config: Option<String>,

    /// Directory holding the geo dataset JSON files
    #[arg(long)]
    data_dir: Option<String>,

    /// Print the issue list as JSON
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = DoctorArgs::parse();
    logger::init_cli_logger(args.verbose);

    let mut config = match ProjectConfig::load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };
    if let Some(data_dir) = &args.data_dir {
        config.dataset.root = data_dir.clone();
    }
    // collect every issue instead of stopping at the first
    config.dataset.strict = false;

    tracing::info!("🩺 Checking dataset in {}", config.dataset.root);
    let storage = LocalStorage::new(config.dataset.root.clone());
    let dataset = match GeoDataset::load(&storage, &config.dataset, &config.policy).await {
        Ok(dataset) => dataset,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    let report = dataset.integrity();
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "suburbs": dataset.suburb_count(),
                "counts": report.counts_by_kind(),
                "issues": report.issues(),
            }))?
        );
    } else {
        for issue in report.issues() {
            println!("⚠️  [{}] {}", issue.kind(), issue);
        }
    }

    if report.is_clean() {
        if !args.json {
            println!(
                "✅ {} suburbs in {} clusters, no integrity issues",
                dataset.suburb_count(),
                dataset.clusters().count()
            );
        }
        Ok(())
    } else {
        eprintln!("❌ {} integrity issue(s) found", report.len());
        std::process::exit(1);
    }
}
