use clap::Parser;
use geo_link_engine::core::variants::generate_variants;
use geo_link_engine::utils::{logger, validation::Validate};
use geo_link_engine::{BatchEngine, CliConfig, LocalStorage, ProjectConfig, SweepPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    logger::init_logger(cli.verbose, cli.log_json);

    tracing::info!("🚀 Starting geo-link-engine policy sweep");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Failed to load configuration: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    if cli.dry_run {
        display_config_summary(&config);
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        return Ok(());
    }

    let monitor_enabled = config.monitoring.enabled;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let print_json = config.sweep.print_json;
    let source = LocalStorage::new(config.dataset.root.clone());
    let sink = LocalStorage::new(config.output.path.clone());
    let pipeline = SweepPipeline::new(source, sink, config);
    let engine = BatchEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Policy sweep completed successfully!");
            if !print_json {
                println!("✅ Policy sweep completed successfully!");
                println!("📁 Output saved to: {}", output_path);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Policy sweep failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &ProjectConfig) {
    let variants = generate_variants(&config.policy.weights(), config.sweep.mode);

    println!("📋 Configuration Summary:");
    println!("  Dataset: {}", config.dataset.root);
    println!(
        "  Files: {}, {}, {}",
        config.dataset.clusters, config.dataset.adjacency, config.dataset.suburbs
    );
    println!("  Strict: {}", config.dataset.strict);
    println!(
        "  Service: {}",
        config.sweep.service.as_deref().unwrap_or("(first service in coverage map)")
    );
    println!("  Output: {}", config.output.path);
    println!("  Formats: {}", config.output.formats.join(", "));
    println!("  Top: {}", config.sweep.top);
    println!("  Variants ({} mode): {}", config.sweep.mode, variants.len());
    for variant in &variants {
        println!("    - {} [{}]", variant.kind, variant.weights.signature());
    }
    println!("  🔍 DRY RUN MODE ENABLED");
}
