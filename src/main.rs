use anyhow::Context;
use clap::Parser;
use record_dedup::utils::{logger, validation::Validate};
use record_dedup::{CliConfig, DedupEngine, DedupError, JsonFilePipeline, LocalStorage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting record-dedup CLI");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.resolve().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = JsonFilePipeline::new(storage, config);
    let engine = DedupEngine::new(pipeline);

    match engine.run().await {
        Ok(written) => {
            for path in &written {
                println!("{}", path);
            }
        }
        Err(e) => exit_with(&e),
    }

    std::io::Write::flush(&mut std::io::stdout()).context("failed to flush stdout")?;
    Ok(())
}

fn exit_with(e: &DedupError) -> ! {
    tracing::error!(
        "❌ Deduplication failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}
