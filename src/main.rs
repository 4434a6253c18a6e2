use clap::Parser;
use sf_user_import::utils::{logger, prompt, validation::Validate};
use sf_user_import::{run_import, CliConfig, ImportError, ImportJob};

fn report_failure(e: &ImportError) -> ! {
    tracing::error!(
        "❌ Import failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose, config.json_logs);

    tracing::info!("Starting sf-user-import");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        report_failure(&e);
    }

    println!("Environment: {}", config.env);

    if config.env.is_production() && !config.yes {
        match prompt::confirm_production() {
            Ok(true) => {}
            Ok(false) => {
                println!("====== Aborted ======");
                std::process::exit(ImportError::Aborted.exit_code());
            }
            Err(e) => report_failure(&e),
        }
    }

    println!("====== Starting import ======");

    let job = ImportJob::from(&config);
    let report = match run_import(&job).await {
        Ok(report) => report,
        Err(e) => report_failure(&e),
    };

    println!(
        "====== Finished: {} created, {} failed ======",
        report.created_count(),
        report.failed_count()
    );

    if report.failed_count() > 0 {
        let e = ImportError::PartialFailure {
            failed: report.failed_count(),
            total: report.total(),
        };
        tracing::warn!("{}", e);
        std::process::exit(e.exit_code());
    }
}
