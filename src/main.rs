use clap::Parser;
use timetracker_compose::utils::{logger, validation::Validate};
use timetracker_compose::{generate, CliConfig, Result};

fn run(config: &CliConfig) -> Result<()> {
    config.validate()?;

    let yaml = generate(
        config.profile,
        &config.profile_params(),
        config.port_request(),
    )?;

    match &config.output {
        Some(path) => {
            std::fs::write(path, &yaml)?;
            tracing::info!("📁 Compose file written to: {}", path.display());
        }
        None => print!("{}", yaml),
    }
    Ok(())
}

fn main() {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = run(&config) {
        tracing::error!(
            "❌ Compose generation failed: {} (Category: {:?})",
            e,
            e.category()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}
