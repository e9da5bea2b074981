use clap::Parser;
use timetracker_compose::adapters::{ComposeCli, DockerHubRegistry, DockerRuntime};
use timetracker_compose::utils::{logger, validation::Validate};
use timetracker_compose::{
    ComposeError, Decision, LocalStorage, Profile, RefreshConfig, Refresher,
};

#[derive(Parser)]
#[command(name = "update-compose")]
#[command(about = "Redeploy Timetracker when a newer image has been published")]
struct Args {
    /// Deployment to refresh (trial or production)
    profile: Profile,

    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Report what would happen without touching the deployment
    #[arg(long)]
    dry_run: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> timetracker_compose::Result<RefreshConfig> {
    let config = match &args.config {
        Some(path) => {
            tracing::debug!("Loading config file '{}'", path);
            RefreshConfig::from_file(path)?
        }
        None => RefreshConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn exit_with(e: ComposeError) -> ! {
    tracing::error!("❌ Refresh failed: {} (Category: {:?})", e, e.category());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Checking {} deployment", args.profile);
    let config = load_config(&args).unwrap_or_else(|e| exit_with(e));
    let settings = config
        .refresh_settings(args.profile)
        .unwrap_or_else(|e| exit_with(e));

    let registry = DockerHubRegistry::from_token_file(
        config.registry.tags_url.clone(),
        config.registry.page_size,
        &config.registry.token_file,
    )?;
    let runtime = DockerRuntime::connect()?;
    let storage = LocalStorage::new(config.deploy.directory.clone());
    let orchestrator = ComposeCli::new(
        config.deploy.compose_command.clone(),
        config.deploy.project_name.clone(),
        config.deploy.directory.clone(),
    );

    let refresher = Refresher::new(registry, runtime, storage, orchestrator, settings);
    match refresher.run(args.dry_run).await {
        Ok(outcome) => {
            match outcome.decision {
                Decision::UpToDate => println!("✅ Already running {}", outcome.tag),
                Decision::Redeploy(reason) if outcome.redeployed => {
                    println!("✅ Redeployed {} ({})", outcome.tag, reason)
                }
                Decision::Redeploy(reason) => {
                    println!("🔍 Would redeploy {} ({})", outcome.tag, reason)
                }
            }
            Ok(())
        }
        Err(e) => exit_with(e),
    }
}
