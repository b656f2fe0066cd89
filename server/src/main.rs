use std::net::SocketAddr;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};

use finance_tracker_server::backend::{
    config::Config,
    create_router, initialize_backend,
    logging::init_logging,
    scheduler::{
        tasks::{CHECK_BUDGET_LIMITS, RENEW_RECURRING_BUDGETS},
        RunOutcome,
    },
};

#[derive(Parser)]
#[command(name = "finance-tracker", version, about = "Personal finance tracker server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the REST API and run the scheduler (default)
    Serve,
    /// Alert on budgets that crossed their threshold or limit
    #[command(name = "budgets:check-limits")]
    CheckLimits,
    /// Start the next period of recurring budgets that have ended
    #[command(name = "budgets:renew-recurring")]
    RenewRecurring,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CheckLimits => run_command(config, CHECK_BUDGET_LIMITS).await,
        Command::RenewRecurring => run_command(config, RENEW_RECURRING_BUDGETS).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    let bind_addr = config.bind_addr;
    let scheduler_enabled = config.scheduler_enabled;

    let app_state = initialize_backend(config).await?;
    if scheduler_enabled {
        tokio::spawn(app_state.scheduler().run());
    } else {
        info!(target: "scheduler", "Scheduler disabled");
    }

    let app = create_router(app_state)?;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!(target: "app", "Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("Server error")
}

/// Run one scheduled command now, still taking its locks
async fn run_command(config: Config, name: &str) -> Result<()> {
    let app_state = initialize_backend(config).await?;

    match app_state.scheduler().run_now(name).await {
        Some(RunOutcome::Completed(summary)) => {
            println!("{}", summary);
            Ok(())
        }
        Some(RunOutcome::SkippedOtherNode) | Some(RunOutcome::SkippedOverlap) => {
            println!("{} skipped, it is already running or ran this minute", name);
            Ok(())
        }
        Some(RunOutcome::Failed(message)) => {
            error!(target: "scheduler", task = name, "{}", message);
            bail!("{} failed: {}", name, message)
        }
        None => bail!("Unknown command {}", name),
    }
}
