use clap::{Parser, Subcommand};
use std::sync::Arc;
use taskforge_meta::core::collaborators::NoopProcessTerminator;
use taskforge_meta::core::{Clock, Config, Kernel, SystemClock};

#[derive(Parser, Debug)]
#[command(name = "taskforge", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start one in-process kernel and idle until a termination signal.
    Serve,
}

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().unwrap()),
        )
        .json()
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => serve().await,
    }
}

async fn serve() {
    let config = Config::from_env();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let kernel = Kernel::new(clock, &config, Arc::new(NoopProcessTerminator));
    kernel.start().await;

    tracing::info!("taskforge kernel started");

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received shutdown signal"),
        Err(err) => tracing::warn!(error = %err, "failed to install signal handler"),
    }
}
