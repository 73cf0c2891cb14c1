use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use desktop_agent::brain::Brain;
use desktop_agent::bridge::EventBridge;
use desktop_agent::config::{Args, Config};
use desktop_agent::eyes::ScreenEyes;
use desktop_agent::face;
use desktop_agent::hands::DesktopHands;
use desktop_agent::session::{SessionController, Worker};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // A missing credential is fatal before any session can exist.
    let config = Config::from_env(&args).context("startup aborted")?;
    tracing::info!(model = %config.model, "configuration loaded");

    let (ui_rx, update_tx) = face::start_server(args.port).await?;

    let (bridge_tx, bridge) = EventBridge::channel();
    let (jobs_tx, jobs_rx) = mpsc::unbounded_channel();

    let worker = Worker::new(ScreenEyes, Brain::new(&config), DesktopHands, bridge_tx);
    tokio::spawn(worker.run(jobs_rx));

    SessionController::new(jobs_tx, update_tx).run(ui_rx, bridge).await;

    Ok(())
}
