use tide_dispatch::{BackgroundTasks, DispatchState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, work dir, logging)
    let config = setup_environment()?;

    print_banner();

    tracing::info!(
        environment = %config.environment,
        printing_enabled = config.printing_enabled,
        "Tide dispatch starting..."
    );
    if !config.printing_enabled {
        tracing::warn!("Printing disabled: receipts are rendered and logged only");
    }

    // 2. Store, printers, coordinator
    let state = DispatchState::initialize(&config)?;

    // 3. Watchers, inbox and housekeeping
    let mut tasks = BackgroundTasks::new();
    state.start_background_tasks(&mut tasks);
    tasks.log_summary();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    tasks.shutdown().await;
    Ok(())
}
