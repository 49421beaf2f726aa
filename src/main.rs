use chrono::Duration;
use std::{net::SocketAddr, sync::Arc, time::Duration as StdDuration};
use tokio::{fs, time::timeout};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use walk_tracker::{
    clock::SystemClock,
    notify::NotificationQueue,
    router,
    storage::FileStore,
    watchdog, AppState, Config, DailyCounterStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    if let Some(parent) = config.data_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let notifications = Arc::new(NotificationQueue::default());
    let near_midnight = Duration::from_std(config.near_midnight)?;
    let (file_store, writer) = FileStore::open(&config.data_path).await;
    let tracker = DailyCounterStore::open(
        Box::new(file_store),
        notifications.clone(),
        Arc::new(SystemClock),
        config.daily_cap,
    )
    .with_near_midnight(near_midnight);

    let state = AppState::new(tracker, notifications);
    let watchdog = watchdog::spawn(state.tracker.clone(), config.watchdog);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(data_path = %config.data_path.display(), "listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    watchdog.shutdown().await;
    if timeout(StdDuration::from_secs(5), writer).await.is_err() {
        warn!("data file writer did not finish before exit");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
