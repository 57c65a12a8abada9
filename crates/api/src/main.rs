use std::sync::Arc;

use boxoffice_infra::AppConfig;
use boxoffice_infra::workers::{LoggingNotifier, NotificationWorker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    boxoffice_observability::init();

    let config = AppConfig::from_env()?;

    let services = boxoffice_api::app::services::build_services(&config);
    let notifications = NotificationWorker::spawn(services.bus.as_ref(), Arc::new(LoggingNotifier))?;

    let app = boxoffice_api::app::router(services, &config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;

    notifications.shutdown();
    Ok(())
}
