use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use poem::{Route, Server, listener::TcpListener};
use poem_openapi::OpenApiService;
use tokio::main;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use notifi::{
    application::{
        handlers::delivery_worker::DeliveryWorker, services::dispatch::DeliveryDispatcher,
    },
    config::{Config, HealthServerConfig},
    infrastructure::{
        messaging::{discord::DiscordWebhookClient, jetstream::JetstreamQueue},
        repositories::postgres::{
            self, PostgresDestinationRepository, PostgresHealth, PostgresMessageRepository,
        },
    },
    presentation::http::endpoints::health::HealthEndpoints,
};

#[main]
async fn main() -> anyhow::Result<()> {
    let config = Config::try_parse()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "notifi=debug,info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("connecting to postgres");
    let pool = postgres::connect(&config.database).await?;
    info!(stream = %config.jetstream.stream, subject = %config.jetstream.subject, "connecting to jetstream");
    let queue = JetstreamQueue::connect(&config.jetstream).await?;
    let webhook = DiscordWebhookClient::new(config.webhook_timeout)?;

    let worker = DeliveryWorker::new(
        PostgresMessageRepository::new(pool.clone()),
        PostgresDestinationRepository::new(pool.clone()),
        queue.clone(),
        DeliveryDispatcher::new(Arc::new(webhook)),
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let health = HealthEndpoints::new(PostgresHealth::new(pool.clone()), queue);
    let server = tokio::spawn(serve_health(config.health.clone(), health, shutdown.clone()));

    worker.run(&config.worker, shutdown.clone()).await;

    shutdown.cancel();
    server
        .await
        .context("health server task panicked")?
        .context("health server failed")?;
    pool.close().await;

    Ok(())
}

async fn serve_health(
    config: HealthServerConfig,
    endpoints: HealthEndpoints,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let address = format!("{}:{}", config.host, config.port);
    info!("starting health server at http://{address}/api/v1/health");

    let api_service = OpenApiService::new(endpoints, "notifi delivery worker", env!("CARGO_PKG_VERSION"))
        .server(format!("http://{address}/api"));
    let ui = api_service.swagger_ui();
    let app = Route::new().nest("/api", api_service).nest("/docs", ui);

    let result = Server::new(TcpListener::bind(address))
        .run_with_graceful_shutdown(app, shutdown.clone().cancelled_owned(), Some(Duration::from_secs(5)))
        .await;

    if let Err(err) = &result {
        error!(error = %err, "health server stopped");
        shutdown.cancel();
    }
    result
}

/// Cancels `shutdown` on CTRL+C or SIGTERM.
async fn cancel_on_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received CTRL+C, finishing current batch"),
        () = terminate => info!("received SIGTERM, finishing current batch"),
    }
    shutdown.cancel();
}
