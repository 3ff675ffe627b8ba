#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![deny(clippy::pedantic)]
#![deny(clippy::get_unwrap)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod config;
mod context;
mod dispatch;
mod error;
mod layer;
mod migrations;
mod path;
mod registry;
mod repos;
mod system;

use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};

use atelier_sandbox::SandboxHost;
pub use config::*;
pub use registry::{EndpointRoute, PageRoute, Registry, RouteInfo};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Pool, Sqlite,
};
use tower::{make::Shared, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

use crate::{
    context::Context,
    dispatch::DispatchService,
    layer::{auth_service::AuthServiceLayer, request_mapper::LogicalRequestResponseLayer},
    repos::Repos,
};

pub async fn shutdown_signal() {
    // Wait for the CTRL+C signal
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C signal handler");
}

pub async fn start(
    mut config: Config,
    shutdown_signal: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    info!("Starting atelier");
    config.sanitize()?;

    let port_tx = config.port_tx.take();
    let config = Arc::new(config);

    let pool = connect(&config).await?;
    migrations::migrate(&pool).await?;

    let repos = Repos::new(pool);
    let host = Arc::new(SandboxHost::default());
    let registry = Arc::new(Registry::new(repos.clone(), host));
    let ctx = Context {
        config: Arc::clone(&config),
        repos: repos.clone(),
        registry: Arc::clone(&registry),
    };

    let dispatcher = DispatchService::new(
        Arc::clone(&registry),
        repos.clone(),
        config.handler_timeout(),
    );
    let api = system::new_api_router(ctx, dispatcher);

    let server_svc = ServiceBuilder::new()
        .concurrency_limit(1000)
        .timeout(Duration::from_secs(30))
        .layer(RequestBodyLimitLayer::new(1024 * 64))
        .layer(LogicalRequestResponseLayer::new())
        .layer(AuthServiceLayer::new(
            repos.user.clone(),
            Arc::clone(&config),
        ))
        .service(api);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let server = hyper::Server::bind(&addr).serve(Shared::new(server_svc));
    let addr = server.local_addr();
    let server = server.with_graceful_shutdown(shutdown_signal);

    info!("listening on {addr}");
    if let Some(tx) = port_tx {
        let _ = tx.send(addr.port());
    }

    if let Err(error) = server.await {
        tracing::error!(?error, "Encountered server error. Shutting down.");
        return Err(error.into());
    }

    repos.close().await;

    info!("atelier server shut down");
    Ok(())
}

async fn connect(config: &Config) -> Result<Pool<Sqlite>, sqlx::Error> {
    if config.using_inmemory_storage() {
        // A single connection keeps every handle on the same database.
        SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .connect_with(SqliteConnectOptions::new().filename(":memory:").foreign_keys(true))
            .await
    } else {
        SqlitePoolOptions::new()
            .min_connections(1)
            .connect_with(
                SqliteConnectOptions::new()
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .foreign_keys(true)
                    .synchronous(SqliteSynchronous::Full)
                    .pragma("busy_timeout", "5000")
                    .filename(&config.database_url),
            )
            .await
    }
}
