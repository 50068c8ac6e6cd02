mod api;
mod auth;
mod middleware;
mod refresh;

use std::time::Duration;

use catalog_offers::OfferClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    auth::TokenSigner,
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = catalog_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(env = ?config.env, bind_addr = %config.bind_addr, "starting catalog server");

    let pool_config = catalog_db::PoolConfig::from_app_config(&config);
    let pool = catalog_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = catalog_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let offers = OfferClient::new(
        &config.offers_base_url,
        &config.offers_refresh_token,
        config.offers_request_timeout_secs,
    )?
    .with_access_token(config.offers_access_token.clone());

    let refresh_handle = refresh::spawn_refresh_loop(
        pool.clone(),
        offers.clone(),
        Duration::from_secs(config.refresh_interval_secs),
        config.refresh_failure_policy,
    );

    let auth = AuthState::new(TokenSigner::new(&config.jwt_secret, config.jwt_expire_secs)?);
    let app = build_app(
        AppState { pool, offers, auth },
        default_rate_limit_state(),
        &config.api_prefix,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, prefix = %config.api_prefix, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresh_handle.abort();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
