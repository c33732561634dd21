use ratekeeper::auth::{ensure_default_admin, SledUserRepository};
use ratekeeper::feed::OpenExchangeRatesClient;
use ratekeeper::persistence::SledCurrencyStore;
use ratekeeper::planes::control::CurrencyAdmin;
use ratekeeper::planes::data::RateResolver;
use ratekeeper::RateRefresher;
use server_http::{AppState, RateLimiter};
use shared::config::Config;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use storage_engine::MokaRateCache;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables before the filter reads RUST_LOG
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Ratekeeper Server");
    match dotenv {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };
    info!(
        "Configuration loaded: data_dir={}, refresh_interval={:?}, cache_ttl={:?}",
        config.data_dir, config.refresh_interval, config.cache_ttl
    );

    // ============================================
    // STEP 1: Storage, cache and rate feed
    // ============================================
    std::fs::create_dir_all(&config.data_dir)?;
    let db = sled::open(Path::new(&config.data_dir).join("ratekeeper.sled"))?;

    let store = Arc::new(SledCurrencyStore::from_db(db.clone())?);
    let users = Arc::new(SledUserRepository::from_db(db));
    let cache = Arc::new(MokaRateCache::new(config.cache_capacity));
    let feed = Arc::new(OpenExchangeRatesClient::from_settings(&config.feed));

    // ============================================
    // STEP 2: Default admin
    // ============================================
    if let Some(generated_key) =
        ensure_default_admin(users.as_ref(), &config.admin_username, config.admin_api_key.clone())
            .await?
    {
        warn!(
            "Generated API key for admin '{}': {} (set RATEKEEPER_ADMIN_API_KEY to choose one)",
            config.admin_username, generated_key
        );
    }

    // ============================================
    // STEP 3: Populate rates, then start the refresher
    // ============================================
    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    let refresher = RateRefresher::new(
        store.clone(),
        cache.clone(),
        feed,
        config.refresh_interval,
        config.cache_ttl,
    );
    let refresher_handle = match refresher.start(shutdown.clone()).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("Initial rate population failed: {}", e);
            store.flush().await?;
            return Err(e.into());
        }
    };

    // ============================================
    // STEP 4: HTTP server
    // ============================================
    let state = AppState::new(
        Arc::new(RateResolver::new(store.clone(), cache.clone(), config.cache_ttl)),
        Arc::new(CurrencyAdmin::new(store.clone(), cache, config.cache_ttl)),
        users,
        RateLimiter::new(config.rate_limit_rps, config.rate_limit_burst),
    );
    let router = server_http::build_router(state);

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("HTTP Server listening on http://{}", config.bind_address());

    let http_shutdown = shutdown.clone();
    let http_handle = tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { http_shutdown.cancelled().await })
        .await
    });

    info!("Ratekeeper server started successfully");

    // ============================================
    // STEP 5: Wait for both tasks, then flush
    // ============================================
    match http_handle.await {
        Ok(Ok(())) => info!("HTTP server stopped"),
        Ok(Err(e)) => error!("HTTP server error: {}", e),
        Err(e) => error!("HTTP server task failed: {}", e),
    }
    // A server that died on its own still has to stop the refresher
    shutdown.cancel();
    refresher_handle.join().await;

    store.flush().await?;
    info!("Ratekeeper server shut down");
    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM
async fn cancel_on_signal(token: CancellationToken) {
    shutdown_signal().await;
    token.cancel();
}

// Graceful shutdown handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}
