//! HTTP Server configuration and startup.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ledger_types::LedgerRepository;

use super::handlers::{self, AppState};
use super::rate_limit::{RateLimiterState, rate_limit_middleware};
use crate::LedgerService;
use crate::openapi::ApiDoc;

/// HTTP Server for the Ledger API.
pub struct HttpServer<R: LedgerRepository> {
    state: Arc<AppState<R>>,
    rate_limiter: Arc<RateLimiterState>,
}

impl<R: LedgerRepository> HttpServer<R> {
    /// Creates a new HTTP server with the given service.
    pub fn new(service: LedgerService<R>) -> Self {
        Self {
            state: Arc::new(AppState { service }),
            rate_limiter: Arc::new(RateLimiterState::default()), // 100 req/min default
        }
    }

    /// Creates a new HTTP server with custom rate limiting.
    pub fn with_rate_limit(service: LedgerService<R>, requests_per_minute: u32) -> Self {
        Self {
            state: Arc::new(AppState { service }),
            rate_limiter: Arc::new(RateLimiterState::new(
                requests_per_minute,
                Duration::from_secs(60),
            )),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        // Build HTTP metrics layer (uses globally set MeterProvider)
        let metrics = axum_otel_metrics::HttpMetricsLayerBuilder::new().build();

        Router::new()
            .route("/health", get(handlers::health))
            // Transfers
            .route("/api/transfers", post(handlers::create_transfer::<R>))
            .route("/api/transfers/recharge", post(handlers::recharge::<R>))
            .route(
                "/api/transfers/bill-payment",
                post(handlers::bill_payment::<R>),
            )
            .route("/api/transfers/{id}", get(handlers::get_transfer::<R>))
            // Thresholds
            .route(
                "/api/thresholds/validate",
                post(handlers::validate_thresholds::<R>),
            )
            .route(
                "/api/thresholds/profiles",
                post(handlers::create_profile::<R>),
            )
            .route(
                "/api/thresholds/profiles/{id}/limits/{group}",
                put(handlers::set_limits::<R>),
            )
            // Wallets
            .route("/api/wallets", post(handlers::create_wallet::<R>))
            // Parties
            .route(
                "/api/parties/{owner}/transfers",
                get(handlers::list_transfers::<R>),
            )
            .route(
                "/api/parties/{owner}/limits",
                get(handlers::remaining_limits::<R>),
            )
            .route("/api/parties/{owner}/wallet", get(handlers::get_wallet::<R>))
            .route(
                "/api/parties/{owner}/wallet/balance-check",
                get(handlers::check_balance::<R>),
            )
            .route(
                "/api/parties/{owner}/wallet/credit",
                post(handlers::credit_wallet::<R>),
            )
            .route(
                "/api/parties/{owner}/wallet/debit",
                post(handlers::debit_wallet::<R>),
            )
            // Directory and catalog
            .route("/api/accounts", post(handlers::register_account::<R>))
            .route("/api/accounts/{owner}", get(handlers::get_account::<R>))
            .route("/api/products/{id}", put(handlers::set_product_status::<R>))
            .layer(metrics)
            .layer(middleware::from_fn_with_state(
                self.rate_limiter.clone(),
                rate_limit_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
