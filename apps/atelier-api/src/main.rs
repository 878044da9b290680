mod cache;
mod cli;
mod config;
mod error;
mod handlers;
mod services;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum_extra::extract::cookie::CookieJar;
use clap::{Parser, Subcommand};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atelier_db::repositories::admin_repo::AdminRepository;
use atelier_db::repositories::catalog_repo::CatalogRepository;
use atelier_db::repositories::coupon_repo::CouponRepository;
use atelier_db::repositories::order_repo::OrderRepository;
use atelier_db::repositories::subscriber_repo::SubscriberRepository;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::ApiError;
use crate::handlers::admin;
use crate::handlers::admin::auth::{AdminSession, SESSION_COOKIE};
use crate::handlers::storefront;
use crate::services::catalog_service::CatalogService;
use crate::services::coupon_service::CouponService;
use crate::services::order_service::OrderService;
use crate::services::settings_service::SettingsService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub settings: Arc<SettingsService>,
    pub catalog: Arc<CatalogService>,
    pub catalog_repo: Arc<CatalogRepository>,
    pub coupons: Arc<CouponService>,
    pub coupon_repo: Arc<CouponRepository>,
    pub orders: Arc<OrderService>,
    pub subscriber_repo: Arc<SubscriberRepository>,
    pub admin_repo: Arc<AdminRepository>,
    pub sessions: Arc<TtlCache<AdminSession>>,
}

#[derive(Parser)]
#[command(name = "atelier")]
#[command(about = "Atelier storefront API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve,
    /// Administrative tools
    Admin {
        #[command(subcommand)]
        subcommand: AdminCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Create an admin account or reset its password
    ResetPassword {
        /// Username of the admin
        username: String,
        /// New password
        new_pass: String,
    },
    /// Show API connection information
    Info,
}

async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(session) = state.sessions.get(cookie.value()).await {
            if session.role != "admin" {
                return ApiError::Unauthorized("admin role required").into_response();
            }
            // The account behind the session must still exist; a stale
            // token for a removed admin is rejected.
            match state.admin_repo.exists(&session.username).await {
                Ok(true) => return next.run(req).await,
                Ok(false) => {
                    tracing::warn!(
                        "session for '{}' no longer matches an admin account",
                        session.username
                    );
                }
                Err(e) => tracing::error!("session check failed: {e:#}"),
            }
        }
    }

    ApiError::Unauthorized("authentication required").into_response()
}

async fn handler_404() -> impl IntoResponse {
    (
        axum::http::StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({ "error": "nothing to see here" })),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        println!("Warning: failed to load .env file: {e}");
    }

    let cli_args = Cli::parse();

    let file_appender = tracing_appender::rolling::never(".", "atelier.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier_api=debug,tower_http=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stdout))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    let config = Config::load()?;
    let pool = atelier_db::db::init_db(&config.database_url).await?;
    tracing::info!("Database initialized");

    match cli_args.command {
        Commands::Serve => run_server(pool, config).await?,
        Commands::Admin { subcommand } => match subcommand {
            AdminCommands::ResetPassword { username, new_pass } => {
                cli::reset_password(&pool, &username, &new_pass).await?;
            }
            AdminCommands::Info => cli::print_info(&config),
        },
    }

    Ok(())
}

async fn run_server(pool: PgPool, config: Config) -> Result<()> {
    // Every cache is built here and injected; nothing hangs off global
    // mutable state, and all of it dies with the process.
    let settings = Arc::new(SettingsService::new(
        pool.clone(),
        TtlCache::new(),
        config.settings_cache_ttl,
    ));
    let catalog = Arc::new(CatalogService::new(
        CatalogRepository::new(pool.clone()),
        TtlCache::new(),
        config.catalog_cache_ttl,
    ));
    let coupons = Arc::new(CouponService::new(
        pool.clone(),
        SubscriberRepository::new(pool.clone()),
        settings.clone(),
    ));
    let orders = Arc::new(OrderService::new(
        pool.clone(),
        OrderRepository::new(pool.clone()),
        CatalogRepository::new(pool.clone()),
        coupons.clone(),
        settings.clone(),
    ));

    let state = AppState {
        config: config.clone(),
        settings,
        catalog,
        catalog_repo: Arc::new(CatalogRepository::new(pool.clone())),
        coupons,
        coupon_repo: Arc::new(CouponRepository::new(pool.clone())),
        orders,
        subscriber_repo: Arc::new(SubscriberRepository::new(pool.clone())),
        admin_repo: Arc::new(AdminRepository::new(pool)),
        sessions: Arc::new(TtlCache::new()),
    };

    let store_routes = Router::new()
        .route("/catalog", get(storefront::get_catalog))
        .route("/products", get(storefront::list_products))
        .route("/products/{id}", get(storefront::get_product))
        .route("/popup", get(storefront::get_popup))
        .route("/subscribe", post(storefront::subscribe))
        .route("/orders", post(storefront::create_order));

    let admin_routes = Router::new()
        .route(
            "/categories",
            get(admin::categories::list).post(admin::categories::create),
        )
        .route(
            "/categories/{id}",
            patch(admin::categories::update).delete(admin::categories::remove),
        )
        .route(
            "/categories/{id}/subcategories",
            post(admin::categories::create_subcategory),
        )
        .route(
            "/subcategories/{id}",
            patch(admin::categories::update_subcategory).delete(admin::categories::remove_subcategory),
        )
        .route(
            "/products",
            get(admin::products::list).post(admin::products::create),
        )
        .route(
            "/products/{id}",
            put(admin::products::update).delete(admin::products::remove),
        )
        .route("/orders", get(admin::orders::list))
        .route("/orders/{id}", get(admin::orders::get))
        .route("/orders/{id}/status", patch(admin::orders::update_status))
        .route(
            "/coupons",
            get(admin::coupons::list).post(admin::coupons::create),
        )
        .route("/coupons/{code}/deactivate", post(admin::coupons::deactivate))
        .route("/subscribers", get(admin::subscribers::list))
        .route(
            "/settings",
            get(admin::settings::list).put(admin::settings::update),
        )
        .route("/logout", post(admin::auth::logout))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let app = Router::new()
        .nest("/api", store_routes)
        .nest(
            "/admin",
            Router::new()
                .route("/login", post(admin::auth::login))
                .merge(admin_routes),
        )
        .fallback(handler_404)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    tracing::info!("Atelier API listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
