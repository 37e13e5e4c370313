use crate::config::{DatabaseSettings, Settings};
use crate::domain::Domain;
use crate::handlers::{admin, app, health::health_check, metrics::metrics, ops, pages, www};
use crate::middleware::{edge_gate_middleware, resolve_domain_middleware};
use crate::services::{AuthClient, PgDirectory};
use crate::AppState;
use axum::{
    extract::Request,
    middleware::{from_fn, from_fn_with_state},
    response::Response,
    routing::get,
    Extension, Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::{metrics_middleware, route_label_middleware},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// One router per front-end. Requests are dispatched by the `Domain` that
/// [`resolve_domain_middleware`] attached.
#[derive(Clone)]
struct DomainRouters {
    www: Router,
    app: Router,
    admin: Router,
    ops: Router,
}

impl DomainRouters {
    fn new(state: &AppState) -> Self {
        Self {
            www: www_router()
                .layer(from_fn(route_label_middleware))
                .with_state(state.clone()),
            app: gated(app_router(), state),
            admin: gated(admin_router(), state),
            ops: gated(ops_router(), state),
        }
    }

    async fn dispatch(&self, domain: Domain, request: Request) -> Response {
        let router = match domain {
            Domain::Www => self.www.clone(),
            Domain::App => self.app.clone(),
            Domain::Admin => self.admin.clone(),
            Domain::Ops => self.ops.clone(),
        };

        match router.oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}

fn www_router() -> Router<AppState> {
    Router::new()
        .route("/", get(www::index))
        .route("/login", get(www::login_page).post(www::login_handler))
        .route("/logout", get(www::logout_handler).post(www::logout_handler))
        .fallback(pages::not_found)
}

fn app_router() -> Router<AppState> {
    Router::new()
        .route("/", get(app::dashboard))
        .route("/orgs/:slug", get(app::org_page))
        .route("/unauthorized", get(pages::unauthorized))
        .fallback(pages::not_found)
}

fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::overview))
        .route("/orgs/:slug", get(admin::org_overview))
        .route("/unauthorized", get(pages::unauthorized))
        .fallback(pages::not_found)
}

fn ops_router() -> Router<AppState> {
    Router::new()
        .route("/", get(ops::console))
        .route("/orgs/:slug", get(ops::org_console))
        .route("/unauthorized", get(pages::unauthorized))
        .fallback(pages::not_found)
}

/// Put a front-end behind the edge gate, fallback included.
fn gated(router: Router<AppState>, state: &AppState) -> Router {
    router
        .layer(from_fn(route_label_middleware))
        .layer(from_fn_with_state(state.clone(), edge_gate_middleware))
        .with_state(state.clone())
}

pub fn build_router(state: AppState) -> Router {
    let routers = Arc::new(DomainRouters::new(&state));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .nest_service("/static", ServeDir::new(&state.settings.server.static_dir))
        .fallback(
            move |Extension(domain): Extension<Domain>, request: Request| {
                let routers = routers.clone();
                async move { routers.dispatch(domain, request).await }
            },
        )
        .with_state(state)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");
                let domain = request
                    .extensions()
                    .get::<Domain>()
                    .map(Domain::as_str)
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    domain = %domain,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(resolve_domain_middleware))
        .layer(from_fn(request_id_middleware))
}

pub async fn create_pool(config: &DatabaseSettings) -> Result<PgPool, AppError> {
    tracing::info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(config.url.expose_secret())
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to PostgreSQL: {}", e);
            AppError::from(e)
        })?;

    tracing::info!("Successfully connected to PostgreSQL");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
    tracing::info!("Database migrations completed");
    Ok(())
}

pub struct Application {
    port: u16,
    server: Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>,
}

impl Application {
    pub async fn build(settings: Settings) -> Result<Self, AppError> {
        let pool = create_pool(&settings.database).await?;
        if settings.database.run_migrations {
            run_migrations(&pool).await?;
        }

        let auth = Arc::new(AuthClient::new(settings.auth.clone())?);
        let directory = Arc::new(PgDirectory::new(pool));

        let address = format!("{}:{}", settings.server.host, settings.server.port);
        let state = AppState::new(settings, auth, directory);
        let app = build_router(state);

        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Starting portal on {}", address);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::pin(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
