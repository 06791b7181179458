use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use folio_core::catalog::{Product, ProductCatalog};
use folio_core::domain::{AllocationResult, UserInputRequest};
use folio_core::matrix::AllocationMatrix;
use folio_core::product_allocation::ProductAllocationResult;
use folio_core::AllocationError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = folio_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let matrix = match folio_core::matrix::source::from_settings(&settings) {
        Ok(source) => match source.load_matrix().await {
            Ok(matrix) => Some(LoadedMatrix {
                matrix: Arc::new(matrix),
                loaded_at: Utc::now(),
            }),
            Err(e) => {
                sentry::capture_error(&e);
                tracing::error!(error = %e, "matrix load failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "matrix source misconfigured; starting API in degraded mode");
            None
        }
    };

    let catalog = match ProductCatalog::load(settings.product_catalog_path()).await {
        Ok(catalog) => Some(Arc::new(catalog)),
        Err(e) => {
            sentry::capture_error(&e);
            tracing::error!(error = %e, "product catalog load failed; product routes disabled");
            None
        }
    };

    let state = AppState { matrix, catalog };

    let app = router(state)
        .layer(cors_layer(&settings)?)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/allocation/compute", post(compute_allocation))
        .route("/allocation/amount", post(compute_amount))
        .route(
            "/product-allocation/calculate",
            post(calculate_product_allocations),
        )
        .route("/products", get(list_products))
        .with_state(state)
}

#[derive(Debug, Clone)]
struct LoadedMatrix {
    matrix: Arc<AllocationMatrix>,
    loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct AppState {
    matrix: Option<LoadedMatrix>,
    catalog: Option<Arc<ProductCatalog>>,
}

impl AppState {
    fn matrix(&self) -> Result<&AllocationMatrix, ApiError> {
        self.matrix
            .as_ref()
            .map(|m| m.matrix.as_ref())
            .ok_or(ApiError::Unavailable("allocation matrix is not loaded"))
    }

    fn catalog(&self) -> Result<&ProductCatalog, ApiError> {
        self.catalog
            .as_deref()
            .ok_or(ApiError::Unavailable("product catalog is not loaded"))
    }
}

#[derive(Debug)]
enum ApiError {
    Allocation(AllocationError),
    Unavailable(&'static str),
    NotFound(&'static str),
}

impl From<AllocationError> for ApiError {
    fn from(err: AllocationError) -> Self {
        ApiError::Allocation(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            ApiError::Allocation(err) => {
                let status = if err.is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    sentry::capture_error(err);
                    tracing::error!(error = %err, "allocation request failed");
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, err.kind(), err.to_string())
            }
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg.to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.to_string()),
        };

        let body = serde_json::json!({
            "error": {
                "code": status.as_u16(),
                "kind": kind,
                "message": message,
            }
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    matrix_loaded_at: Option<DateTime<Utc>>,
    products: Option<usize>,
}

async fn healthz(State(state): State<AppState>) -> Json<Health> {
    let status = if state.matrix.is_some() && state.catalog.is_some() {
        "ok"
    } else {
        "degraded"
    };
    Json(Health {
        status,
        matrix_loaded_at: state.matrix.as_ref().map(|m| m.loaded_at),
        products: state.catalog.as_ref().map(|c| c.len()),
    })
}

async fn compute_allocation(
    State(state): State<AppState>,
    Json(request): Json<UserInputRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request_id = Uuid::new_v4();
    let matrix = state.matrix()?;

    let input = request.into_input()?;
    let result = folio_core::allocation::compute_allocation(&input, matrix)?;

    tracing::info!(%request_id, goal = %input.goal, "allocation served");
    Ok((
        [("x-request-id", request_id.to_string())],
        Json(result),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AmountRequest {
    percentage_split: f64,
    target_amount: f64,
    annual_return: f64,
    investment_horizon: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AmountResponse {
    investment_amount: f64,
}

async fn compute_amount(Json(req): Json<AmountRequest>) -> Result<Json<AmountResponse>, ApiError> {
    let investment_amount = folio_core::amount::compute_amount(
        req.percentage_split,
        req.target_amount,
        req.annual_return,
        &req.investment_horizon,
    )?;
    Ok(Json(AmountResponse { investment_amount }))
}

#[derive(Debug, Deserialize)]
struct ProductAllocationQuery {
    target_amount: f64,
    investment_horizon: Option<String>,
}

async fn calculate_product_allocations(
    State(state): State<AppState>,
    Query(query): Query<ProductAllocationQuery>,
    Json(allocation): Json<AllocationResult>,
) -> Result<Json<ProductAllocationResult>, ApiError> {
    let catalog = state.catalog()?;
    let horizon = query.investment_horizon.unwrap_or_default();

    let result = folio_core::product_allocation::compute_product_allocations(
        &allocation,
        query.target_amount,
        &horizon,
        catalog,
    )?;

    if result.is_empty() {
        return Err(ApiError::NotFound("no product allocations found"));
    }
    Ok(Json(result))
}

async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let catalog = state.catalog()?;
    Ok(Json(catalog.list_products().into_iter().cloned().collect()))
}

fn cors_layer(settings: &folio_core::config::Settings) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match settings.cors_allowed_origin.as_deref() {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin).context("invalid CORS_ALLOWED_ORIGIN")?;
            Ok(layer.allow_origin(origin))
        }
        None => Ok(layer.allow_origin(Any)),
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &folio_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
