use axum::http::HeaderValue;
use axum::response::Json;
use axum::routing::get;
use axum::{Router, extract::State};
use serde::Serialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use eps_core::{BundleStore, CoreConfig, PatientSummary};
use fhir::SearchSet;

mod error;
mod fhir_routes;
mod smart;

/// Application state shared across REST API handlers
///
/// Holds the bundle store; its document cache is shared by all handlers and
/// lives for the process lifetime.
#[derive(Clone)]
pub(crate) struct AppState {
    store: BundleStore,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        root,
        health,
        list_patients,
        fhir_routes::get_patient,
        fhir_routes::get_conditions,
        fhir_routes::get_immunizations,
        fhir_routes::get_procedures,
        fhir_routes::get_care_plans,
        fhir_routes::get_observations,
        smart::smart_launch
    ),
    components(schemas(
        HealthRes,
        PatientsRes,
        PatientSummary,
        SearchSet,
        smart::SmartContext
    ))
)]
struct ApiDoc;

/// Main entry point for the EPS Bundle API
///
/// Serves synthetic European Patient Summary bundles over a read-only REST
/// surface, plus a simulated SMART App Launch endpoint.
///
/// # Environment Variables
/// - `EPS_ADDR`: server address (default: "127.0.0.1:8000")
/// - `EPS_DATA_DIR`: directory holding `eps-*.json` bundles (default: "data")
/// - `FRONTEND_URL`: CORS allow-origin; unset or "*" means permissive
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If server startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("eps_run=info".parse()?)
                .add_directive("eps_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("EPS_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".into());
    let data_dir = std::env::var("EPS_DATA_DIR").unwrap_or_else(|_| "data".into());
    let frontend_url = std::env::var("FRONTEND_URL").ok();

    tracing::info!("++ Starting EPS API on {}", addr);
    tracing::info!("++ Serving bundles from {}", data_dir);

    let store = BundleStore::new(Arc::new(CoreConfig::new(PathBuf::from(data_dir))));
    let app = app(store, cors_layer(frontend_url));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router against a store.
///
/// Separated from `main` so router tests can drive it with `oneshot`.
pub(crate) fn app(store: BundleStore, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/patients", get(list_patients))
        .route("/smart/launch", get(smart::smart_launch))
        .route("/fhir/Patient/:patient_id", get(fhir_routes::get_patient))
        .route("/fhir/Condition", get(fhir_routes::get_conditions))
        .route("/fhir/Immunization", get(fhir_routes::get_immunizations))
        .route("/fhir/Procedure", get(fhir_routes::get_procedures))
        .route("/fhir/CarePlan", get(fhir_routes::get_care_plans))
        .route("/fhir/Observation", get(fhir_routes::get_observations))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(AppState { store })
}

/// CORS policy from the optional `FRONTEND_URL` origin.
///
/// Unset, `"*"`, or an unparseable value all fall back to permissive.
fn cors_layer(frontend_url: Option<String>) -> CorsLayer {
    if let Some(origin) = frontend_url.filter(|origin| origin != "*") {
        match origin.parse::<HeaderValue>() {
            Ok(origin) => {
                return CorsLayer::new()
                    .allow_origin(origin)
                    .allow_methods(Any)
                    .allow_headers(Any);
            }
            Err(_) => tracing::warn!("ignoring unparseable FRONTEND_URL {origin:?}"),
        }
    }
    CorsLayer::permissive()
}

/// Health check response body.
#[derive(Serialize, ToSchema)]
struct HealthRes {
    #[schema(value_type = String, example = "healthy")]
    status: &'static str,
}

/// Patient directory response body.
#[derive(Serialize, ToSchema)]
struct PatientsRes {
    patients: Vec<PatientSummary>,
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "API information document", body = Object))
)]
/// Root endpoint providing API information.
async fn root() -> Json<Value> {
    Json(json!({
        "name": "EPS Bundle API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "European Patient Summary (EPS) FHIR API with SMART App Launch simulation",
        "endpoints": {
            "smart": "/smart/launch",
            "fhir": {
                "patient": "/fhir/Patient/{id}",
                "condition": "/fhir/Condition?patient={id}",
                "immunization": "/fhir/Immunization?patient={id}",
                "procedure": "/fhir/Procedure?patient={id}",
                "careplan": "/fhir/CarePlan?patient={id}",
                "observation": "/fhir/Observation?patient={id}",
            },
            "docs": "/swagger-ui",
        },
    }))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Health check response", body = HealthRes))
)]
/// Health check endpoint.
async fn health() -> Json<HealthRes> {
    Json(HealthRes { status: "healthy" })
}

#[utoipa::path(
    get,
    path = "/patients",
    responses((status = 200, description = "All known patients with display data", body = PatientsRes))
)]
/// List all available patients with their identifiers and names.
///
/// A resolution failure for one patient degrades that entry to placeholder
/// values; it never aborts the listing.
async fn list_patients(State(state): State<AppState>) -> Json<PatientsRes> {
    Json(PatientsRes {
        patients: eps_core::list_patients(&state.store),
    })
}
