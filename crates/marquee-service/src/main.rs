use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use clap::Parser;
use marquee_api::{
    AddOutcome, MovieSession, SelectedMovie, SessionId, SessionView, StatsView,
    API_CONTRACT_VERSION,
};
use marquee_search::{
    MovieSearch, OmdbClient, OmdbConfig, StaticCatalog, DEFAULT_OMDB_BASE_URL,
    DEFAULT_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

const SERVICE_CONTRACT_VERSION: &str = "service.v1";

type SharedSearch = Arc<dyn MovieSearch + Send + Sync>;

/// The catalog sits beside the session so a lookup never holds the lock.
#[derive(Clone)]
struct ServiceState {
    catalog: SharedSearch,
    session: Arc<Mutex<MovieSession<SharedSearch>>>,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceEnvelope<T>
where
    T: Serialize,
{
    service_contract_version: &'static str,
    api_contract_version: &'static str,
    data: T,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceError {
    service_contract_version: &'static str,
    error: String,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchRequest {
    query: String,
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    session_id: SessionId,
}

#[derive(Debug, Parser)]
#[command(name = "marquee-service")]
#[command(about = "Local HTTP service for a Marquee movie session")]
struct Args {
    #[arg(long, env = "MARQUEE_BIND", default_value = "127.0.0.1:4020")]
    bind: SocketAddr,

    /// Answer searches from a JSON array of OMDb movies instead of the network
    #[arg(long, env = "MARQUEE_CATALOG")]
    catalog: Option<PathBuf>,

    #[arg(long, env = "OMDB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "OMDB_BASE_URL", default_value = DEFAULT_OMDB_BASE_URL)]
    omdb_url: String,

    #[arg(long, env = "MARQUEE_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = StatusCode::BAD_REQUEST;
        (status, Json(self)).into_response()
    }
}

impl ServiceState {
    fn new(catalog: SharedSearch) -> Self {
        let session = MovieSession::new(Arc::clone(&catalog));
        Self { catalog, session: Arc::new(Mutex::new(session)) }
    }

    fn error(message: impl Into<String>) -> ServiceError {
        ServiceError { service_contract_version: SERVICE_CONTRACT_VERSION, error: message.into() }
    }

    fn session(&self) -> Result<MutexGuard<'_, MovieSession<SharedSearch>>, ServiceError> {
        self.session.lock().map_err(|_| {
            tracing::error!("session lock poisoned");
            Self::error("session state is unavailable after an earlier failure")
        })
    }
}

fn envelope<T>(data: T) -> ServiceEnvelope<T>
where
    T: Serialize,
{
    ServiceEnvelope {
        service_contract_version: SERVICE_CONTRACT_VERSION,
        api_contract_version: API_CONTRACT_VERSION,
        data,
    }
}

fn build_search(args: &Args) -> Result<SharedSearch> {
    if let Some(path) = &args.catalog {
        let catalog = StaticCatalog::from_path(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?;
        return Ok(Arc::new(catalog));
    }

    let api_key = args.api_key.clone().ok_or_else(|| {
        anyhow!("no movie source configured: pass --catalog FILE or --api-key KEY (or set OMDB_API_KEY)")
    })?;
    Ok(Arc::new(OmdbClient::new(OmdbConfig {
        base_url: args.omdb_url.clone(),
        api_key,
        timeout_secs: args.timeout_secs,
    })))
}

fn app(state: ServiceState) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/session", get(session_show))
        .route("/v1/search", post(search))
        .route("/v1/selection", get(selection_list))
        .route("/v1/selection/add", post(selection_add))
        .route("/v1/selection/:index", delete(selection_remove))
        .route("/v1/aggregate", get(aggregate))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();
    let state = ServiceState::new(build_search(&args)?);
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(bind = %args.bind, "marquee service listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn health(
    State(state): State<ServiceState>,
) -> Result<Json<ServiceEnvelope<HealthResponse>>, ServiceError> {
    let session_id = state.session()?.session_id();
    Ok(Json(envelope(HealthResponse { status: "ok", session_id })))
}

async fn session_show(
    State(state): State<ServiceState>,
) -> Result<Json<ServiceEnvelope<SessionView>>, ServiceError> {
    Ok(Json(envelope(state.session()?.view())))
}

fn rejection_error(rejection: impl std::fmt::Display) -> ServiceError {
    ServiceState::error(format!("invalid request: {rejection}"))
}

/// A failed lookup is not an HTTP error: the returned view carries the notice.
async fn search(
    State(state): State<ServiceState>,
    request: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<ServiceEnvelope<SessionView>>, ServiceError> {
    let Json(request) = request.map_err(rejection_error)?;

    // The OMDb client blocks, so the lookup runs off the async workers and
    // outside the session lock.
    let catalog = Arc::clone(&state.catalog);
    let query = request.query.clone();
    let result = tokio::task::spawn_blocking(move || catalog.search(&query))
        .await
        .map_err(|err| ServiceState::error(format!("search task failed: {err}")))?;

    let mut session = state.session()?;
    let _ = session.apply_search(&request.query, result);
    Ok(Json(envelope(session.view())))
}

async fn selection_add(
    State(state): State<ServiceState>,
) -> Result<Json<ServiceEnvelope<AddOutcome>>, ServiceError> {
    let outcome =
        state.session()?.add_pending().map_err(|err| ServiceState::error(err.to_string()))?;
    Ok(Json(envelope(outcome)))
}

async fn selection_list(
    State(state): State<ServiceState>,
) -> Result<Json<ServiceEnvelope<Vec<SelectedMovie>>>, ServiceError> {
    Ok(Json(envelope(state.session()?.selected())))
}

async fn selection_remove(
    State(state): State<ServiceState>,
    index: Result<Path<i64>, PathRejection>,
) -> Result<Json<ServiceEnvelope<SessionView>>, ServiceError> {
    let Path(index) = index.map_err(rejection_error)?;
    let mut session = state.session()?;
    session.remove(index).map_err(|err| ServiceState::error(err.to_string()))?;
    Ok(Json(envelope(session.view())))
}

async fn aggregate(
    State(state): State<ServiceState>,
) -> Result<Json<ServiceEnvelope<StatsView>>, ServiceError> {
    Ok(Json(envelope(state.session()?.stats())))
}
