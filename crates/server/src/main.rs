use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use server_api::{
    add_flower, admin_login, admin_overview, authorize_admin, change_water, garden_view,
    trim_flower, ApiContext,
};
use shared::{
    clock::SystemClock,
    domain::FlowerId,
    error::{ApiError, ErrorCode},
    garden::GardenView,
    protocol::{
        ActionResponse, AddFlowerRequest, AdminOverview, ChangeWaterRequest, TrimFlowerRequest,
    },
};
use storage::Storage;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod session;

use app_state::AppState;
use config::{admin_credential, load_settings, prepare_database_url, session_keys};
use session::{cleared_session_cookie, session_cookie, session_token, RequireAdmin};

const MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Debug, Default, Deserialize)]
struct AdminForm {
    password: Option<String>,
    flower_type: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext {
        storage,
        clock: Arc::new(SystemClock),
        credential: admin_credential(&settings)?,
        sessions: session_keys(&settings),
    };

    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(garden))
        .route("/healthz", get(healthz))
        .route("/trim_flower", post(http_trim_flower))
        .route("/change_water", post(http_change_water))
        .route("/add_flower", post(http_add_flower))
        .route("/admin", get(admin_page).post(admin_submit))
        .route("/admin/logout", post(admin_logout))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidType | ErrorCode::InvalidState | ErrorCode::Validation => {
            StatusCode::BAD_REQUEST
        }
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_failure(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

fn action_failure(err: ApiError) -> (StatusCode, Json<ActionResponse>) {
    (status_for(err.code), Json(ActionResponse::failed(err)))
}

fn rejected_body(rejection: JsonRejection) -> (StatusCode, Json<ActionResponse>) {
    warn!(status = %rejection.status(), "rejected action body");
    action_failure(ApiError::new(ErrorCode::Validation, rejection.body_text()))
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.api.storage.health_check().await.map_err(|error| {
        error!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

async fn garden(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GardenView>, (StatusCode, Json<ApiError>)> {
    garden_view(&state.api).await.map(Json).map_err(api_failure)
}

async fn http_trim_flower(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TrimFlowerRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, (StatusCode, Json<ActionResponse>)> {
    let Json(req) = payload.map_err(rejected_body)?;
    trim_flower(&state.api, FlowerId(req.flower_id), req.vase_id)
        .await
        .map_err(action_failure)?;
    Ok(Json(ActionResponse::ok()))
}

async fn http_change_water(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChangeWaterRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, (StatusCode, Json<ActionResponse>)> {
    let Json(req) = payload.map_err(rejected_body)?;
    change_water(&state.api, req.vase_id)
        .await
        .map_err(action_failure)?;
    Ok(Json(ActionResponse::ok()))
}

async fn http_add_flower(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<AddFlowerRequest>, JsonRejection>,
) -> Result<Json<ActionResponse>, (StatusCode, Json<ActionResponse>)> {
    authorize_admin(&state.api, session_token(&headers)).map_err(action_failure)?;
    let Json(req) = payload.map_err(rejected_body)?;
    let flower = add_flower(&state.api, &req.flower_type)
        .await
        .map_err(action_failure)?;
    Ok(Json(ActionResponse::created(flower.id)))
}

async fn admin_page(
    State(state): State<Arc<AppState>>,
    RequireAdmin(session): RequireAdmin,
) -> Result<Json<AdminOverview>, (StatusCode, Json<ApiError>)> {
    admin_overview(&state.api, &session, None)
        .await
        .map(Json)
        .map_err(api_failure)
}

/// Login and add-flower share one form: a `password` field opens a session,
/// a `flower_type` field adds stock once a session exists.
async fn admin_submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<AdminForm>,
) -> Result<Response, (StatusCode, Json<ApiError>)> {
    let mut issued_token = None;
    if let Some(password) = form.password.as_deref() {
        issued_token = Some(admin_login(&state.api, password).map_err(api_failure)?);
    }

    let token = issued_token.as_deref().or_else(|| session_token(&headers));
    let session = authorize_admin(&state.api, token).map_err(api_failure)?;

    let mut added_flower_id = None;
    if let Some(flower_type) = form.flower_type.as_deref() {
        match add_flower(&state.api, flower_type).await {
            Ok(flower) => added_flower_id = Some(flower.id),
            Err(err) if err.code == ErrorCode::InvalidType => {
                warn!(flower_type, "admin form named an unknown flower type");
            }
            Err(err) => return Err(api_failure(err)),
        }
    }

    let overview = admin_overview(&state.api, &session, added_flower_id)
        .await
        .map_err(api_failure)?;

    let mut response = Json(overview).into_response();
    if let Some(cookie) = issued_token
        .as_deref()
        .and_then(|token| session_cookie(token, state.api.sessions.ttl().num_seconds()))
    {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

async fn admin_logout() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, cleared_session_cookie())],
    )
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
