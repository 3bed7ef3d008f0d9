//! HTTP server over a shared [`Workspace`].
//!
//! # API Endpoints
//!
//! | Method | Path                               | Description                        |
//! |--------|------------------------------------|------------------------------------|
//! | GET    | `/health`                          | Health check                       |
//! | POST   | `/api/upload/{entity}`             | Upload a CSV, replace a collection |
//! | GET    | `/api/data/{entity}`               | Canonical records                  |
//! | PATCH  | `/api/data/{entity}/{index}`       | Patch one record                   |
//! | GET    | `/api/validation`                  | Summary plus missing-id issues     |
//! | GET    | `/api/rules`                       | List rules                         |
//! | POST   | `/api/rules`                       | Add a rule                         |
//! | DELETE | `/api/rules/{id}`                  | Remove a rule                      |
//! | POST   | `/api/rules/reorder`               | Reorder rules                      |
//! | GET    | `/api/priorities`                  | Read priorities                    |
//! | PUT    | `/api/priorities`                  | Replace priorities                 |
//! | POST   | `/api/priorities/preset/{profile}` | Apply a preset profile             |
//! | POST   | `/api/bundle`                      | Import a rules bundle              |
//! | GET    | `/api/export`                      | Export everything as JSON          |
//! | POST   | `/api/nl/rules`                    | Sentence → rules                   |
//! | POST   | `/api/nl/search`                   | Query → matching tasks             |
//! | GET    | `/api/logs`                        | SSE stream of pipeline logs        |
//!
//! Every mutation holds the write lock while it revalidates, so readers never
//! see records and summary out of step.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, sse::KeepAlive, Json, Sse},
    routing::{delete, get, patch, post},
    Router,
};
use futures::stream::Stream;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::{Any, CorsLayer};

use super::logs::{log_error, log_info, log_info_indent, log_success, log_warning, LOG_BROADCASTER};
use super::types::{
    IngestResponse, NlRulesRequest, NlRulesResponse, NlSearchRequest, NlSearchResponse, PatchResponse,
    ReorderRequest, ValidationResponse,
};
use crate::config::ServerConfig;
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::models::{Client, Criterion, EntityKind, PrioritiesConfig, Profile, Rule, RulesBundle, Task, Worker};
use crate::nl::{parse_rules, parse_task_filter};
use crate::normalize::pipeline::{ingest_bytes, Ingested};
use crate::normalize::{CanonicalRecord, ColumnMapResult};
use crate::validation::{import_bundle, ValidationSummary};
use crate::workspace::{ExportBundle, Workspace};

pub type AppState = Arc<RwLock<Workspace>>;

/// Build the router around a workspace.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload/{entity}", post(upload))
        .route("/api/data/{entity}", get(get_records))
        .route("/api/data/{entity}/{index}", patch(patch_record))
        .route("/api/validation", get(get_validation))
        .route("/api/rules", get(list_rules).post(add_rule))
        .route("/api/rules/reorder", post(reorder_rules))
        .route("/api/rules/{id}", delete(remove_rule))
        .route("/api/priorities", get(get_priorities).put(put_priorities))
        .route("/api/priorities/preset/{profile}", post(apply_preset))
        .route("/api/bundle", post(import_rules_bundle))
        .route("/api/export", get(export))
        .route("/api/nl/rules", post(nl_rules))
        .route("/api/nl/search", post(nl_search))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Serve until the process stops.
pub async fn start_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state: AppState = Arc::new(RwLock::new(Workspace::new()));
    let app = router(state, config.max_upload_bytes);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log_success(format!("Alchemist server listening on http://{}", addr));
    log_routes();

    axum::serve(listener, app).await?;
    Ok(())
}

fn log_routes() {
    for line in [
        "POST /api/upload/{entity}  - Upload clients, workers or tasks CSV",
        "GET  /api/validation       - Current validation summary",
        "GET  /api/export           - Cleaned bundle",
        "GET  /api/logs             - SSE log stream",
    ] {
        log_info_indent(line, 1);
    }
}

fn parse_entity(entity: &str) -> ServerResult<EntityKind> {
    entity
        .parse::<EntityKind>()
        .map_err(|_| PipelineError::UnknownEntity(entity.to_string()).into())
}

fn parse_body<T: DeserializeOwned>(body: Value) -> ServerResult<T> {
    serde_json::from_value(body).map_err(|e| ServerError::BadRequest(e.to_string()))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "alchemist",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        // Lagged receivers skip what they missed
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("keep-alive"))
}

async fn upload(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    mut multipart: Multipart,
) -> ServerResult<Json<IngestResponse>> {
    let kind = parse_entity(&entity)?;

    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file_data = Some(bytes.to_vec());
        }
    }
    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;

    log_info(format!(
        "Upload {} ({}, {} bytes)",
        kind,
        file_name.as_deref().unwrap_or("unnamed"),
        bytes.len()
    ));

    // Parsing happens before the write lock is taken
    let response = match kind {
        EntityKind::Clients => {
            let ingested = ingest_bytes::<Client>(&bytes).map_err(log_failure)?;
            store(&state, ingested, Workspace::load_clients).await
        }
        EntityKind::Workers => {
            let ingested = ingest_bytes::<Worker>(&bytes).map_err(log_failure)?;
            store(&state, ingested, Workspace::load_workers).await
        }
        EntityKind::Tasks => {
            let ingested = ingest_bytes::<Task>(&bytes).map_err(log_failure)?;
            store(&state, ingested, Workspace::load_tasks).await
        }
    };

    Ok(Json(response))
}

async fn store<T: CanonicalRecord>(
    state: &AppState,
    ingested: Ingested<T>,
    load: impl FnOnce(&mut Workspace, ColumnMapResult<T>),
) -> IngestResponse {
    let response = IngestResponse::new(T::KIND, &ingested);

    let mut ws = state.write().await;
    load(&mut *ws, ingested.result);
    log_summary(ws.summary());

    response.with_validation(ws.summary().clone())
}

fn log_failure(e: PipelineError) -> PipelineError {
    log_error(format!("Ingestion failed: {}", e));
    e
}

fn log_summary(summary: &ValidationSummary) {
    let counts = summary.counts();
    if counts.error == 0 {
        log_success("Validation passed");
    } else {
        log_warning(format!("Validation: {} error(s)", counts.error));
    }
}

async fn get_records(State(state): State<AppState>, Path(entity): Path<String>) -> ServerResult<Json<Value>> {
    let kind = parse_entity(&entity)?;
    let ws = state.read().await;
    Ok(Json(ws.records_json(kind)))
}

async fn patch_record(
    State(state): State<AppState>,
    Path((entity, index)): Path<(String, usize)>,
    Json(body): Json<Value>,
) -> ServerResult<Json<PatchResponse>> {
    let kind = parse_entity(&entity)?;
    let patch: Map<String, Value> = parse_body(body)?;

    let mut ws = state.write().await;
    if !ws.upsert(kind, index, &patch) {
        return Err(ServerError::NotFound(format!("{} row {}", kind, index)));
    }
    log_info(format!("Patched {} row {}", kind, index));

    let record = ws.records_json(kind).get(index).cloned().unwrap_or(Value::Null);
    Ok(Json(PatchResponse {
        record,
        validation: ValidationResponse::from_workspace(&ws),
    }))
}

async fn get_validation(State(state): State<AppState>) -> Json<ValidationResponse> {
    Json(ValidationResponse::from_workspace(&*state.read().await))
}

async fn list_rules(State(state): State<AppState>) -> Json<Vec<Rule>> {
    Json(state.read().await.rules().to_vec())
}

async fn add_rule(State(state): State<AppState>, Json(body): Json<Value>) -> ServerResult<(StatusCode, Json<Rule>)> {
    let rule: Rule = parse_body(body)?;
    state.write().await.add_rule(rule.clone())?;
    log_success(format!("Rule {} ({}) added", rule.id, rule.kind.type_name()));
    Ok((StatusCode::CREATED, Json(rule)))
}

async fn remove_rule(State(state): State<AppState>, Path(id): Path<String>) -> ServerResult<Json<Rule>> {
    let removed = state.write().await.remove_rule(&id)?;
    log_info(format!("Rule {} removed", id));
    Ok(Json(removed))
}

async fn reorder_rules(State(state): State<AppState>, Json(body): Json<Value>) -> ServerResult<Json<Vec<Rule>>> {
    let request: ReorderRequest = parse_body(body)?;
    let mut ws = state.write().await;
    ws.reorder_rules(&request.ordered_ids);
    Ok(Json(ws.rules().to_vec()))
}

async fn get_priorities(State(state): State<AppState>) -> Json<PrioritiesConfig> {
    Json(state.read().await.priorities().clone())
}

async fn put_priorities(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ServerResult<Json<PrioritiesConfig>> {
    let mut priorities: PrioritiesConfig = parse_body(body)?;
    // Re-apply each weight so out-of-range values are clamped
    let weights = priorities.weights;
    for criterion in Criterion::ALL {
        priorities.set_weight(criterion, weights.get(criterion));
    }
    state.write().await.set_priorities(priorities.clone());
    Ok(Json(priorities))
}

async fn apply_preset(
    State(state): State<AppState>,
    Path(profile): Path<String>,
) -> ServerResult<Json<PrioritiesConfig>> {
    let profile: Profile = profile.parse().map_err(ServerError::BadRequest)?;
    let mut ws = state.write().await;
    let priorities = ws.apply_preset(profile).clone();
    log_info(format!("Priorities preset: {:?}", profile));
    Ok(Json(priorities))
}

async fn import_rules_bundle(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ServerResult<Json<RulesBundle>> {
    let bundle = import_bundle(&body).inspect_err(|e| log_error(format!("Bundle rejected: {}", e)))?;
    let mut ws = state.write().await;
    ws.replace_rules_bundle(bundle);
    log_success(format!("Imported {} rule(s)", ws.rules().len()));
    Ok(Json(ws.rules_bundle()))
}

async fn export(State(state): State<AppState>) -> Json<ExportBundle> {
    Json(state.read().await.export_bundle())
}

async fn nl_rules(Json(body): Json<Value>) -> ServerResult<Json<NlRulesResponse>> {
    let request: NlRulesRequest = parse_body(body)?;
    Ok(Json(NlRulesResponse {
        rules: parse_rules(&request.input),
    }))
}

async fn nl_search(State(state): State<AppState>, Json(body): Json<Value>) -> ServerResult<Json<NlSearchResponse>> {
    let request: NlSearchRequest = parse_body(body)?;
    let filter = parse_task_filter(&request.query);
    let ws = state.read().await;
    let results = filter.apply(ws.tasks()).into_iter().cloned().collect();
    Ok(Json(NlSearchResponse { filter, results }))
}
