use crate::{
    config::Config,
    errors::{into_response, AppError},
    plugin::{
        registry::{CallRequest, CallResponse, ToolRegistry},
        types::{Capabilities, ErrorObj, ToolInfo},
        ToolContext,
    },
    security,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub registry: Arc<ToolRegistry>,
    pub rls: crate::security::RateLimiters,
}

pub async fn serve(cfg: Config, registry: ToolRegistry) -> anyhow::Result<()> {
    let shared = AppState {
        cfg: Arc::new(cfg),
        registry: Arc::new(registry),
        rls: crate::security::RateLimiters::new(20, 40, 10, 20),
    };

    let app = build_router(shared.clone());

    let addr: std::net::SocketAddr =
        format!("{}:{}", shared.cfg.server.bind_addr, shared.cfg.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(shared: AppState) -> Router {
    let base = shared.cfg.server.base_path.clone();
    use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
    let limit_bytes = shared.cfg.limits.max_request_kb * 1024;
    Router::new()
        .route("/healthz", get(health))
        .route(&format!("{base}/capabilities"), get(capabilities))
        .route(
            &format!("{base}/call"),
            post(call).layer(RequestBodyLimitLayer::new(limit_bytes)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

async fn health(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    match authorize(&state, &headers) {
        Ok(()) => (StatusCode::OK, Json(json!({"status":"ok"}))).into_response(),
        Err(e) => into_response(e).into_response(),
    }
}

async fn capabilities(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(e) = authorize(&state, &headers) {
        return into_response(e).into_response();
    }
    let tools: Vec<ToolInfo> = state
        .registry
        .list_names()
        .into_iter()
        .filter_map(|n| state.registry.get(&n))
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            input_schema: t.capabilities()["input"].clone(),
            output_schema: t.capabilities()["output"].clone(),
        })
        .collect();
    let caps = Capabilities { plugin_version: "1.0", tools };
    (StatusCode::OK, Json(caps)).into_response()
}

async fn call(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CallRequest>,
) -> Response {
    use std::time::Instant;
    let started = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string();
    let origin = headers
        .get("Origin")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if let Err(e) = authorize(&state, &headers) {
        audit(&request_id, &origin, &req.tool, "deny", e.code(), started.elapsed().as_millis() as u64);
        return into_response(e).into_response();
    }
    if let Err(e) = security::content_length_ok(&headers, state.cfg.limits.max_request_kb) {
        audit(&request_id, &origin, &req.tool, "deny", e.code(), started.elapsed().as_millis() as u64);
        return into_response(e).into_response();
    }
    let token = security::extract_bearer(&headers);
    if let Err(e) = state.rls.check(token.as_deref()) {
        audit(&request_id, &origin, &req.tool, "deny", e.code(), started.elapsed().as_millis() as u64);
        return into_response(e).into_response();
    }

    let Some(tool) = state.registry.get(&req.tool) else {
        audit(&request_id, &origin, &req.tool, "deny", AppError::NotFound.code(), started.elapsed().as_millis() as u64);
        return into_response(AppError::NotFound).into_response();
    };

    // a fresh context per invocation; the worktree root is never global state
    let ctx = ToolContext::new(state.cfg.worktree.root_dir.clone());

    match tool.call(&ctx, req.params).await {
        Ok(result) => {
            let payload = CallResponse { id: req.id, result: Some(result), error: None };
            audit(&request_id, &origin, &req.tool, "allow", "OK", started.elapsed().as_millis() as u64);
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(e) => {
            let body = CallResponse {
                id: req.id,
                result: None,
                error: Some(ErrorObj { code: e.code().to_string(), message: e.to_string() }),
            };
            audit(&request_id, &origin, &req.tool, "error", e.code(), started.elapsed().as_millis() as u64);
            (e.status(), Json(body)).into_response()
        }
    }
}

fn audit(request_id: &str, origin: &str, tool: &str, decision: &str, code: &str, duration_ms: u64) {
    tracing::info!(
        request_id = request_id,
        origin = origin,
        tool = tool,
        decision = decision,
        code = code,
        duration_ms = duration_ms,
        "audit"
    );
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    security::require_bearer(headers, &state.cfg.auth.bearer_token)?;
    security::check_origin(headers, &state.cfg.auth.allowed_origins)?;
    Ok(())
}
