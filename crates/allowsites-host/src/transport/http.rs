use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use allowsites_core::error::{AllowSitesError, ErrorCode, Result};

use crate::app_state::AppState;
use crate::context::RequestContext;
use crate::content::node::Node;

#[derive(Debug, Default, Deserialize)]
pub struct NodeQuery {
    /// Tree position of the node to build.
    pub path: Option<String>,
}

/// `GET /v1/node-types`: node types usable on the requested site.
pub async fn list_node_types(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let req = request_context(&headers);
    let result = async {
        let ctx = state.resolver().evaluation_context(&req).await?;
        let types = state.content().node_types(&ctx)?;
        let names: Vec<&str> = types.names().collect();
        Ok::<_, AllowSitesError>(json!({ "site": ctx.current_site(), "node_types": names }))
    }
    .await;
    respond(&state, "node_types", result)
}

/// `GET /v1/node-types/:name`: build one node of that type, 404 when the
/// type is hidden on the requested site.
pub async fn get_node(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(q): Query<NodeQuery>,
    headers: HeaderMap,
) -> Response {
    let req = request_context(&headers);
    let path = q.path.unwrap_or_else(|| default_path(&name));
    let result = async {
        let ctx = state.resolver().evaluation_context(&req).await?;
        let node: Node = state
            .content()
            .create_node(&name, &path, &ctx)?
            .ok_or_else(|| AllowSitesError::NotFound(format!("node type {name}")))?;
        Ok::<_, AllowSitesError>(json!({
            "site": ctx.current_site(),
            "name": node.name(),
            "node_type": node.node_type_name(),
            "path": node.path(),
        }))
    }
    .await;
    respond(&state, "node", result)
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics().render()
}

fn request_context(headers: &HeaderMap) -> RequestContext {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    RequestContext::Http { host }
}

fn default_path(node_type: &str) -> String {
    let slug: String = node_type
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("/preview/{slug}")
}

fn respond(state: &AppState, route: &str, result: Result<Value>) -> Response {
    let (status, body) = match result {
        Ok(v) => (StatusCode::OK, v),
        Err(e) => {
            let status = status_for(e.code());
            if status.is_server_error() {
                tracing::error!(route, error = %e, "request failed");
            } else {
                tracing::debug!(route, error = %e, "request rejected");
            }
            (
                status,
                json!({ "error": { "code": e.code().as_str(), "message": e.to_string() } }),
            )
        }
    };
    state.metrics().record_request(route, status.as_u16());
    (status, Json(body)).into_response()
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
        ErrorCode::UnknownNodeType | ErrorCode::UnknownSite | ErrorCode::NotFound => {
            StatusCode::NOT_FOUND
        }
        ErrorCode::InvalidConfig | ErrorCode::UnsupportedVersion | ErrorCode::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
