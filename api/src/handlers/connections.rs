use crate::errors::{ApiError, ApiResult};
use crate::state::AppContext;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use screener_models::{ConnectionRequest, ConnectionResponse};
use validator::Validate;

/// POST /api/connections
pub async fn get_connections(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    body: web::Json<ConnectionRequest>,
) -> ApiResult<HttpResponse> {
    ctx.check_rate_limit(&req)?;

    let request = body.into_inner();
    request.validate()?;

    tracing::info!(
        node_id = request.node_id,
        depth = request.depth,
        max_nodes = request.max_nodes,
        "🔷 Connection graph requested"
    );

    let entity = ctx
        .lookup()?
        .get_by_id(request.node_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Node {} not found", request.node_id)))?;

    let graph = ctx
        .traversal()?
        .get_connections(request.node_id, request.depth, request.max_nodes)
        .await?;

    tracing::info!(
        node_id = request.node_id,
        node_count = graph.node_count,
        edge_count = graph.edge_count,
        "✅ Connection graph built"
    );

    Ok(HttpResponse::Ok().json(ConnectionResponse {
        node_id: request.node_id,
        node_name: entity.name,
        graph,
        timestamp: Utc::now(),
    }))
}
