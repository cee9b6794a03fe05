use crate::state::AppContext;
use actix_web::{web, HttpResponse, Result};
use chrono::Utc;
use serde_json::json;

/// GET /health
///
/// Always 200. `status` is `degraded` when a configured graph store does not answer.
pub async fn health_check(ctx: web::Data<AppContext>) -> Result<HttpResponse> {
    let graph_connected = match &ctx.graph {
        Some(graph) => match graph.ping().await {
            Ok(()) => Some(true),
            Err(e) => {
                tracing::warn!(error = %e, "⚠️ Graph store health check failed");
                Some(false)
            }
        },
        None => None,
    };

    let status = if graph_connected == Some(false) {
        "degraded"
    } else {
        "healthy"
    };

    let settings = &ctx.settings;
    let cache = ctx.cache.as_ref().map(|cache| {
        let stats = cache.stats();
        json!({
            "entries": cache.len(),
            "hits": stats.hits,
            "misses": stats.misses,
            "hit_rate": stats.hit_rate(),
        })
    });

    Ok(HttpResponse::Ok().json(json!({
        "status": status,
        "service": "sanctions-screener",
        "environment": settings.environment,
        "sources": {
            "opensanctions": {
                "configured": true,
                "api_key": settings.opensanctions.api_key.is_some(),
                "local_database": ctx.local_database,
                "circuit": ctx.breakers.opensanctions.state(),
            },
            "sanctions_io": {
                "configured": settings.sanctions_io.api_key.is_some(),
                "circuit": ctx.breakers.sanctions_io.state(),
            },
            "offshore_leaks": {
                "configured": ctx.graph.is_some(),
                "connected": graph_connected.unwrap_or(false),
            },
        },
        "cache": cache,
        "timestamp": Utc::now(),
    })))
}
