use crate::errors::{ApiError, ApiResult};
use crate::state::AppContext;
use actix_web::{web, HttpRequest, HttpResponse};
use screener_models::{SearchRequest, SearchType, SourceKind};
use screener_observability::request_id;
use screener_utils::fingerprint;
use serde::Deserialize;

/// Query-string form of a search; `sources` is comma separated
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(alias = "q")]
    pub query: String,
    #[serde(default)]
    pub search_type: SearchType,
    pub sources: Option<String>,
    pub limit: Option<u32>,
    pub fuzzy_threshold: Option<u8>,
}

impl SearchParams {
    pub fn into_request(self) -> ApiResult<SearchRequest> {
        let mut request = SearchRequest::new(self.query);
        request.search_type = self.search_type;

        if let Some(raw) = self.sources {
            request.sources = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.parse::<SourceKind>().map_err(ApiError::BadRequest))
                .collect::<ApiResult<Vec<_>>>()?;
        }
        if let Some(limit) = self.limit {
            request.limit = limit;
        }
        if let Some(threshold) = self.fuzzy_threshold {
            request.fuzzy_threshold = threshold;
        }

        Ok(request)
    }
}

/// POST /api/search
pub async fn search(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    body: web::Json<SearchRequest>,
) -> ApiResult<HttpResponse> {
    run_search(&req, &ctx, body.into_inner()).await
}

/// GET /api/search
pub async fn search_get(
    req: HttpRequest,
    ctx: web::Data<AppContext>,
    params: web::Query<SearchParams>,
) -> ApiResult<HttpResponse> {
    let request = params.into_inner().into_request()?;
    run_search(&req, &ctx, request).await
}

async fn run_search(
    req: &HttpRequest,
    ctx: &AppContext,
    request: SearchRequest,
) -> ApiResult<HttpResponse> {
    ctx.check_rate_limit(req)?;

    let request = request.sanitized()?;
    let request_id = request_id(req);
    let key = fingerprint(&request.cache_key());

    if let Some(cached) = ctx.cache.as_ref().and_then(|cache| cache.get(&key)) {
        tracing::info!(%request_id, query = %request.query, "📦 Search served from cache");
        return Ok(HttpResponse::Ok().json(cached));
    }

    let response = ctx.aggregator().aggregate(request).await?;

    if let Some(cache) = &ctx.cache {
        cache.insert(key, response.clone());
    }

    tracing::info!(
        %request_id,
        query = %response.query,
        total_results = response.total_results,
        sources_failed = response.sources_failed.len(),
        "Search completed"
    );
    Ok(HttpResponse::Ok().json(response))
}
