use actix_web::{
    error::ResponseError,
    http::{header, StatusCode},
    HttpResponse,
};
use chrono::Utc;
use screener_graph::GraphError;
use screener_search::SearchError;
use screener_utils::RateLimitError;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    RateLimited(#[from] RateLimitError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation(errors) => ApiError::Validation(errors),
        }
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::RateLimited(_) => "rate_limited",
            ApiError::Graph(GraphError::Validation(_)) => "validation_error",
            ApiError::Graph(GraphError::Query(_)) => "graph_query_failed",
            ApiError::Graph(_) => "service_unavailable",
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Graph(GraphError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Graph(GraphError::Query(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Graph(GraphError::Connection(_) | GraphError::Unavailable(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "❌ Request failed");
        }

        let details = match self {
            ApiError::Validation(errors) => serde_json::to_value(errors).ok(),
            _ => None,
        };

        let mut body = serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
            "timestamp": Utc::now(),
        });
        if let Some(details) = details {
            body["details"] = details;
        }

        let mut response = HttpResponse::build(status);
        if let ApiError::RateLimited(limit) = self {
            let secs = limit.retry_after().as_secs().max(1);
            response.insert_header((header::RETRY_AFTER, secs.to_string()));
        }
        response.json(body)
    }
}
