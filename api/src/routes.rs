use crate::errors::ApiError;
use crate::handlers;
use actix_web::web;

const JSON_LIMIT: usize = 64 * 1024;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT)
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .route("/search", web::post().to(handlers::search))
            .route("/search", web::get().to(handlers::search_get))
            .route("/connections", web::post().to(handlers::get_connections)),
    )
    .route("/health", web::get().to(handlers::health_check));
}
