//! HTTP middleware for request/response logging.
//!
//! Tags every request with a [`RequestId`], echoes it in the response headers,
//! and logs method, path, status and duration at a level chosen from the
//! outcome. Excluded paths (health probes) pass through untouched.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    time::Instant,
};
use tracing::{error, info, span, warn, Instrument, Level};

use crate::request_id::{RequestId, REQUEST_ID_HEADER};

#[derive(Debug, Clone)]
pub struct RequestLoggingConfig {
    pub service_name: String,
    /// Path prefixes that are not logged
    pub exclude_paths: Vec<String>,
    /// Threshold in ms for slow request warnings
    pub slow_request_threshold_ms: u64,
}

impl Default for RequestLoggingConfig {
    fn default() -> Self {
        Self {
            service_name: "sanctions-screener".to_string(),
            exclude_paths: vec!["/health".to_string(), "/favicon.ico".to_string()],
            slow_request_threshold_ms: 2000,
        }
    }
}

impl RequestLoggingConfig {
    pub fn for_service(name: impl Into<String>) -> Self {
        Self {
            service_name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_slow_threshold(mut self, ms: u64) -> Self {
        self.slow_request_threshold_ms = ms;
        self
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.exclude_paths.iter().any(|p| path.starts_with(p.as_str()))
    }
}

#[derive(Clone)]
pub struct RequestLogging {
    config: RequestLoggingConfig,
}

impl RequestLogging {
    pub fn new(config: RequestLoggingConfig) -> Self {
        Self { config }
    }

    pub fn for_service(name: impl Into<String>) -> Self {
        Self::new(RequestLoggingConfig::for_service(name))
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestLogging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggingService {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct RequestLoggingService<S> {
    service: Rc<S>,
    config: RequestLoggingConfig,
}

impl<S, B> Service<ServiceRequest> for RequestLoggingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let config = self.config.clone();
        let service = self.service.clone();

        Box::pin(async move {
            let path = req.path().to_string();
            if config.is_excluded(&path) {
                return service.call(req).await;
            }

            let method = req.method().to_string();
            let request_id = RequestId::from_request(req.request());
            req.extensions_mut().insert(request_id.clone());

            let remote_ip = req
                .connection_info()
                .realip_remote_addr()
                .map(|s| s.to_string())
                .unwrap_or_default();

            let request_span = span!(
                Level::INFO,
                "http_request",
                request_id = %request_id,
                method = %method,
                path = %path,
                service = %config.service_name,
            );

            let start = Instant::now();
            let result = service.call(req).instrument(request_span).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(mut res) => {
                    let status = res.status().as_u16();

                    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
                        res.headers_mut()
                            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                    }

                    if status >= 500 {
                        error!(request_id = %request_id, status, duration_ms, remote_ip = %remote_ip,
                            "← {} {} {} {}ms", method, path, status, duration_ms);
                    } else if status >= 400 {
                        warn!(request_id = %request_id, status, duration_ms, remote_ip = %remote_ip,
                            "← {} {} {} {}ms", method, path, status, duration_ms);
                    } else if duration_ms > config.slow_request_threshold_ms {
                        warn!(request_id = %request_id, status, duration_ms, remote_ip = %remote_ip,
                            "← SLOW {} {} {} {}ms", method, path, status, duration_ms);
                    } else {
                        info!(request_id = %request_id, status, duration_ms, remote_ip = %remote_ip,
                            "← {} {} {} {}ms", method, path, status, duration_ms);
                    }

                    Ok(res)
                }
                Err(e) => {
                    error!(
                        request_id = %request_id,
                        duration_ms,
                        error = %e,
                        "← {} {} ERROR {}ms", method, path, duration_ms
                    );
                    Err(e)
                }
            }
        })
    }
}
