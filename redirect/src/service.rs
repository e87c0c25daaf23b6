use crate::config::{Config, ServiceInfo};
use crate::destination::Destination;
use crate::errors::{RedirectError, Result};
use crate::metrics_defs::{REDIRECT_REQUEST_DURATION, REDIRECT_REQUESTS};
use crate::params::{check_declared, parse_query};
use crate::session::SessionClient;
use attribution::Normalizer;
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, LOCATION};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode, Uri};
use serde::Serialize;
use shared::http::{ErrorDetail, empty_body, make_boxed_error_response, make_json_response};
use shared::{counter, histogram};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

const REDIRECT_PATH: &str = "/w/redirect";
const HEALTH_PATH: &str = "/health";

#[derive(Serialize)]
struct RootResponse<'a> {
    service: &'a str,
    version: &'a str,
    status: &'a str,
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'a str,
    service: &'a str,
    version: &'a str,
}

#[derive(Clone, Copy)]
enum Route {
    Root,
    Health,
    Redirect,
    NotFound,
}

impl Route {
    fn as_str(&self) -> &'static str {
        match self {
            Route::Root => "root",
            Route::Health => "health",
            Route::Redirect => "redirect",
            Route::NotFound => "not_found",
        }
    }
}

struct Inner {
    normalizer: Normalizer,
    sessions: SessionClient,
    destination: Destination,
    service: ServiceInfo,
    health_path: String,
    redirect_path: String,
}

/// Public click endpoint. Turns an ad click into a session registration and
/// a redirect to the messaging destination.
#[derive(Clone)]
pub struct RedirectService {
    inner: Arc<Inner>,
}

impl RedirectService {
    pub fn new(config: &Config, normalizer: Normalizer) -> Result<Self> {
        let prefix = config.route_prefix();
        let inner = Inner {
            normalizer,
            sessions: SessionClient::new(&config.session_service)?,
            destination: Destination::new(&config.destination),
            service: config.service.clone(),
            health_path: format!("{prefix}{HEALTH_PATH}"),
            redirect_path: format!("{prefix}{REDIRECT_PATH}"),
        };

        Ok(RedirectService {
            inner: Arc::new(inner),
        })
    }

    fn route(&self, path: &str) -> Route {
        if path == "/" {
            Route::Root
        } else if path == self.inner.health_path {
            Route::Health
        } else if path == self.inner.redirect_path {
            Route::Redirect
        } else {
            Route::NotFound
        }
    }

    pub async fn handle<B>(&self, req: Request<B>) -> Response<BoxBody<Bytes, RedirectError>> {
        let (parts, _) = req.into_parts();
        let route = self.route(parts.uri.path());
        let start = Instant::now();

        let response = if parts.method != Method::GET {
            self.error_response(&parts.method, &parts.uri, RedirectError::MethodNotAllowed)
        } else {
            match route {
                Route::Root => make_json_response(
                    StatusCode::OK,
                    &RootResponse {
                        service: &self.inner.service.name,
                        version: &self.inner.service.version,
                        status: "running",
                    },
                ),
                Route::Health => make_json_response(
                    StatusCode::OK,
                    &HealthResponse {
                        status: "ok",
                        service: &self.inner.service.name,
                        version: &self.inner.service.version,
                    },
                ),
                Route::Redirect => match self.redirect(parts.uri.query()).await {
                    Ok(location) => found(location),
                    Err(err) => self.error_response(&parts.method, &parts.uri, err),
                },
                Route::NotFound => make_boxed_error_response(StatusCode::NOT_FOUND),
            }
        };

        let status = response.status().as_u16().to_string();
        if let Route::Redirect = route {
            histogram!(REDIRECT_REQUEST_DURATION, "status" => status.clone())
                .record(start.elapsed().as_secs_f64());
        }
        counter!(REDIRECT_REQUESTS, "route" => route.as_str(), "status" => status).increment(1);

        response
    }

    /// Returns the redirect target for one click.
    async fn redirect(&self, query: Option<&str>) -> Result<HeaderValue> {
        let params = parse_query(query);
        check_declared(&params)?;

        tracing::info!(
            campaign_id = params.get("campaign_id").map(String::as_str),
            adset_id = params.get("adset_id").map(String::as_str),
            ad_id = params.get("ad_id").map(String::as_str),
            "Processing redirect"
        );

        let payload = self.inner.normalizer.normalize(&params).await?;
        let session_uid = self.inner.sessions.register_click_event(&payload).await;

        let location = HeaderValue::from_str(self.inner.destination.url())
            .map_err(|e| RedirectError::InternalError(e.to_string()))?;

        tracing::info!(session_uid = %session_uid, "Redirect succeeded");
        Ok(location)
    }

    fn error_response(
        &self,
        method: &Method,
        uri: &Uri,
        err: RedirectError,
    ) -> Response<BoxBody<Bytes, RedirectError>> {
        let status = err.status();
        if status.is_server_error() {
            tracing::error!(url = %uri, method = %method, error = %err, "Unhandled error");
        }

        make_json_response(
            status,
            &ErrorDetail {
                detail: &err.public_detail(),
            },
        )
    }
}

fn found(location: HeaderValue) -> Response<BoxBody<Bytes, RedirectError>> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = StatusCode::FOUND;
    response.headers_mut().insert(LOCATION, location);
    response
}

impl Service<Request<Incoming>> for RedirectService {
    type Response = Response<BoxBody<Bytes, Self::Error>>;
    type Error = RedirectError;
    type Future = Pin<
        Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send + 'static>,
    >;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}
