//! Request-scoped tracing helpers: request ids, HTTP span construction and
//! operation timing.

use http::Request;
use metrics::{counter, histogram};
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::time::Instant;
use tower_http::classify::{SharedClassifier, StatusInRangeAsFailures};
use tower_http::trace::{
    DefaultOnBodyChunk, DefaultOnEos, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse,
    MakeSpan, TraceLayer,
};
use tracing::{error, info, warn, Level};
use uuid::Uuid;

/// Request ID tracking information
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl Default for RequestId {
    fn default() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }
}

impl RequestId {
    pub fn new(value: impl Into<String>) -> Self {
        RequestId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

tokio::task_local! {
    static CURRENT_REQUEST_ID: RefCell<Option<RequestId>>;
}

/// Runs `future` with `request_id` visible to [`current_request_id`].
pub async fn scope_request_id<Fut, R>(request_id: RequestId, future: Fut) -> R
where
    Fut: Future<Output = R>,
{
    CURRENT_REQUEST_ID
        .scope(RefCell::new(Some(request_id)), future)
        .await
}

pub fn current_request_id() -> Option<RequestId> {
    CURRENT_REQUEST_ID
        .try_with(|cell| cell.borrow().clone())
        .ok()
        .flatten()
}

#[derive(Clone, Default)]
pub struct RequestSpanMaker;

impl<B> MakeSpan<B> for RequestSpanMaker {
    fn make_span(&mut self, request: &Request<B>) -> tracing::Span {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .cloned()
            .or_else(|| {
                request
                    .headers()
                    .get(crate::middleware_helpers::REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(RequestId::new)
            })
            .unwrap_or_default();

        tracing::info_span!(
            "http.request",
            request_id = %request_id.as_str(),
            method = %request.method(),
            uri = %request.uri(),
        )
    }
}

pub type HttpTraceLayer = TraceLayer<
    SharedClassifier<StatusInRangeAsFailures>,
    RequestSpanMaker,
    DefaultOnRequest,
    DefaultOnResponse,
    DefaultOnBodyChunk,
    DefaultOnEos,
    DefaultOnFailure,
>;

/// Configure tracing for the application with tower-http
pub fn configure_http_tracing() -> HttpTraceLayer {
    let classifier = SharedClassifier::new(StatusInRangeAsFailures::new(500..=599));
    TraceLayer::new(classifier)
        .make_span_with(RequestSpanMaker)
        .on_request(DefaultOnRequest::default())
        .on_response(DefaultOnResponse::default())
        .on_body_chunk(DefaultOnBodyChunk::default())
        .on_eos(DefaultOnEos::default())
        .on_failure(DefaultOnFailure::default())
}

/// Errors returned from a timed operation.
pub trait OperationFailure: fmt::Display {
    /// True when the failure is the service's fault rather than the caller's.
    fn is_server_error(&self) -> bool;
}

/// Log level for a failed operation: `ERROR` for server faults, `WARN` otherwise.
pub fn failure_level<E: OperationFailure + ?Sized>(err: &E) -> Level {
    if err.is_server_error() {
        Level::ERROR
    } else {
        Level::WARN
    }
}

/// Runs a task, logs its duration and outcome and records it in the metrics facade
pub async fn with_metrics<F, Fut, T, E>(operation_name: &'static str, task: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: OperationFailure,
{
    let start = Instant::now();
    let result = task().await;
    let elapsed = start.elapsed();

    histogram!(
        "inventory_forecast.operation.duration_seconds",
        elapsed.as_secs_f64(),
        "operation" => operation_name
    );

    match &result {
        Ok(_) => {
            counter!("inventory_forecast.operation.success", 1, "operation" => operation_name);
            info!(
                operation = operation_name,
                duration_ms = %elapsed.as_millis(),
                "Operation completed successfully"
            );
        }
        Err(e) => {
            let level = failure_level(e);
            let kind = if level == Level::ERROR { "server" } else { "client" };
            counter!(
                "inventory_forecast.operation.failure",
                1,
                "operation" => operation_name,
                "kind" => kind
            );
            if level == Level::ERROR {
                error!(
                    operation = operation_name,
                    duration_ms = %elapsed.as_millis(),
                    error = %e,
                    "Operation failed"
                );
            } else {
                warn!(
                    operation = operation_name,
                    duration_ms = %elapsed.as_millis(),
                    error = %e,
                    "Operation rejected"
                );
            }
        }
    }

    result
}
