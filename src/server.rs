//! HTTP front door
//!
//! - `GET /{id}`  - RSS feed of a registered show
//! - `POST /{id}` - register a show from the remote catalog
//!
//! Every failure is answered with `400 Bad Request` and the error text as body.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::warn;

use crate::error::ServiceError;
use crate::service::Service;

/// Content type of the served feeds
pub const RSS_CONTENT_TYPE: &str = "application/rss+xml";

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

/// Build the router serving feeds and show registration
pub fn create_router(service: Arc<Service>) -> Router {
    Router::new()
        .route("/:id", get(get_feed).post(register_show))
        .with_state(service)
}

async fn get_feed(
    State(service): State<Arc<Service>>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let feed = service.feed(&id).await.inspect_err(|e| {
        warn!(show_id = %id, error = %e, "Failed to build feed");
    })?;

    Ok(([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], feed).into_response())
}

async fn register_show(
    State(service): State<Arc<Service>>,
    Path(id): Path<String>,
) -> Result<&'static str, ServiceError> {
    service.register_show(&id).await.inspect_err(|e| {
        warn!(show_id = %id, error = %e, "Failed to register show");
    })?;

    Ok("ok")
}
