//! HTTP transport — maps HTTP requests onto the item handler.
//!
//! Requires the `http` feature. Uses axum for routing.
//!
//! ## Routes
//!
//! - `GET /items?limit=&skip=` — list items.
//! - `GET /items/:id` — fetch one item.
//! - `POST /items` — create an item from a JSON object body.
//! - `DELETE /items/:id` — delete an item.
//! - `GET /health` — store ping, `{ "ok": true, "collection": ... }`.
//!
//! Extractor rejections (undecodable path ids, oversized bodies) and
//! unsupported methods answer with the same JSON `{ "message": ... }` shape
//! as handler errors.
//!
//! Every handler call runs on the blocking thread pool while holding one
//! permit of the store pool, so a slow store never stalls the executor and
//! concurrent store use never exceeds the configured pool size.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use cart_items::{http, store::InMemoryCollection, ItemHandler};
//!
//! let handler = Arc::new(ItemHandler::new(InMemoryCollection::new("items")));
//!
//! // Get the router to compose with other axum routes
//! let app = http::router(handler.clone());
//!
//! // Or serve directly
//! http::serve(handler, "0.0.0.0:8000").await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, PathRejection};
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::sync::Semaphore;
use tower_http::trace::TraceLayer;

use crate::config::DEFAULT_POOL_SIZE;
use crate::handler::{HandlerError, ItemHandler, ListQuery, Reply};
use crate::id::InvalidId;
use crate::store::Collection;

struct AppState<C> {
    handler: Arc<ItemHandler<C>>,
    pool: Arc<Semaphore>,
}

impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            pool: self.pool.clone(),
        }
    }
}

/// Build an axum `Router` serving the item routes with the default pool size.
pub fn router<C: Collection + 'static>(handler: Arc<ItemHandler<C>>) -> Router {
    router_with_pool(handler, DEFAULT_POOL_SIZE)
}

/// Build an axum `Router` allowing at most `pool_size` concurrent store calls.
pub fn router_with_pool<C: Collection + 'static>(
    handler: Arc<ItemHandler<C>>,
    pool_size: usize,
) -> Router {
    let state = AppState {
        handler,
        pool: Arc::new(Semaphore::new(pool_size.max(1))),
    };

    Router::new()
        .route(
            "/health",
            get(health_handler::<C>).fallback(method_not_allowed_handler),
        )
        .route(
            "/items",
            get(list_handler::<C>)
                .post(create_handler::<C>)
                .fallback(method_not_allowed_handler),
        )
        .route(
            "/items/:id",
            get(get_handler::<C>)
                .delete(delete_handler::<C>)
                .fallback(method_not_allowed_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the handler over HTTP at the given address (e.g. `"0.0.0.0:8000"`).
pub async fn serve<C: Collection + 'static>(
    handler: Arc<ItemHandler<C>>,
    addr: &str,
) -> Result<(), std::io::Error> {
    serve_with_shutdown(handler, DEFAULT_POOL_SIZE, addr, std::future::pending()).await
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn serve_with_shutdown<C, F>(
    handler: Arc<ItemHandler<C>>,
    pool_size: usize,
    addr: &str,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    C: Collection + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let app = router_with_pool(handler, pool_size);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(addr = %local_addr, pool_size, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// `GET /items` — malformed or missing query parameters fall back to defaults,
/// one parameter at a time.
async fn list_handler<C: Collection + 'static>(
    State(state): State<AppState<C>>,
    RawQuery(raw): RawQuery,
) -> Response {
    let query = ListQuery::from_query_string(raw.as_deref().unwrap_or_default());
    run(&state, "list", move |handler| handler.list(&query)).await
}

/// `GET /items/:id`
async fn get_handler<C: Collection + 'static>(
    State(state): State<AppState<C>>,
    id: Result<Path<String>, PathRejection>,
) -> Response {
    match id {
        Ok(Path(id)) => run(&state, "get", move |handler| handler.get(&id)).await,
        Err(rejection) => path_rejection_response(rejection),
    }
}

/// `POST /items` — the body is parsed by the handler, whatever its content type.
async fn create_handler<C: Collection + 'static>(
    State(state): State<AppState<C>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match body {
        Ok(body) => run(&state, "create", move |handler| handler.create(&body)).await,
        Err(rejection) => body_rejection_response(rejection),
    }
}

/// `DELETE /items/:id`
async fn delete_handler<C: Collection + 'static>(
    State(state): State<AppState<C>>,
    id: Result<Path<String>, PathRejection>,
) -> Response {
    match id {
        Ok(Path(id)) => run(&state, "delete", move |handler| handler.delete(&id)).await,
        Err(rejection) => path_rejection_response(rejection),
    }
}

/// `GET /health` — 503 when the store cannot be reached.
async fn health_handler<C: Collection + 'static>(State(state): State<AppState<C>>) -> Response {
    let handler = state.handler.clone();
    let outcome = tokio::task::spawn_blocking(move || handler.health())
        .await
        .unwrap_or_else(|e| Err(HandlerError::Worker(e.to_string())));

    match outcome {
        Ok(reply) => reply_response(reply),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "ok": false }))).into_response()
        }
    }
}

async fn not_found_handler() -> Response {
    message_response(StatusCode::NOT_FOUND, "Not found")
}

async fn method_not_allowed_handler() -> Response {
    message_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// A path segment that does not decode to UTF-8 cannot be a valid id.
fn path_rejection_response(rejection: PathRejection) -> Response {
    let err = HandlerError::InvalidId(InvalidId {
        raw: rejection.body_text(),
    });
    tracing::debug!(error = %err, "item request rejected");
    reply_response(Reply::from_error(&err))
}

fn body_rejection_response(rejection: BytesRejection) -> Response {
    let status = rejection.status();
    tracing::debug!(%status, error = %rejection.body_text(), "request body rejected");
    let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "Request body too large"
    } else {
        "Request body could not be read"
    };
    message_response(status, message)
}

fn message_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

/// Run one handler operation on the blocking pool under a store permit.
async fn run<C, F>(state: &AppState<C>, operation: &'static str, op: F) -> Response
where
    C: Collection + 'static,
    F: FnOnce(&ItemHandler<C>) -> Result<Reply, HandlerError> + Send + 'static,
{
    let outcome = match state.pool.clone().acquire_owned().await {
        Ok(permit) => {
            let handler = state.handler.clone();
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                op(&handler)
            })
            .await
            .unwrap_or_else(|e| Err(HandlerError::Worker(e.to_string())))
        }
        Err(e) => Err(HandlerError::Worker(e.to_string())),
    };

    match outcome {
        Ok(reply) => reply_response(reply),
        Err(e) => {
            if e.is_internal() {
                tracing::error!(operation, error = %e, "item request failed");
            } else {
                tracing::debug!(operation, error = %e, "item request rejected");
            }
            reply_response(Reply::from_error(&e))
        }
    }
}

fn reply_response(reply: Reply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(reply.body)).into_response()
}
