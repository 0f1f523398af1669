//! HTTP listener glue.
//!
//! The device POSTs frames to whatever path it was configured with, so the
//! router answers POST on every path. All protocol decisions live in the
//! pipeline; this module only moves bytes between HTTP and
//! [`RelayPipeline::handle`].

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use bytes::Bytes;

use crate::pipeline::{ExchangeReply, RelayPipeline, ReplyBody};

/// Build the relay's HTTP router.
pub fn router(pipeline: Arc<RelayPipeline>) -> Router {
    Router::new()
        .route("/", post(serve_exchange))
        .route("/*path", post(serve_exchange))
        .with_state(pipeline)
}

async fn serve_exchange(State(pipeline): State<Arc<RelayPipeline>>, body: Bytes) -> Response {
    into_response(pipeline.handle(&body).await)
}

fn into_response(reply: ExchangeReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_REQUEST);
    match reply.body {
        ReplyBody::Ciphertext(bytes) => {
            (status, [(header::CONTENT_TYPE, "application/octet-stream")], bytes).into_response()
        },
        ReplyBody::Diagnostic(text) => {
            (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response()
        },
    }
}
