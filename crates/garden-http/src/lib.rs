//! The input front end: a single `POST /` endpoint that hands its body to
//! a [`Gardener`] as an `Input`. 200 on a successfully accepted input, 500
//! if the gardener's pipeline fails to process it.

use std::sync::Arc;

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use garden_core::Input;
use garden_gardener::Gardener;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

/// The form fields a `POST /` submits: `entity, name, version, value`.
#[derive(Debug, Deserialize)]
pub struct InputPayload {
    pub entity: String,
    pub name: String,
    pub version: String,
    pub value: String,
}

/// Builds the router. `with_state` carries the gardener the handler hands
/// every posted input to.
pub fn router(gardener: Arc<Gardener>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", post(input_handler))
        .layer(cors)
        .with_state(gardener)
}

/// Binds `addr` and serves the input endpoint until the process stops.
pub async fn serve(gardener: Arc<Gardener>, addr: impl Into<std::net::SocketAddr>) -> std::io::Result<()> {
    let addr = addr.into();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("garden HTTP input endpoint listening on http://{addr}");
    axum::serve(listener, router(gardener)).await
}

async fn input_handler(State(gardener): State<Arc<Gardener>>, Form(payload): Form<InputPayload>) -> StatusCode {
    let input = Input::new(payload.entity, payload.name, payload.version, payload.value);
    match gardener.input_received(input).await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            log::error!("failed to process a posted input: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
