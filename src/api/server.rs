use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{MatchedPath, Request};
use axum::middleware::{self, Next, from_fn};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use redis::aio::ConnectionManager;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::api::handler::*;
use crate::api::middleware::cors::cors_layer;
use crate::api::middleware::verify_internal::verify_internal_ident;
use crate::db::{StoreErr, store};
use crate::llm::LlmErr;
use crate::pipeline::PipelineErr;
use crate::util::env::{EnvErr, Var};
use crate::var;

pub type JsonResult<T> = core::result::Result<Json<T>, RouteError>;

#[derive(Clone, Debug)]
pub struct AppState {
    pub manager: ConnectionManager,
}

#[instrument(skip(tx))]
pub async fn router(tx: UnboundedSender<SocketAddr>) {
    let state = Arc::new(AppState {
        manager: store().await.unwrap().manager.clone(),
    });

    //
    // batch triggers, internal callers only
    let internal_post_routes = Router::new()
        .route("/run/analyzer", post(run_analyzer))
        .route("/run/aggregator", post(run_aggregator))
        .route("/run/quests/generate", post(run_quest_generation))
        .route("/run/quests/evaluate", post(run_quest_evaluation))
        .route("/run/achievements", post(run_achievements))
        .route_layer(middleware::from_fn(verify_internal_ident));

    let app = Router::new()
        .merge(internal_post_routes)
        //
        // general
        .route("/", get(|| async { Response::new(Body::empty()) }))
        //
        // users + bot profiles
        .route("/user", post(upsert_user))
        .route("/user/{id}", get(user_by_id))
        .route("/users", get(list_users))
        .route("/bots", get(list_bots))
        //
        // chat
        .route("/chat/{user_id}", post(chat))
        //
        // progression
        .route("/competency/{user_id}", get(competencies_for_user))
        .route("/quests/{user_id}", get(quests_for_user))
        .route("/achievements/{user_id}", get(achievements_for_user))
        .layer(cors_layer())
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
                let method = req.method();
                let uri = req.uri();

                let matched_path = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|matched| matched.as_str());

                tracing::debug_span!("api_request", ?method, ?uri, ?matched_path)
            }),
        )
        .layer(from_fn(log_route_errors))
        .with_state(state);

    let port = var!(Var::ServerApiPort)
        .await
        .unwrap()
        .parse::<u16>()
        .unwrap();

    let socket_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), port);
    let listener = tokio::net::TcpListener::bind(socket_addr).await.unwrap();

    tx.send(socket_addr).unwrap();
    axum::serve(listener, app).await.unwrap()
}

/// Route handlers stash their error in the response extensions; this logs it
/// once with the request context attached.
#[instrument(skip(request, next), fields(uri = request.uri().to_string()))]
async fn log_route_errors(request: Request, next: Next) -> Response {
    let res = next.run(request).await;
    if let Some(err) = res.extensions().get::<Arc<RouteError>>() {
        tracing::error!(error = ?err, "error occurred inside route handler");
    }

    res
}

#[instrument(skip(tx, rx))]
pub async fn start_server(
    tx: UnboundedSender<SocketAddr>,
    mut rx: UnboundedReceiver<SocketAddr>,
) -> Result<Vec<JoinHandle<()>>, RouteError> {
    tracing::info!("starting server");
    let server_handle = tokio::task::spawn(async move {
        router(tx).await;
    });

    let logging_handle = tokio::task::spawn(async move {
        while !rx.is_closed() {
            if let Some(msg) = rx.recv().await {
                tracing::info!(
                    server_url = &format!("http://127.0.0.1:{}", msg.port()),
                    "server ready"
                );
                break;
            }
        }
    });

    let handles = vec![server_handle, logging_handle];
    Ok(handles)
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    StoreError(#[from] StoreErr),

    #[error(transparent)]
    LlmError(#[from] LlmErr),

    #[error(transparent)]
    PipelineError(#[from] PipelineErr),

    #[error(transparent)]
    EnvError(#[from] EnvErr),

    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error("unknown bot '{0}'")]
    UnknownBot(String),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
        }

        let (status, message, err) = match &self {
            RouteError::UnknownUser(ident) => (
                StatusCode::NOT_FOUND,
                format!("unknown user '{ident}'"),
                // a bad id from the caller, not a server fault
                None,
            ),

            RouteError::UnknownBot(ident) => (
                StatusCode::NOT_FOUND,
                format!("unknown bot '{ident}'"),
                None,
            ),

            RouteError::PipelineError(PipelineErr::QuestSetMissing { .. }) => {
                (StatusCode::NOT_FOUND, self.to_string(), None)
            }

            RouteError::PipelineError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                Some(self),
            ),

            RouteError::LlmError(llm_err) => match llm_err {
                LlmErr::RateLimited { .. } | LlmErr::Unavailable => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    String::from("completion endpoint is saturated; try again shortly"),
                    Some(self),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    llm_err.to_string(),
                    Some(self),
                ),
            },

            RouteError::StoreError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                Some(self),
            ),

            RouteError::EnvError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                err.to_string(),
                Some(self),
            ),
        };

        let mut response = (status, Json(ErrorResponse { message })).into_response();
        if let Some(err) = err {
            response.extensions_mut().insert(Arc::new(err));
        }

        response
    }
}
