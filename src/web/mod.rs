pub mod chart;
pub mod page;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::dataset::DatasetCache;
use crate::query::QueryError;
use page::PageParams;

#[derive(Clone)]
pub struct AppState {
    pub db_path: Arc<PathBuf>,
    pub cache: Arc<DatasetCache>,
}

impl AppState {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path: Arc::new(db_path), cache: Arc::new(DatasetCache::new()) }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/reload", post(reload))
        .with_state(state)
}

async fn index(State(state): State<AppState>, Query(params): Query<PageParams>) -> Response {
    let rendered =
        tokio::task::spawn_blocking(move || page::render(&state.db_path, &state.cache, &params)).await;
    match rendered {
        Ok((status, body)) => (status, Html(body)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "page render failed");
            let body = page::failure_page(&QueryError::Unexpected(e.to_string()));
            (StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
        }
    }
}

async fn reload(State(state): State<AppState>) -> Redirect {
    state.cache.invalidate();
    Redirect::to("/")
}

pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, db = %state.db_path.display(), "dashboard listening");
    axum::serve(listener, router(state)).await
}
