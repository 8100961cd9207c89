//! Board proxy server.
//!
//! Serves `GET /api/board?boardId=<id>&access=<token>`: checks the shared
//! access token, fetches the board from the Trello API with server-side
//! credentials and returns `{board, lists, cards, members}`.

use crate::error::ProxyError;
use crate::source::{BoardSource, TrelloApi};
use anyhow::{Context, Result};
use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Default `Cache-Control` directive on successful responses.
pub const DEFAULT_CACHE_CONTROL: &str = "s-maxage=60, stale-while-revalidate=300";

/// Shared state for proxy handlers.
#[derive(Debug, Clone)]
pub struct ProxyState {
    api: Arc<TrelloApi>,
    access_token: Option<String>,
    cache_control: HeaderValue,
}

impl ProxyState {
    /// Build proxy state. An empty access token disables the check.
    pub fn new(api: TrelloApi, access_token: Option<String>, cache_control: &str) -> Result<Self> {
        let cache_control = HeaderValue::from_str(cache_control)
            .with_context(|| format!("Invalid cache_control value: {:?}", cache_control))?;
        Ok(Self {
            api: Arc::new(api),
            access_token: access_token.filter(|t| !t.is_empty()),
            cache_control,
        })
    }
}

#[derive(Debug, Default)]
struct BoardQuery {
    board_id: Option<String>,
    access: Option<String>,
}

impl BoardQuery {
    /// Read `boardId` and `access` from a raw query string. The first
    /// occurrence of a key wins; anything else is ignored.
    fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "boardId" if query.board_id.is_none() => query.board_id = Some(value.into_owned()),
                "access" if query.access.is_none() => query.access = Some(value.into_owned()),
                _ => {}
            }
        }
        query
    }
}

/// Build the proxy router.
pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/api/board", get(get_board))
        .with_state(state)
}

async fn get_board(
    State(state): State<ProxyState>,
    RawQuery(raw): RawQuery,
) -> Result<Response, ProxyError> {
    let query = BoardQuery::parse(raw.as_deref());

    if let Some(ref required) = state.access_token {
        if query.access.as_deref() != Some(required.as_str()) {
            warn!("Rejected board request with a bad access token");
            return Err(ProxyError::Unauthorized);
        }
    }

    let board_id = match query.board_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(ProxyError::MissingBoardId),
    };

    if !state.api.has_credentials() {
        error!("Board request for {} failed: Trello credentials are not configured", board_id);
        return Err(ProxyError::NotConfigured);
    }

    let data = state.api.fetch_board(&board_id).await.map_err(|e| {
        error!("Upstream fetch for board {} failed: {}", board_id, e);
        ProxyError::Upstream(e)
    })?;

    info!(
        "Served board {} ({} cards, {} lists)",
        board_id,
        data.cards.len(),
        data.lists.len()
    );

    let mut response = Json(data).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, state.cache_control.clone());
    Ok(response)
}

/// Bind `addr` and serve the proxy until Ctrl-C.
pub async fn serve(state: ProxyState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Board proxy listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Board proxy server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down board proxy");
}
