//! Board data sources.
//!
//! A `BoardSource` returns the raw board payload for a board id. Two sources
//! exist: the Trello REST API itself and the board proxy endpoint that
//! fronts it. Either way the four resources arrive together or not at all.

mod proxy;
mod trello;

pub use proxy::ProxyClient;
pub use trello::{TrelloApi, TrelloCredentials, DEFAULT_API_BASE};

use crate::error::FetchError;
use crate::models::{BoardSnapshot, RawBoardData};
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::{debug, info};
use url::Url;

/// Something that can produce a board payload.
pub trait BoardSource {
    /// Fetch board, lists, cards and members for `board_id`.
    fn fetch_board(
        &self,
        board_id: &str,
    ) -> impl Future<Output = Result<RawBoardData, FetchError>> + Send;
}

/// Where a report reads its board from.
#[derive(Debug, Clone)]
pub enum Source {
    /// Through a deployed board proxy (public mode).
    Proxy(ProxyClient),
    /// Straight from the Trello API with local credentials.
    Direct(TrelloApi),
}

impl Source {
    /// Pick the proxy when public mode is on and a proxy origin is known,
    /// otherwise the Trello API.
    pub fn select(
        public_mode: bool,
        proxy_url: Option<&str>,
        access: Option<String>,
        api: TrelloApi,
    ) -> Self {
        match proxy_url.map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) if public_mode => Source::Proxy(ProxyClient::new(url, access)),
            _ => Source::Direct(api),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Source::Proxy(_) => "board proxy",
            Source::Direct(_) => "Trello API",
        }
    }
}

impl BoardSource for Source {
    async fn fetch_board(&self, board_id: &str) -> Result<RawBoardData, FetchError> {
        match self {
            Source::Proxy(client) => client.fetch_board(board_id).await,
            Source::Direct(api) => api.fetch_board(board_id).await,
        }
    }
}

/// Fetch and validate a board in one step.
pub async fn load_snapshot<S: BoardSource>(
    source: &S,
    board_id: &str,
) -> Result<BoardSnapshot, FetchError> {
    let raw = source.fetch_board(board_id).await?;
    info!(
        "Fetched board {}: {} lists, {} cards, {} members",
        board_id,
        raw.lists.len(),
        raw.cards.len(),
        raw.members.len()
    );
    Ok(BoardSnapshot::from_raw(raw))
}

/// URL without its query string, safe to log (queries carry secrets).
pub(crate) fn redacted(url: &Url) -> String {
    let mut clean = url.clone();
    clean.set_query(None);
    clean.to_string()
}

/// GET a URL and decode the JSON body, mapping failures to `FetchError`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: Url,
) -> Result<T, FetchError> {
    let shown = redacted(&url);
    debug!("GET {}", shown);

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Transport {
            url: shown.clone(),
            source: source.without_url(),
        })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(FetchError::Status {
            url: shown,
            status,
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|source| FetchError::Decode {
            url: shown,
            source: source.without_url(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> TrelloApi {
        TrelloApi::new(DEFAULT_API_BASE, None)
    }

    #[test]
    fn test_select_source() {
        let proxy = Source::select(true, Some("https://reports.example.com"), None, api());
        assert!(matches!(proxy, Source::Proxy(_)));
        assert_eq!(proxy.describe(), "board proxy");

        assert!(matches!(
            Source::select(false, Some("https://reports.example.com"), None, api()),
            Source::Direct(_)
        ));
        assert!(matches!(Source::select(true, None, None, api()), Source::Direct(_)));
        assert!(matches!(Source::select(true, Some("  "), None, api()), Source::Direct(_)));
    }

    struct StaticSource(&'static str);

    impl BoardSource for StaticSource {
        async fn fetch_board(&self, _board_id: &str) -> Result<RawBoardData, FetchError> {
            Ok(serde_json::from_str(self.0).expect("fixture parses"))
        }
    }

    #[test]
    fn test_load_snapshot_validates() {
        let source = StaticSource(include_str!("../../fixtures/board.json"));
        let snapshot = tokio_test::block_on(load_snapshot(&source, "b1")).unwrap();

        // the id-less card is dropped at the boundary
        assert_eq!(snapshot.cards.len(), 8);
        assert_eq!(snapshot.lists.len(), 4);
        assert_eq!(snapshot.open_lists().len(), 3);
    }

    #[test]
    fn test_redacted_drops_query() {
        let url = Url::parse("https://api.trello.com/1/boards/b1?key=k&token=t").unwrap();
        assert_eq!(redacted(&url), "https://api.trello.com/1/boards/b1");
    }
}
