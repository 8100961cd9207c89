//! Client for the public board proxy (`GET /api/board`).

use super::{get_json, BoardSource};
use crate::error::FetchError;
use crate::models::RawBoardData;
use tracing::info;
use url::Url;

/// Reads boards through a deployed board proxy.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    base: String,
    access: Option<String>,
}

impl ProxyClient {
    /// `base` is the proxy origin, e.g. `https://reports.example.com`.
    pub fn new(base: impl Into<String>, access: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
            access: access.filter(|a| !a.is_empty()),
        }
    }

    /// Endpoint URL for one board; `access` is only sent when set.
    pub fn endpoint(&self, board_id: &str) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!("{}/api/board", self.base))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("boardId", board_id);
            if let Some(ref access) = self.access {
                query.append_pair("access", access);
            }
        }
        Ok(url)
    }
}

impl BoardSource for ProxyClient {
    async fn fetch_board(&self, board_id: &str) -> Result<RawBoardData, FetchError> {
        let url = self.endpoint(board_id)?;
        info!("Fetching board {} through {}", board_id, self.base);
        get_json::<RawBoardData>(&self.client, url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_endpoint_encodes_params() {
        let client = ProxyClient::new("https://reports.example.com/", Some("a b".into()));
        let url = client.endpoint("CUUp9Mv3").unwrap();
        assert_eq!(
            url.as_str(),
            "https://reports.example.com/api/board?boardId=CUUp9Mv3&access=a+b"
        );

        let open = ProxyClient::new("https://reports.example.com", Some(String::new()));
        assert_eq!(
            open.endpoint("b1").unwrap().as_str(),
            "https://reports.example.com/api/board?boardId=b1"
        );
    }

    #[tokio::test]
    async fn test_fetch_through_proxy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/board"))
            .and(query_param("boardId", "b1"))
            .and(query_param("access", "devtoken"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(include_str!("../../fixtures/board.json"))
                    .insert_header("content-type", "application/json"),
            )
            .mount(&server)
            .await;

        let client = ProxyClient::new(server.uri(), Some("devtoken".into()));
        let snapshot = super::super::load_snapshot(&client, "b1").await.unwrap();
        assert_eq!(snapshot.board_name.as_deref(), Some("Product Roadmap"));
        assert_eq!(snapshot.cards.len(), 8);
    }

    #[tokio::test]
    async fn test_unauthorized_is_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/board"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(serde_json::json!({"error": "unauthorized"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ProxyClient::new(server.uri(), Some("wrong".into()));
        let err = client.fetch_board("b1").await.unwrap_err();
        assert_eq!(err.status(), Some(401));
    }
}
