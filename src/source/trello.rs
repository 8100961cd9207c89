//! Trello REST API client.

use super::{get_json, BoardSource};
use crate::error::FetchError;
use crate::models::{RawBoard, RawBoardData, RawCard, RawList, RawMember};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tracing::info;
use url::Url;

/// Public Trello API root.
pub const DEFAULT_API_BASE: &str = "https://api.trello.com/1";

const BOARD_FIELDS: &str = "name,url";
const LIST_FIELDS: &str = "id,name,pos,closed";
const CARD_FIELDS: &str = "id,name,idList,labels,dateLastActivity,shortUrl,closed,idMembers,due";
const MEMBER_FIELDS: &str = "id,fullName,username,initials,avatarUrl";

/// API key and token pair for the Trello REST API.
#[derive(Clone, PartialEq, Eq)]
pub struct TrelloCredentials {
    pub key: String,
    pub token: String,
}

impl TrelloCredentials {
    /// Build credentials when both parts are present and non-empty.
    pub fn from_parts(key: Option<String>, token: Option<String>) -> Option<Self> {
        match (key, token) {
            (Some(key), Some(token)) if !key.trim().is_empty() && !token.trim().is_empty() => {
                Some(Self { key, token })
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for TrelloCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrelloCredentials")
            .field("key", &"***")
            .field("token", &"***")
            .finish()
    }
}

/// Reads boards straight from the Trello API.
#[derive(Debug, Clone)]
pub struct TrelloApi {
    client: reqwest::Client,
    base: String,
    credentials: Option<TrelloCredentials>,
}

impl TrelloApi {
    /// Create a client for `base` (usually `DEFAULT_API_BASE`).
    pub fn new(base: impl Into<String>, credentials: Option<TrelloCredentials>) -> Self {
        Self::with_client(reqwest::Client::new(), base, credentials)
    }

    /// Create a client reusing an existing HTTP client.
    pub fn with_client(
        client: reqwest::Client,
        base: impl Into<String>,
        credentials: Option<TrelloCredentials>,
    ) -> Self {
        Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Returns true when a key and token are configured.
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn url(&self, board_id: &str, resource: Option<&str>, fields: &str) -> Result<Url, FetchError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(FetchError::MissingCredentials)?;
        let board = utf8_percent_encode(board_id, NON_ALPHANUMERIC);
        let path = match resource {
            Some(r) => format!("{}/boards/{}/{}", self.base, board, r),
            None => format!("{}/boards/{}", self.base, board),
        };
        Ok(Url::parse_with_params(
            &path,
            &[
                ("fields", fields),
                ("key", credentials.key.as_str()),
                ("token", credentials.token.as_str()),
            ],
        )?)
    }
}

impl BoardSource for TrelloApi {
    async fn fetch_board(&self, board_id: &str) -> Result<RawBoardData, FetchError> {
        let board_url = self.url(board_id, None, BOARD_FIELDS)?;
        let lists_url = self.url(board_id, Some("lists"), LIST_FIELDS)?;
        let cards_url = self.url(board_id, Some("cards"), CARD_FIELDS)?;
        let members_url = self.url(board_id, Some("members"), MEMBER_FIELDS)?;

        info!("Fetching board {} from the Trello API", board_id);
        let (board, lists, cards, members) = futures::try_join!(
            get_json::<RawBoard>(&self.client, board_url),
            get_json::<Vec<RawList>>(&self.client, lists_url),
            get_json::<Vec<RawCard>>(&self.client, cards_url),
            get_json::<Vec<RawMember>>(&self.client, members_url),
        )?;

        Ok(RawBoardData {
            board: Some(board),
            lists,
            cards,
            members,
        })
    }
}
