//! Data models for board analytics.
//!
//! Two layers live here: the raw records exactly as the Trello API (or the
//! board proxy) sends them, and the validated domain entities every other
//! module works with. `BoardSnapshot::from_raw` is the only bridge between
//! the two.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

/// Display name for cards that nobody owns.
pub const UNASSIGNED_NAME: &str = "Unassigned";

/// Display name for member ids missing from the member table.
pub const UNKNOWN_MEMBER_NAME: &str = "Unknown member";

/// Label name used when a label has neither a name nor a color.
pub const UNNAMED_LABEL: &str = "Unnamed";

// ---------------------------------------------------------------------------
// Raw wire records
// ---------------------------------------------------------------------------

/// Board header as returned by `GET /boards/{id}?fields=name,url`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBoard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A list record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawList {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub closed: Option<bool>,
    #[serde(default)]
    pub pos: Option<f64>,
}

/// A label attached to a card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawLabel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// A card record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCard {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id_list: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<RawLabel>>,
    #[serde(default)]
    pub id_members: Option<Vec<String>>,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub date_last_activity: Option<String>,
    #[serde(default)]
    pub closed: Option<bool>,
    #[serde(default)]
    pub short_url: Option<String>,
}

/// A board member record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMember {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub initials: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// The payload served by `GET /api/board`.
///
/// A collection that is missing, `null` or not an array decodes as empty;
/// array entries that don't fit the record shape are skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBoardData {
    #[serde(default)]
    pub board: Option<RawBoard>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub lists: Vec<RawList>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub cards: Vec<RawCard>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub members: Vec<RawMember>,
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => {
            warn!("Expected an array but got null; treating it as empty");
            return Ok(Vec::new());
        }
        other => {
            warn!("Expected an array but got {}; treating it as empty", other);
            return Ok(Vec::new());
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed record: {}", e);
                None
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Domain entities
// ---------------------------------------------------------------------------

/// A card label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    /// Label name, falling back to the color name.
    pub name: String,
    pub color: Option<String>,
}

/// A card snapshot. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub title: String,
    pub list_id: Option<String>,
    pub labels: Vec<Label>,
    pub member_ids: Vec<String>,
    pub due: Option<DateTime<Utc>>,
    /// The due value exactly as received, kept for exports.
    pub due_raw: Option<String>,
    pub last_activity: Option<DateTime<Utc>>,
    pub closed: bool,
    pub link: Option<String>,
}

impl Card {
    /// Returns true when nobody is assigned to the card.
    pub fn is_unassigned(&self) -> bool {
        self.member_ids.is_empty()
    }

    /// Owners of the card as tagged keys; `[Unassigned]` for nobody.
    pub fn owner_keys(&self) -> Vec<MemberKey> {
        if self.member_ids.is_empty() {
            vec![MemberKey::Unassigned]
        } else {
            self.member_ids
                .iter()
                .map(|id| MemberKey::Member(id.clone()))
                .collect()
        }
    }
}

/// A board list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub name: String,
    pub closed: bool,
    pub position: f64,
}

/// A board member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    /// Full name, else username, else initials, else the id.
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Identifies a per-member bucket.
///
/// Cards without assignees land in `Unassigned`, which can never collide
/// with a real member id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum MemberKey {
    Member(String),
    Unassigned,
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKey::Member(id) => write!(f, "{}", id),
            MemberKey::Unassigned => write!(f, "(unassigned)"),
        }
    }
}

/// Validated, immutable view of one board fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub board_name: Option<String>,
    pub board_url: Option<String>,
    pub lists: Vec<List>,
    pub cards: Vec<Card>,
    pub members: Vec<Member>,
}

impl BoardSnapshot {
    /// Validate a raw payload into domain entities.
    ///
    /// Records without an id are dropped. Unparsable timestamps become
    /// `None`. Every drop or fallback is logged.
    pub fn from_raw(raw: RawBoardData) -> Self {
        let (board_name, board_url) = match raw.board {
            Some(b) => (non_empty(b.name), non_empty(b.url)),
            None => (None, None),
        };

        let lists = raw.lists.into_iter().filter_map(parse_list).collect();
        let cards = raw.cards.into_iter().filter_map(parse_card).collect();
        let members = raw.members.into_iter().filter_map(parse_member).collect();

        Self {
            board_name,
            board_url,
            lists,
            cards,
            members,
        }
    }

    /// Look up a list by id.
    pub fn list(&self, id: &str) -> Option<&List> {
        self.lists.iter().find(|l| l.id == id)
    }

    /// Look up a member by id.
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Open lists ordered by board position.
    pub fn open_lists(&self) -> Vec<&List> {
        let mut open: Vec<&List> = self.lists.iter().filter(|l| !l.closed).collect();
        open.sort_by(|a, b| a.position.total_cmp(&b.position));
        open
    }

    /// Name of a list, or the raw id when the list is unknown.
    pub fn list_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.list(id).map(|l| l.name.as_str()).unwrap_or(id)
    }

    /// Name of a member, or the raw id when the member is unknown.
    pub fn member_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.member(id)
            .map(|m| m.display_name.as_str())
            .unwrap_or(id)
    }

    /// Display name for an aggregation key.
    pub fn member_key_name(&self, key: &MemberKey) -> String {
        match key {
            MemberKey::Unassigned => UNASSIGNED_NAME.to_string(),
            MemberKey::Member(id) => self
                .member(id)
                .map(|m| m.display_name.clone())
                .unwrap_or_else(|| UNKNOWN_MEMBER_NAME.to_string()),
        }
    }
}

/// Two-letter initials of a display name (`"—"` when empty).
pub fn initials_of(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    let first = parts.first().and_then(|p| p.chars().next());
    let last = if parts.len() > 1 {
        parts.last().and_then(|p| p.chars().next())
    } else {
        None
    };

    let initials: String = first
        .into_iter()
        .chain(last)
        .flat_map(char::to_uppercase)
        .collect();

    if initials.is_empty() {
        "—".to_string()
    } else {
        initials
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_timestamp(value: Option<&str>, field: &str, card_id: &str) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(value) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            warn!("Card {}: ignoring unparsable {} {:?}: {}", card_id, field, value, e);
            None
        }
    }
}

fn parse_label(raw: RawLabel) -> Option<Label> {
    let id = non_empty(raw.id)?;
    let color = non_empty(raw.color);
    let name = non_empty(raw.name)
        .or_else(|| color.clone())
        .unwrap_or_else(|| UNNAMED_LABEL.to_string());
    Some(Label { id, name, color })
}

fn parse_card(raw: RawCard) -> Option<Card> {
    let Some(id) = non_empty(raw.id) else {
        warn!("Dropping card without id: {:?}", raw.name);
        return None;
    };

    let due_raw = non_empty(raw.due);
    let due = parse_timestamp(due_raw.as_deref(), "due", &id);
    let last_activity = parse_timestamp(raw.date_last_activity.as_deref(), "dateLastActivity", &id);

    let labels = raw
        .labels
        .unwrap_or_default()
        .into_iter()
        .filter_map(parse_label)
        .collect();

    let member_ids = raw
        .id_members
        .unwrap_or_default()
        .into_iter()
        .filter(|m| !m.trim().is_empty())
        .collect();

    Some(Card {
        title: raw.name.unwrap_or_default(),
        list_id: non_empty(raw.id_list),
        labels,
        member_ids,
        due,
        due_raw,
        last_activity,
        closed: raw.closed.unwrap_or(false),
        link: non_empty(raw.short_url),
        id,
    })
}

fn parse_list(raw: RawList) -> Option<List> {
    let Some(id) = non_empty(raw.id) else {
        warn!("Dropping list without id: {:?}", raw.name);
        return None;
    };
    Some(List {
        name: raw.name.unwrap_or_else(|| id.clone()),
        closed: raw.closed.unwrap_or(false),
        position: raw.pos.unwrap_or(0.0),
        id,
    })
}

fn parse_member(raw: RawMember) -> Option<Member> {
    let Some(id) = non_empty(raw.id) else {
        warn!("Dropping member without id: {:?}", raw.username);
        return None;
    };
    let display_name = non_empty(raw.full_name)
        .or_else(|| non_empty(raw.username))
        .or_else(|| non_empty(raw.initials))
        .unwrap_or_else(|| id.clone());
    Some(Member {
        display_name,
        avatar_url: non_empty(raw.avatar_url),
        id,
    })
}
