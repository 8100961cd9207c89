//! Weekly digest text.
//!
//! The digest is plain text assembled by hand: recent cards grouped by list,
//! then by owner, in the order the cards were encountered.

use crate::models::{BoardSnapshot, Card};
use chrono::{DateTime, TimeDelta, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Rolling window, in days, covered by the digest.
pub const DIGEST_WINDOW_DAYS: i64 = 7;

/// Owner heading for cards nobody is assigned to.
pub const NO_OWNER: &str = "(no owner)";

/// Heading for cards whose list is missing.
pub const NO_LIST: &str = "(no list)";

/// Title used when neither a report name nor a board name is known.
pub const DEFAULT_TITLE: &str = "Report";

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Pick the digest title: custom report name, then board name.
pub fn digest_title(report_name: Option<&str>, board_name: Option<&str>) -> String {
    report_name
        .filter(|n| !n.trim().is_empty())
        .or(board_name.filter(|n| !n.trim().is_empty()))
        .unwrap_or(DEFAULT_TITLE)
        .to_string()
}

/// Cards with activity inside the digest window ending at `now`.
pub fn recent_cards<'a>(cards: &[&'a Card], now: DateTime<Utc>) -> Vec<&'a Card> {
    let limit = now - TimeDelta::days(DIGEST_WINDOW_DAYS);
    cards
        .iter()
        .copied()
        .filter(|c| c.last_activity.is_some_and(|ts| ts >= limit))
        .collect()
}

type OwnerGroup<'a> = (String, Vec<&'a str>);

/// Build the weekly digest for the filtered cards.
pub fn weekly_digest(
    snapshot: &BoardSnapshot,
    cards: &[&Card],
    title: &str,
    now: DateTime<Utc>,
) -> String {
    let recent = recent_cards(cards, now);

    let mut groups: Vec<(String, Vec<OwnerGroup>)> = Vec::new();
    for card in &recent {
        let list = match card.list_id.as_deref() {
            Some(id) => snapshot.list_name(id).to_string(),
            None => NO_LIST.to_string(),
        };
        let owners: Vec<String> = if card.member_ids.is_empty() {
            vec![NO_OWNER.to_string()]
        } else {
            card.member_ids
                .iter()
                .map(|m| snapshot.member_name(m).to_string())
                .collect()
        };

        let idx = match groups.iter().position(|(name, _)| *name == list) {
            Some(i) => i,
            None => {
                groups.push((list, Vec::new()));
                groups.len() - 1
            }
        };
        let by_owner = &mut groups[idx].1;

        for owner in owners {
            match by_owner.iter_mut().find(|(name, _)| *name == owner) {
                Some((_, items)) => items.push(card.title.as_str()),
                None => by_owner.push((owner, vec![card.title.as_str()])),
            }
        }
    }

    let mut text = String::new();
    text.push_str(&format!("Weekly digest – {}\n\n", title));
    text.push_str(&format!("Period: last {} days\n", DIGEST_WINDOW_DAYS));
    text.push_str(&format!("Total cards with activity: {}\n\n", recent.len()));

    for (list, owners) in &groups {
        text.push_str(&format!("# {}\n", list));
        for (owner, items) in owners {
            text.push_str(&format!("- {} ({}):\n", owner, items.len()));
            for item in items {
                text.push_str(&format!("  • {}\n", item));
            }
        }
        text.push('\n');
    }

    text.trim().to_string()
}

/// A `mailto:` link that opens a mail draft carrying the digest.
pub fn mailto_link(recipient: &str, title: &str, digest: &str) -> String {
    let subject = format!("Weekly Digest - {}", title);
    format!(
        "mailto:{}?subject={}&body={}",
        recipient,
        utf8_percent_encode(&subject, URI_COMPONENT),
        utf8_percent_encode(digest, URI_COMPONENT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::fixture_snapshot;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_digest() {
        let snapshot = fixture_snapshot();
        let digest = weekly_digest(&snapshot, &[], "Sprint 12", now());

        assert_eq!(
            digest,
            "Weekly digest – Sprint 12\n\nPeriod: last 7 days\nTotal cards with activity: 0"
        );
        assert!(!digest.contains("# "));
    }

    #[test]
    fn test_digest_groups_by_list_then_owner() {
        let snapshot = fixture_snapshot();
        let refs: Vec<&Card> = snapshot.cards.iter().collect();
        let digest = weekly_digest(&snapshot, &refs, "Product Roadmap", now());

        let expected = "\
Weekly digest – Product Roadmap

Period: last 7 days
Total cards with activity: 5

# To Do
- Ada Lovelace (2):
  • Fix login redirect
  • Export to CSV
- grace (1):
  • Export to CSV

# Doing
- grace (1):
  • Payment \"retry\" flow

# Done
- Ada Lovelace (1):
  • Release notes
for 2.1
- (no owner) (1):
  • Old spike";
        assert_eq!(digest, expected);
    }

    #[test]
    fn test_recent_window_is_inclusive() {
        let snapshot = fixture_snapshot();
        let refs: Vec<&Card> = snapshot.cards.iter().collect();
        // c1 was touched at 2024-03-14T09:00Z
        let edge = Utc.with_ymd_and_hms(2024, 3, 21, 9, 0, 0).unwrap();
        let ids: Vec<&str> = recent_cards(&refs, edge).iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c6", "c7"]);
    }

    #[test]
    fn test_digest_title_precedence() {
        assert_eq!(digest_title(Some("Weekly"), Some("Board")), "Weekly");
        assert_eq!(digest_title(Some(""), Some("Board")), "Board");
        assert_eq!(digest_title(None, None), DEFAULT_TITLE);
    }

    #[test]
    fn test_mailto_link() {
        let link = mailto_link("lead@example.com", "Q1 (ops)", "Line one\nLine two");
        assert_eq!(
            link,
            "mailto:lead@example.com?subject=Weekly%20Digest%20-%20Q1%20(ops)&body=Line%20one%0ALine%20two"
        );
    }
}
