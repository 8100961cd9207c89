//! Card filtering.
//!
//! A `FilterState` is an immutable value describing the current selection.
//! Every dimension with an empty selection is unrestricted; all dimensions
//! are ANDed together.

use crate::models::{Card, Label};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Calendar-date bounds on a card's due date.
///
/// The lower bound starts at midnight UTC; the upper bound covers the
/// whole day, up to 23:59:59.999 UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DueRange {
    /// Returns true when at least one bound is set.
    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Check a due timestamp against the range. A missing due date never
    /// matches an active range.
    pub fn contains(&self, due: Option<DateTime<Utc>>) -> bool {
        if !self.is_active() {
            return true;
        }
        let Some(due) = due else {
            return false;
        };

        if let Some(from) = self.from {
            if due < from.and_time(NaiveTime::MIN).and_utc() {
                return false;
            }
        }
        if let Some(to) = self.to {
            let end_of_day =
                to.and_time(NaiveTime::MIN).and_utc() + TimeDelta::days(1) - TimeDelta::milliseconds(1);
            if due > end_of_day {
                return false;
            }
        }
        true
    }
}

/// Selection criteria applied before every aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub lists: HashSet<String>,
    pub labels: HashSet<String>,
    pub members: HashSet<String>,
    pub due: DueRange,
}

impl FilterState {
    /// An empty filter that matches every card.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given lists.
    pub fn with_lists<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lists.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Restrict to cards carrying any of the given labels.
    pub fn with_labels<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Restrict to cards assigned to any of the given members.
    pub fn with_members<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Set the due-date bounds.
    pub fn with_due(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.due = DueRange { from, to };
        self
    }

    /// Return a copy with `id` added to or removed from the list selection.
    pub fn toggle_list(&self, id: &str) -> Self {
        let mut next = self.clone();
        toggle(&mut next.lists, id);
        next
    }

    /// Return a copy with `id` added to or removed from the label selection.
    pub fn toggle_label(&self, id: &str) -> Self {
        let mut next = self.clone();
        toggle(&mut next.labels, id);
        next
    }

    /// Return a copy with `id` added to or removed from the member selection.
    pub fn toggle_member(&self, id: &str) -> Self {
        let mut next = self.clone();
        toggle(&mut next.members, id);
        next
    }

    /// Number of active criteria; the due range counts once.
    pub fn active_count(&self) -> usize {
        self.lists.len()
            + self.labels.len()
            + self.members.len()
            + usize::from(self.due.is_active())
    }

    /// Returns true when no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }
}

fn toggle(set: &mut HashSet<String>, id: &str) {
    if !set.remove(id) {
        set.insert(id.to_string());
    }
}

/// Check whether a card passes every active criterion.
pub fn matches(card: &Card, filter: &FilterState) -> bool {
    if !filter.lists.is_empty() {
        match card.list_id {
            Some(ref id) if filter.lists.contains(id) => {}
            _ => return false,
        }
    }

    if !filter.labels.is_empty() && !card.labels.iter().any(|l| filter.labels.contains(&l.id)) {
        return false;
    }

    if !filter.members.is_empty() && !card.member_ids.iter().any(|m| filter.members.contains(m))
    {
        return false;
    }

    filter.due.contains(card.due)
}

/// Cards passing the filter, in their original order.
pub fn filter_cards<'a>(cards: &'a [Card], filter: &FilterState) -> Vec<&'a Card> {
    cards.iter().filter(|c| matches(c, filter)).collect()
}

/// Every distinct label used on the board, sorted by name.
///
/// The first occurrence of a label id wins.
pub fn label_catalog(cards: &[Card]) -> Vec<Label> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut labels: Vec<Label> = Vec::new();

    for label in cards.iter().flat_map(|c| &c.labels) {
        if seen.insert(label.id.as_str()) {
            labels.push(label.clone());
        }
    }

    labels.sort_by_cached_key(|l| l.name.to_lowercase());
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::{card, fixture_snapshot};
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn due_card(due: Option<DateTime<Utc>>) -> Card {
        let mut c = card("c", "l1", &[]);
        c.due = due;
        c
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let snapshot = fixture_snapshot();
        let filter = FilterState::new();
        assert!(filter.is_empty());
        assert!(snapshot.cards.iter().all(|c| matches(c, &filter)));
    }

    #[test]
    fn test_list_filter() {
        let filter = FilterState::new().with_lists(["l1"]);
        assert!(matches(&card("a", "l1", &[]), &filter));
        assert!(!matches(&card("b", "l2", &[]), &filter));

        let mut no_list = card("c", "l1", &[]);
        no_list.list_id = None;
        assert!(!matches(&no_list, &filter));
    }

    #[test]
    fn test_label_filter_is_or() {
        let snapshot = fixture_snapshot();
        let filter = FilterState::new().with_labels(["lb-feat", "lb-ux"]);
        let ids: Vec<&str> = filter_cards(&snapshot.cards, &filter)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c2", "c5"]);
    }

    #[test]
    fn test_member_filter_is_or() {
        let filter = FilterState::new().with_members(["m1", "m3"]);
        assert!(matches(&card("a", "l", &["m2", "m3"]), &filter));
        assert!(!matches(&card("b", "l", &["m2"]), &filter));
        assert!(!matches(&card("c", "l", &[]), &filter));
    }

    #[test]
    fn test_due_range_bounds() {
        let filter = FilterState::new().with_due(Some(date("2024-01-01")), Some(date("2024-01-31")));

        let late = due_card(Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()));
        let last_evening = due_card(Some(Utc.with_ymd_and_hms(2024, 1, 31, 23, 0, 0).unwrap()));
        let first_midnight = due_card(Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let early = due_card(Some(Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap()));

        assert!(!matches(&late, &filter));
        assert!(matches(&last_evening, &filter));
        assert!(matches(&first_midnight, &filter));
        assert!(!matches(&early, &filter));
    }

    #[test]
    fn test_due_range_excludes_cards_without_due() {
        let only_to = FilterState::new().with_due(None, Some(date("2030-01-01")));
        assert!(!matches(&due_card(None), &only_to));

        let none = FilterState::new();
        assert!(matches(&due_card(None), &none));
    }

    #[test]
    fn test_filters_are_anded() {
        let snapshot = fixture_snapshot();
        let filter = FilterState::new()
            .with_labels(["lb-bug"])
            .with_members(["m-grace"]);
        let ids: Vec<&str> = filter_cards(&snapshot.cards, &filter)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c4"]);
    }

    #[test]
    fn test_toggle_and_active_count() {
        let filter = FilterState::new();
        let one = filter.toggle_list("l1");
        assert_eq!(one.active_count(), 1);
        assert_eq!(filter.active_count(), 0);

        let two = one.toggle_member("m1").toggle_label("lb");
        assert_eq!(two.active_count(), 3);

        let back = two.toggle_list("l1");
        assert_eq!(back.active_count(), 2);

        let dated = back.with_due(Some(date("2024-01-01")), Some(date("2024-02-01")));
        assert_eq!(dated.active_count(), 3);
    }

    #[test]
    fn test_label_catalog() {
        let snapshot = fixture_snapshot();
        let names: Vec<String> = label_catalog(&snapshot.cards)
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Bug", "Feature", "purple"]);
    }

    #[test]
    fn test_label_catalog_ignores_case() {
        let mut a = card("a", "l1", &[]);
        a.labels = vec![Label {
            id: "lb-f".into(),
            name: "Feature".into(),
            color: None,
        }];
        let mut b = card("b", "l1", &[]);
        b.labels = vec![Label {
            id: "lb-b".into(),
            name: "bug".into(),
            color: None,
        }];
        let names: Vec<String> = label_catalog(&[a, b]).into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["bug", "Feature"]);
    }
}
