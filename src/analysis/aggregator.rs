//! Card aggregation and statistics.
//!
//! Per-list counts, per-member counts and the list × member heatmap. All
//! functions are pure over a snapshot and an already-filtered card slice.

use crate::models::{initials_of, BoardSnapshot, Card, MemberKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Headline numbers over the whole, unfiltered board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_cards: usize,
    pub unassigned_cards: usize,
    pub lists: usize,
    pub members: usize,
}

/// One row of the per-list ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRow {
    pub id: String,
    pub name: String,
    pub count: usize,
}

/// One row of the per-member ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRow {
    pub key: MemberKey,
    pub name: String,
    pub initials: String,
    pub count: usize,
}

/// List × member count matrix.
///
/// `cells[i][j]` counts cards in `lists[i]` owned by `members[j]`. Rows and
/// columns follow the list and member rankings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heatmap {
    pub lists: Vec<String>,
    pub members: Vec<MemberKey>,
    pub cells: Vec<Vec<usize>>,
}

impl Heatmap {
    /// Cell value by ids; zero for unknown combinations.
    pub fn get(&self, list_id: &str, member: &MemberKey) -> usize {
        let row = self.lists.iter().position(|l| l == list_id);
        let col = self.members.iter().position(|m| m == member);
        match (row, col) {
            (Some(r), Some(c)) => self.cells[r][c],
            _ => 0,
        }
    }

    /// Sum of one row.
    pub fn row_total(&self, row: usize) -> usize {
        self.cells.get(row).map(|r| r.iter().sum()).unwrap_or(0)
    }

    /// Sum of one column.
    pub fn column_total(&self, col: usize) -> usize {
        self.cells.iter().filter_map(|r| r.get(col)).sum()
    }

    /// Largest cell value, used to scale shading.
    pub fn max(&self) -> usize {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// Compute board-wide KPIs.
pub fn kpis(snapshot: &BoardSnapshot) -> Kpis {
    Kpis {
        total_cards: snapshot.cards.len(),
        unassigned_cards: snapshot.cards.iter().filter(|c| c.is_unassigned()).count(),
        lists: snapshot.lists.len(),
        members: snapshot.members.len(),
    }
}

/// Count open cards per open list.
///
/// Every open list gets a row, even with zero cards. Rows are seeded in
/// board position order, so ties keep that order after the stable sort.
pub fn count_by_list(snapshot: &BoardSnapshot, cards: &[&Card]) -> Vec<ListRow> {
    let mut rows: Vec<ListRow> = snapshot
        .open_lists()
        .into_iter()
        .map(|l| ListRow {
            id: l.id.clone(),
            name: l.name.clone(),
            count: 0,
        })
        .collect();
    let index: HashMap<String, usize> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.clone(), i))
        .collect();

    for card in cards.iter().filter(|c| !c.closed) {
        if let Some(&i) = card.list_id.as_ref().and_then(|id| index.get(id)) {
            rows[i].count += 1;
        }
    }

    rows.sort_by_key(|r| std::cmp::Reverse(r.count));
    rows
}

/// Count open cards per owner.
///
/// A card with N assignees adds one to each of them; a card with none adds
/// one to `Unassigned`. Rows appear in first-encountered order before the
/// stable sort.
pub fn count_by_member(snapshot: &BoardSnapshot, cards: &[&Card]) -> Vec<MemberRow> {
    let mut order: Vec<MemberKey> = Vec::new();
    let mut counts: HashMap<MemberKey, usize> = HashMap::new();

    for card in cards.iter().filter(|c| !c.closed) {
        for key in card.owner_keys() {
            let count = counts.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                0
            });
            *count += 1;
        }
    }

    let mut rows: Vec<MemberRow> = order
        .into_iter()
        .map(|key| {
            let name = snapshot.member_key_name(&key);
            let initials = match key {
                MemberKey::Member(ref id) if snapshot.member(id).is_some() => initials_of(&name),
                _ => "—".to_string(),
            };
            MemberRow {
                count: counts.get(&key).copied().unwrap_or(0),
                key,
                name,
                initials,
            }
        })
        .collect();

    rows.sort_by_key(|r| std::cmp::Reverse(r.count));
    rows
}

/// Build the list × member matrix aligned with the two rankings.
pub fn heatmap(cards: &[&Card], list_rows: &[ListRow], member_rows: &[MemberRow]) -> Heatmap {
    let lists: Vec<String> = list_rows.iter().map(|r| r.id.clone()).collect();
    let members: Vec<MemberKey> = member_rows.iter().map(|r| r.key.clone()).collect();

    let row_index: HashMap<&str, usize> = lists
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let col_index: HashMap<&MemberKey, usize> =
        members.iter().enumerate().map(|(i, k)| (k, i)).collect();

    let mut cells = vec![vec![0usize; members.len()]; lists.len()];

    for card in cards.iter().filter(|c| !c.closed) {
        let Some(&row) = card.list_id.as_deref().and_then(|id| row_index.get(id)) else {
            continue;
        };
        for key in card.owner_keys() {
            if let Some(&col) = col_index.get(&key) {
                cells[row][col] += 1;
            }
        }
    }

    Heatmap {
        lists,
        members,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::{card, fixture_snapshot, list, member};

    fn scenario() -> (BoardSnapshot, Vec<Card>) {
        let snapshot = BoardSnapshot {
            lists: vec![list("A", "List A", 1.0)],
            members: vec![member("m1", "Ada Lovelace"), member("m2", "Grace Hopper")],
            ..Default::default()
        };
        let cards = vec![
            card("c1", "A", &["m1"]),
            card("c2", "A", &["m1", "m2"]),
            card("c3", "A", &[]),
        ];
        (snapshot, cards)
    }

    #[test]
    fn test_three_card_scenario() {
        let (snapshot, cards) = scenario();
        let refs: Vec<&Card> = cards.iter().collect();

        let lists = count_by_list(&snapshot, &refs);
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].count, 3);

        let members = count_by_member(&snapshot, &refs);
        let counts: Vec<(MemberKey, usize)> =
            members.iter().map(|r| (r.key.clone(), r.count)).collect();
        assert_eq!(
            counts,
            vec![
                (MemberKey::Member("m1".into()), 2),
                (MemberKey::Member("m2".into()), 1),
                (MemberKey::Unassigned, 1),
            ]
        );

        let heat = heatmap(&refs, &lists, &members);
        assert_eq!(heat.get("A", &MemberKey::Member("m1".into())), 2);
        assert_eq!(heat.get("A", &MemberKey::Member("m2".into())), 1);
        assert_eq!(heat.get("A", &MemberKey::Unassigned), 1);
        assert_eq!(heat.cells, vec![vec![2, 1, 1]]);
    }

    #[test]
    fn test_member_rows_names_and_initials() {
        let (snapshot, cards) = scenario();
        let refs: Vec<&Card> = cards.iter().collect();
        let members = count_by_member(&snapshot, &refs);

        assert_eq!(members[0].name, "Ada Lovelace");
        assert_eq!(members[0].initials, "AL");
        assert_eq!(members[2].name, "Unassigned");
        assert_eq!(members[2].initials, "—");
    }

    #[test]
    fn test_ties_keep_encounter_order() {
        let snapshot = BoardSnapshot {
            lists: vec![
                list("l1", "First", 1.0),
                list("l2", "Second", 2.0),
                list("l3", "Third", 3.0),
            ],
            ..Default::default()
        };
        let cards = vec![
            card("a", "l2", &["z"]),
            card("b", "l3", &["y"]),
            card("c", "l3", &["z"]),
            card("d", "l1", &["y"]),
        ];
        let refs: Vec<&Card> = cards.iter().collect();

        let lists: Vec<String> = count_by_list(&snapshot, &refs)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(lists, vec!["l3", "l1", "l2"]);

        let members: Vec<MemberKey> = count_by_member(&snapshot, &refs)
            .into_iter()
            .map(|r| r.key)
            .collect();
        assert_eq!(
            members,
            vec![MemberKey::Member("z".into()), MemberKey::Member("y".into())]
        );
    }

    #[test]
    fn test_unknown_member_display_name() {
        let snapshot = BoardSnapshot::default();
        let cards = vec![card("a", "l", &["ghost"])];
        let refs: Vec<&Card> = cards.iter().collect();
        let members = count_by_member(&snapshot, &refs);
        assert_eq!(members[0].name, "Unknown member");
        assert_eq!(members[0].initials, "—");
    }

    #[test]
    fn test_fixture_list_counts_skip_closed() {
        let snapshot = fixture_snapshot();
        let refs: Vec<&Card> = snapshot.cards.iter().collect();
        let rows = count_by_list(&snapshot, &refs);

        let counts: Vec<(&str, usize)> = rows.iter().map(|r| (r.name.as_str(), r.count)).collect();
        // c7 is closed, c8 sits in an archived list
        assert_eq!(counts, vec![("To Do", 3), ("Doing", 2), ("Done", 1)]);

        let open_cards = snapshot
            .cards
            .iter()
            .filter(|c| !c.closed)
            .filter(|c| c.list_id.as_deref().and_then(|id| snapshot.list(id)).is_some_and(|l| !l.closed))
            .count();
        assert_eq!(rows.iter().map(|r| r.count).sum::<usize>(), open_cards);
    }

    #[test]
    fn test_member_sum_fans_out() {
        let snapshot = fixture_snapshot();
        let refs: Vec<&Card> = snapshot.cards.iter().filter(|c| !c.closed).collect();
        let rows = count_by_member(&snapshot, &refs);
        let total: usize = rows.iter().map(|r| r.count).sum();

        assert!(total >= refs.len());
        // c2 has two assignees, everything else has at most one
        assert_eq!(total, refs.len() + 1);
    }

    #[test]
    fn test_heatmap_sums_match_rankings() {
        let snapshot = fixture_snapshot();
        // keep only cards in open lists so every owner lands in a heatmap row
        let refs: Vec<&Card> = snapshot.cards.iter().filter(|c| c.id != "c8").collect();
        let lists = count_by_list(&snapshot, &refs);
        let members = count_by_member(&snapshot, &refs);
        let heat = heatmap(&refs, &lists, &members);

        assert_eq!(heat.lists.len(), lists.len());
        assert_eq!(heat.members.len(), members.len());
        for (col, row) in members.iter().enumerate() {
            assert_eq!(heat.column_total(col), row.count);
        }

        let single_owner: Vec<&Card> = refs
            .iter()
            .copied()
            .filter(|c| c.member_ids.len() <= 1)
            .collect();
        let lists = count_by_list(&snapshot, &single_owner);
        let members = count_by_member(&snapshot, &single_owner);
        let heat = heatmap(&single_owner, &lists, &members);
        for (row, list) in lists.iter().enumerate() {
            assert_eq!(heat.row_total(row), list.count);
        }
    }

    #[test]
    fn test_heatmap_zero_fills() {
        let snapshot = fixture_snapshot();
        let refs: Vec<&Card> = snapshot.cards.iter().collect();
        let lists = count_by_list(&snapshot, &refs);
        let members = count_by_member(&snapshot, &refs);
        let heat = heatmap(&refs, &lists, &members);

        assert!(heat.cells.iter().all(|r| r.len() == members.len()));
        assert_eq!(heat.get("l-done", &MemberKey::Member("m-alan".into())), 0);
        assert_eq!(heat.max(), 2);
    }

    #[test]
    fn test_kpis() {
        let snapshot = fixture_snapshot();
        let k = kpis(&snapshot);
        assert_eq!(k.total_cards, 8);
        assert_eq!(k.unassigned_cards, 2);
        assert_eq!(k.lists, 4);
        assert_eq!(k.members, 3);
    }
}
