//! Dashboard aggregation.
//!
//! `Dashboard::compute` derives every chart and table from a snapshot and a
//! filter in one pure call. Nothing is cached; a new filter means a new
//! `Dashboard`.

mod aggregator;
mod timeseries;

pub use aggregator::*;
pub use timeseries::*;

use crate::filter::{filter_cards, label_catalog, FilterState};
use crate::models::{BoardSnapshot, Card, Label};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inputs to a dashboard computation besides the data itself.
#[derive(Debug, Clone, Copy)]
pub struct DashboardOptions {
    /// Reference instant for the trend window.
    pub now: DateTime<Utc>,
    pub series_mode: SeriesMode,
}

impl DashboardOptions {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            series_mode: SeriesMode::Monthly,
        }
    }
}

/// Everything the dashboard shows for one (snapshot, filter) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub generated_at: DateTime<Utc>,
    pub kpis: Kpis,
    /// Cards passing the filter, closed ones included.
    pub matched_cards: usize,
    pub active_filters: usize,
    pub lists: Vec<ListRow>,
    pub members: Vec<MemberRow>,
    pub heatmap: Heatmap,
    pub series_mode: SeriesMode,
    pub monthly: Vec<MonthPoint>,
    pub trend: Trend,
    /// Filter choices for labels.
    pub labels: Vec<Label>,
}

impl Dashboard {
    /// Compute the full dashboard.
    pub fn compute(
        snapshot: &BoardSnapshot,
        filter: &FilterState,
        options: DashboardOptions,
    ) -> Self {
        let cards: Vec<&Card> = filter_cards(&snapshot.cards, filter);

        let lists = count_by_list(snapshot, &cards);
        let members = count_by_member(snapshot, &cards);
        let heatmap = heatmap(&cards, &lists, &members);

        Self {
            generated_at: options.now,
            kpis: kpis(snapshot),
            matched_cards: cards.len(),
            active_filters: filter.active_count(),
            monthly: monthly_series(&cards, options.series_mode),
            trend: daily_trend(snapshot, &cards, options.now.date_naive()),
            series_mode: options.series_mode,
            labels: label_catalog(&snapshot.cards),
            lists,
            members,
            heatmap,
        }
    }
}
