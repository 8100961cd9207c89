//! Activity time series.
//!
//! Both series key off a card's last-activity timestamp; cards without one
//! are skipped. Calendar buckets are computed in UTC.

use crate::models::{BoardSnapshot, Card};
use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Number of calendar days in the activity trend window.
pub const TREND_DAYS: usize = 14;

/// Number of lists charted in the activity trend.
pub const TREND_TOP_LISTS: usize = 3;

/// How monthly buckets are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesMode {
    /// Raw count per month
    #[default]
    Monthly,
    /// Running total from the first month
    Cumulative,
}

/// One monthly bucket; `month` is `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthPoint {
    pub month: String,
    pub value: usize,
}

/// Daily counts for one list across the trend window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub list_id: String,
    pub name: String,
    /// One value per entry of `Trend::days`.
    pub points: Vec<usize>,
}

impl TrendSeries {
    pub fn total(&self) -> usize {
        self.points.iter().sum()
    }
}

/// Zero-filled day × list activity grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trend {
    pub days: Vec<NaiveDate>,
    pub series: Vec<TrendSeries>,
}

fn month_key(ts: &DateTime<Utc>) -> String {
    format!("{}-{:02}", ts.year(), ts.month())
}

/// Bucket cards by the month of their last activity, oldest first.
pub fn monthly_series(cards: &[&Card], mode: SeriesMode) -> Vec<MonthPoint> {
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
    for ts in cards.iter().filter_map(|c| c.last_activity.as_ref()) {
        *buckets.entry(month_key(ts)).or_default() += 1;
    }

    let mut running = 0;
    buckets
        .into_iter()
        .map(|(month, value)| {
            let value = match mode {
                SeriesMode::Monthly => value,
                SeriesMode::Cumulative => {
                    running += value;
                    running
                }
            };
            MonthPoint { month, value }
        })
        .collect()
}

/// The trend window: `TREND_DAYS` consecutive dates ending on `today`.
pub fn trend_window(today: NaiveDate) -> Vec<NaiveDate> {
    (0..TREND_DAYS as i64)
        .rev()
        .map(|back| today - TimeDelta::days(back))
        .collect()
}

/// Per-list daily activity for the busiest lists of the last two weeks.
///
/// Candidate lists are those of the filtered cards, in encounter order.
/// The `TREND_TOP_LISTS` candidates with the highest window totals are
/// kept; ties go to the list seen first. The grid is always
/// `TREND_DAYS` long and zero-filled.
pub fn daily_trend(snapshot: &BoardSnapshot, cards: &[&Card], today: NaiveDate) -> Trend {
    let days = trend_window(today);
    let day_index: HashMap<NaiveDate, usize> =
        days.iter().enumerate().map(|(i, d)| (*d, i)).collect();

    let mut candidates: Vec<&str> = Vec::new();
    let mut grid: HashMap<&str, Vec<usize>> = HashMap::new();

    for card in cards {
        let Some(list_id) = card.list_id.as_deref() else {
            continue;
        };
        let points = grid.entry(list_id).or_insert_with(|| {
            candidates.push(list_id);
            vec![0; TREND_DAYS]
        });

        let day = card
            .last_activity
            .map(|ts| ts.date_naive())
            .and_then(|d| day_index.get(&d));
        if let Some(&i) = day {
            points[i] += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = candidates
        .iter()
        .map(|id| (*id, grid[id].iter().sum()))
        .collect();
    ranked.sort_by_key(|(_, total)| std::cmp::Reverse(*total));
    ranked.truncate(TREND_TOP_LISTS);

    let series = ranked
        .into_iter()
        .map(|(id, _)| TrendSeries {
            list_id: id.to_string(),
            name: snapshot.list_name(id).to_string(),
            points: grid.remove(id).unwrap_or_else(|| vec![0; TREND_DAYS]),
        })
        .collect();

    Trend { days, series }
}
