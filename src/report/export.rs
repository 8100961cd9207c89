//! JSON and CSV exports of the filtered card set.

use crate::models::{BoardSnapshot, Card};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One flattened card, as written to an export file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub id: String,
    pub title: String,
    /// List name, or the raw list id when the list is unknown.
    pub list: String,
    /// Comma-joined label names.
    pub labels: String,
    /// Comma-joined member display names.
    pub members: String,
    /// Due date exactly as received, or empty.
    pub due: String,
    pub link: String,
}

impl ExportRecord {
    fn cells(&self) -> [&str; 7] {
        [
            &self.id,
            &self.title,
            &self.list,
            &self.labels,
            &self.members,
            &self.due,
            &self.link,
        ]
    }
}

/// Export file kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv;charset=utf-8",
        }
    }
}

/// Language of the CSV header row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportLocale {
    #[default]
    English,
    Portuguese,
}

impl ExportLocale {
    /// Header names, in record field order.
    pub fn headers(&self) -> [&'static str; 7] {
        match self {
            ExportLocale::English => ["ID", "Title", "List", "Labels", "Members", "Due", "Link"],
            ExportLocale::Portuguese => [
                "ID",
                "Título",
                "Lista",
                "Labels",
                "Membros",
                "Vencimento",
                "Link",
            ],
        }
    }
}

/// Flatten cards into export records, preserving order.
pub fn export_records(snapshot: &BoardSnapshot, cards: &[&Card]) -> Vec<ExportRecord> {
    cards
        .iter()
        .map(|c| ExportRecord {
            id: c.id.clone(),
            title: c.title.clone(),
            list: c
                .list_id
                .as_deref()
                .map(|id| snapshot.list_name(id).to_string())
                .unwrap_or_default(),
            labels: c
                .labels
                .iter()
                .map(|l| l.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            members: c
                .member_ids
                .iter()
                .map(|m| snapshot.member_name(m))
                .collect::<Vec<_>>()
                .join(", "),
            due: c.due_raw.clone().unwrap_or_default(),
            link: c.link.clone().unwrap_or_default(),
        })
        .collect()
}

/// Pretty-printed JSON array of records.
pub fn to_json(records: &[ExportRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("Failed to serialize JSON export")
}

/// CSV with a header row; every cell quoted, newlines flattened to spaces.
///
/// An empty record set produces an empty string.
pub fn to_csv(records: &[ExportRecord], locale: ExportLocale) -> Result<String> {
    if records.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(locale.headers())
        .context("Failed to write CSV header")?;
    for record in records {
        let cells = record.cells().map(flatten_newlines);
        writer
            .write_record(&cells)
            .with_context(|| format!("Failed to write CSV row for card {}", record.id))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV export: {}", e.error()))?;
    let mut text = String::from_utf8(bytes).context("CSV export is not valid UTF-8")?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

fn flatten_newlines(value: &str) -> String {
    value.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Download file name, e.g. `trello-report-1710504000000.csv`.
pub fn export_filename(format: ExportFormat, now: DateTime<Utc>) -> String {
    format!("trello-report-{}.{}", now.timestamp_millis(), format.extension())
}
