//! Report generation: Markdown dashboards, weekly digests and exports.

pub mod digest;
pub mod export;
pub mod markdown;

pub use digest::{digest_title, mailto_link, weekly_digest};
pub use export::{export_filename, export_records, to_csv, to_json, ExportFormat, ExportLocale};
pub use markdown::{generate_markdown_report, ReportHeader};
