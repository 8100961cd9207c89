//! Trello board analytics.
//!
//! Reads a board (lists, cards, members) either straight from the Trello
//! REST API or through the board proxy in [`server`], applies the
//! dashboard filters and derives every aggregate in [`analysis`]. The
//! [`report`] module turns the result into Markdown, a weekly digest, or
//! JSON/CSV exports.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod params;
pub mod report;
pub mod server;
pub mod source;
