//! Dashboard query parameters.
//!
//! The dashboard is configured entirely by its URL query string:
//! `boardId`, `mode`, `access`, `manager`, `reportName`, `logo`,
//! `logoSize` and `logoMaxW`.

use crate::error::ParamError;
use chrono::NaiveDate;
use url::Url;

/// Logo shown when the query string names none.
pub const DEFAULT_LOGO: &str = "/logo.png";

/// Logo height on wide screens.
pub const DEFAULT_LOGO_SIZE: u32 = 48;

/// Logo height on narrow screens.
pub const DEFAULT_MOBILE_LOGO_SIZE: u32 = 28;

/// Maximum logo width.
pub const DEFAULT_LOGO_MAX_WIDTH: u32 = 220;

/// Parsed dashboard parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardParams {
    pub board_id: Option<String>,
    /// `mode=public` was requested explicitly.
    pub force_public: bool,
    pub access: Option<String>,
    /// Digest recipient.
    pub manager: Option<String>,
    pub report_name: Option<String>,
    pub logo: String,
    pub logo_size: Option<u32>,
    pub logo_max_width: u32,
}

impl Default for DashboardParams {
    fn default() -> Self {
        Self {
            board_id: None,
            force_public: false,
            access: None,
            manager: None,
            report_name: None,
            logo: DEFAULT_LOGO.to_string(),
            logo_size: None,
            logo_max_width: DEFAULT_LOGO_MAX_WIDTH,
        }
    }
}

impl DashboardParams {
    /// Parse a query string (`a=1&b=2`, with or without a leading `?`) or a
    /// full dashboard URL. Unknown keys are ignored; empty values count as
    /// absent; invalid numbers fall back to defaults.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let query = if input.contains("://") {
            Url::parse(input)
                .ok()
                .and_then(|u| u.query().map(str::to_string))
                .unwrap_or_default()
        } else {
            input.trim_start_matches('?').to_string()
        };

        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "boardId" => params.board_id = Some(value),
                "mode" => params.force_public = value.eq_ignore_ascii_case("public"),
                "access" => params.access = Some(value),
                "manager" => params.manager = Some(value),
                "reportName" => params.report_name = Some(value),
                "logo" => params.logo = value,
                "logoSize" => params.logo_size = positive_number(&value),
                "logoMaxW" => {
                    params.logo_max_width =
                        positive_number(&value).unwrap_or(DEFAULT_LOGO_MAX_WIDTH)
                }
                _ => {}
            }
        }
        params
    }

    /// Whether data should come from the public proxy.
    pub fn public_mode(&self) -> bool {
        self.force_public || self.board_id.is_some()
    }

    /// Logo height, defaulting by screen class.
    pub fn logo_size(&self, narrow: bool) -> u32 {
        self.logo_size.unwrap_or(if narrow {
            DEFAULT_MOBILE_LOGO_SIZE
        } else {
            DEFAULT_LOGO_SIZE
        })
    }
}

fn positive_number(value: &str) -> Option<u32> {
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 1.0)
        .map(|n| n as u32)
}

/// Parse a `YYYY-MM-DD` due-date bound.
pub fn parse_date(name: &'static str, value: &str) -> Result<NaiveDate, ParamError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ParamError::InvalidDate {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_string() {
        let params = DashboardParams::parse(
            "?boardId=CUUp9Mv3&mode=PUBLIC&access=devtoken&manager=lead%40example.com&reportName=Ops+Weekly&logoSize=64&logoMaxW=300",
        );
        assert_eq!(params.board_id.as_deref(), Some("CUUp9Mv3"));
        assert!(params.force_public);
        assert_eq!(params.access.as_deref(), Some("devtoken"));
        assert_eq!(params.manager.as_deref(), Some("lead@example.com"));
        assert_eq!(params.report_name.as_deref(), Some("Ops Weekly"));
        assert_eq!(params.logo, DEFAULT_LOGO);
        assert_eq!(params.logo_size(false), 64);
        assert_eq!(params.logo_max_width, 300);
    }

    #[test]
    fn test_parse_full_url() {
        let params = DashboardParams::parse(
            "https://trello-reports.example.com/index.html?boardId=b1&logo=https%3A%2F%2Fcdn.example.com%2Flogo.svg",
        );
        assert_eq!(params.board_id.as_deref(), Some("b1"));
        assert_eq!(params.logo, "https://cdn.example.com/logo.svg");
        assert!(!params.force_public);
        assert!(params.public_mode());
    }

    #[test]
    fn test_defaults_and_bad_numbers() {
        let params = DashboardParams::parse("logoSize=abc&logoMaxW=0&boardId=");
        assert_eq!(params.board_id, None);
        assert!(!params.public_mode());
        assert_eq!(params.logo_size(false), DEFAULT_LOGO_SIZE);
        assert_eq!(params.logo_size(true), DEFAULT_MOBILE_LOGO_SIZE);
        assert_eq!(params.logo_max_width, DEFAULT_LOGO_MAX_WIDTH);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("due-from", "2024-01-31"),
            Ok(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
        assert!(matches!(
            parse_date("due-to", "31/01/2024"),
            Err(ParamError::InvalidDate { name: "due-to", .. })
        ));
    }
}
