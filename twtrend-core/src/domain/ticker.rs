//! Security identifiers and resolved tickers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange listing code, e.g. `2330` or `00878`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityCode(String);

impl SecurityCode {
    /// Trimmed code, or `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upstream symbol for this code, e.g. `2330` + `.TW`.
    pub fn provider_symbol(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.0)
    }
}

impl From<&str> for SecurityCode {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

impl fmt::Display for SecurityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Parse user input such as `"006208, 2317,,2353 "` into codes, keeping order.
pub fn parse_code_list(input: &str) -> Vec<SecurityCode> {
    input
        .split(|c: char| c == ',' || c == '，' || c.is_whitespace())
        .filter_map(SecurityCode::parse)
        .collect()
}

/// A code whose name is resolved and whose quote fetch returned data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidTicker {
    pub code: SecurityCode,
    pub name: String,
}

impl ValidTicker {
    pub fn new(code: SecurityCode, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
        }
    }

    /// Column label used by tables and charts: `"2330 台積電"`.
    pub fn label(&self) -> String {
        format!("{} {}", self.code, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_codes_are_dropped() {
        let codes = parse_code_list(" 006208, 2317,, 2353 ,00893");
        let raw: Vec<&str> = codes.iter().map(|c| c.as_str()).collect();
        assert_eq!(raw, vec!["006208", "2317", "2353", "00893"]);
    }

    #[test]
    fn fullwidth_comma_and_spaces_split() {
        let codes = parse_code_list("2330，2317 2454");
        assert_eq!(codes.len(), 3);
    }

    #[test]
    fn provider_symbol_appends_suffix() {
        let code = SecurityCode::from("2330");
        assert_eq!(code.provider_symbol(".TW"), "2330.TW");
    }

    #[test]
    fn label_joins_code_and_name() {
        let t = ValidTicker::new("2330".into(), "台積電");
        assert_eq!(t.label(), "2330 台積電");
    }
}
