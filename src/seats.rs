//! Seat Allowance - Billable Users per Plan
//!
//! Seat counts are structured data. The legacy free-text form ("3 Power-User")
//! is still accepted when loading a table; a missing or unreadable count means
//! one seat, since it only drives the per-seat display breakdown.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

static LEADING_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)").expect("static seat-count pattern compiles"));

pub const DEFAULT_SEAT_COUNT: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawSeatAllowance")]
pub struct SeatAllowance {
    pub count: u32,
    pub label: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSeatAllowance {
    Structured {
        count: u32,
        #[serde(default)]
        label: String,
    },
    Text(String),
}

impl From<RawSeatAllowance> for SeatAllowance {
    fn from(raw: RawSeatAllowance) -> Self {
        match raw {
            RawSeatAllowance::Structured { count, label } => Self {
                count: count.max(DEFAULT_SEAT_COUNT),
                label,
            },
            RawSeatAllowance::Text(text) => Self::parse(&text),
        }
    }
}

impl SeatAllowance {
    pub fn new(count: u32, label: impl Into<String>) -> Self {
        Self {
            count: count.max(DEFAULT_SEAT_COUNT),
            label: label.into(),
        }
    }

    /// Build from a legacy "<N> <description>" string.
    pub fn parse(text: &str) -> Self {
        let count = parse_seat_count(text);
        let label = LEADING_COUNT.replace(text, "").trim().to_string();
        Self { count, label }
    }
}

impl Default for SeatAllowance {
    fn default() -> Self {
        Self::new(DEFAULT_SEAT_COUNT, "")
    }
}

/// Read the leading integer of a seat description, falling back to one seat.
pub fn parse_seat_count(text: &str) -> u32 {
    let parsed = LEADING_COUNT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|n| *n > 0);

    match parsed {
        Some(n) => n,
        None => {
            warn!(seats = text, "malformed seat count, defaulting to one seat");
            DEFAULT_SEAT_COUNT
        }
    }
}
