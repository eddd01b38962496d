use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

/// Aggregation granularity requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Monthly,
    Weekly,
}

impl Period {
    /// Parse the `period` query parameter.
    ///
    /// Anything other than `monthly` or `weekly` (including a missing value)
    /// falls back to `Monthly` rather than being rejected.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some("weekly") => Self::Weekly,
            _ => Self::Monthly,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Weekly => "weekly",
        }
    }
}

/// Parse a reference date in strict `YYYY-MM-DD` form.
///
/// Returns `None` for anything chrono would otherwise accept loosely, such as
/// unpadded months or trailing characters.
pub fn parse_reference_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// An ordered, contiguous, non-empty run of calendar dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    days: u32,
}

impl DateWindow {
    pub const fn first(&self) -> NaiveDate {
        self.start
    }

    pub fn last(&self) -> NaiveDate {
        self.start + Days::new(u64::from(self.days - 1))
    }

    pub const fn len(&self) -> usize {
        self.days as usize
    }

    pub const fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take(self.len())
    }

    pub fn to_vec(&self) -> Vec<NaiveDate> {
        self.iter().collect()
    }
}

/// Resolve the window of dates covered by `period` around `reference`.
///
/// Weekly windows start on the Monday of the ISO week containing `reference`;
/// monthly windows cover the whole calendar month.
pub fn resolve(reference: NaiveDate, period: Period) -> DateWindow {
    match period {
        Period::Weekly => {
            let offset = reference.weekday().num_days_from_monday();
            DateWindow {
                start: reference - Days::new(u64::from(offset)),
                days: 7,
            }
        }
        Period::Monthly => {
            let start = reference.with_day(1).unwrap_or(reference);
            DateWindow {
                start,
                days: days_in_month(start.year(), start.month()),
            }
        }
    }
}

/// Number of days in the given month, accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(31, |d| d.day())
}
