//! Ranking of records inside a duplicate group by information density and recency.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::CompletenessWeights;
use crate::model::{Field, Record};

/// Sum of field weights over the fields that are non-empty after trimming.
pub fn completeness(record: &Record, weights: &CompletenessWeights) -> u32 {
    Field::ALL
        .iter()
        .filter(|f| record.has(**f))
        .map(|f| weights.weight(*f))
        .sum()
}

static DAY_MONTH_YEAR_SLASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})").expect("valid date pattern"));
static YEAR_MONTH_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})").expect("valid date pattern"));
static DAY_MONTH_YEAR_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})-(\d{1,2})-(\d{4})").expect("valid date pattern"));

/// Best-effort date parse. Tries `D/M/Y`, then `Y-M-D`, then `D-M-Y`; any
/// trailing time component is ignored.
///
/// `01/03/2024` is always read as 1 March: slash dates are assumed
/// day-first and month-first input is not detected. Unparseable or absent
/// values map to [`NaiveDate::MIN`] so they sort as the oldest.
pub fn parse_date(value: &str) -> NaiveDate {
    let value = value.trim();

    day_first(&DAY_MONTH_YEAR_SLASH, value)
        .or_else(|| {
            YEAR_MONTH_DAY.captures(value).and_then(|c| {
                ymd(
                    c.get(1)?.as_str(),
                    c.get(2)?.as_str(),
                    c.get(3)?.as_str(),
                )
            })
        })
        .or_else(|| day_first(&DAY_MONTH_YEAR_DASH, value))
        .unwrap_or(NaiveDate::MIN)
}

fn day_first(re: &Regex, value: &str) -> Option<NaiveDate> {
    let c = re.captures(value)?;
    ymd(
        c.get(3)?.as_str(),
        c.get(2)?.as_str(),
        c.get(1)?.as_str(),
    )
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}
