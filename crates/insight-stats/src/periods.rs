//! Period bucketing for time series statistics
//!
//! A series covers a bounded date range split into day, month, quarter or year
//! periods. When the caller leaves the range open, it is closed around today
//! with a maximum number of periods (chunks), looking backward by default.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::prelude::*;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregatePeriod {
	Day,
	Month,
	Quarter,
	Year,
}

impl AggregatePeriod {
	pub const ALL: [AggregatePeriod; 4] =
		[AggregatePeriod::Day, AggregatePeriod::Month, AggregatePeriod::Quarter, AggregatePeriod::Year];

	pub fn as_str(self) -> &'static str {
		match self {
			AggregatePeriod::Day => "day",
			AggregatePeriod::Month => "month",
			AggregatePeriod::Quarter => "quarter",
			AggregatePeriod::Year => "year",
		}
	}

	pub fn parse(raw: &str) -> ClResult<AggregatePeriod> {
		AggregatePeriod::ALL.into_iter().find(|period| period.as_str() == raw).ok_or_else(|| {
			Error::invalid_input(
				format!("Invalid aggregate_period: {}", raw),
				serde_json::json!({ "aggregate_period": raw }),
			)
		})
	}

	/// Chunks used when the caller asks for the default (0)
	pub fn default_max_chunks(self) -> i64 {
		match self {
			AggregatePeriod::Day => 365,
			AggregatePeriod::Month => 12,
			AggregatePeriod::Quarter => 4,
			AggregatePeriod::Year => 1,
		}
	}

	fn months(self) -> u32 {
		match self {
			AggregatePeriod::Day => 0,
			AggregatePeriod::Month => 1,
			AggregatePeriod::Quarter => 3,
			AggregatePeriod::Year => 12,
		}
	}

	/// `2024-03-05`, `2024-03`, `2024-Q1` or `2024`
	pub fn label(self, date: NaiveDate) -> String {
		match self {
			AggregatePeriod::Day => date.format(DATE_FORMAT).to_string(),
			AggregatePeriod::Month => date.format("%Y-%m").to_string(),
			AggregatePeriod::Quarter => format!("{}-Q{}", date.year(), (date.month() - 1) / 3 + 1),
			AggregatePeriod::Year => date.year().to_string(),
		}
	}

	/// First day of the period holding `date`
	pub fn start_of(self, date: NaiveDate) -> NaiveDate {
		let first = match self {
			AggregatePeriod::Day => Some(date),
			AggregatePeriod::Month => date.with_day(1),
			AggregatePeriod::Quarter => NaiveDate::from_ymd_opt(date.year(), (date.month() - 1) / 3 * 3 + 1, 1),
			AggregatePeriod::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1),
		};
		first.unwrap_or(date)
	}

	/// First day of the period after the one holding `date`
	pub fn next(self, date: NaiveDate) -> NaiveDate {
		self.shift(self.start_of(date), 1, false).unwrap_or(NaiveDate::MAX)
	}

	fn shift(self, date: NaiveDate, chunks: u32, backward: bool) -> Option<NaiveDate> {
		match (self, backward) {
			(AggregatePeriod::Day, false) => date.checked_add_days(Days::new(chunks.into())),
			(AggregatePeriod::Day, true) => date.checked_sub_days(Days::new(chunks.into())),
			(_, false) => date.checked_add_months(Months::new(chunks.saturating_mul(self.months()))),
			(_, true) => date.checked_sub_months(Months::new(chunks.saturating_mul(self.months()))),
		}
	}

	/// Far end of a range of `max_chunks` periods starting (or, when `backward`,
	/// ending) at `point`. 0 means the default count, negative means no limit.
	pub fn range_end(self, point: NaiveDate, backward: bool, max_chunks: i64) -> Option<NaiveDate> {
		let mut chunks = if max_chunks == 0 { self.default_max_chunks() } else { max_chunks };
		if chunks <= 0 {
			return None;
		}
		if backward {
			chunks -= 1;
		}
		let chunks = u32::try_from(chunks).unwrap_or(u32::MAX);
		let point = self.start_of(point);

		if backward {
			self.shift(point, chunks, true).or(Some(NaiveDate::MIN))
		} else {
			self.shift(point, chunks, false).and_then(|end| end.pred_opt()).or(Some(NaiveDate::MAX))
		}
	}
}

/// Date range settings of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodQuery {
	pub period: AggregatePeriod,
	pub date_from: Option<NaiveDate>,
	pub date_to: Option<NaiveDate>,
	pub favors_backward: bool,
	pub max_chunks: i64,
}

impl PeriodQuery {
	pub fn new(period: AggregatePeriod) -> Self {
		PeriodQuery { period, date_from: None, date_to: None, favors_backward: true, max_chunks: 0 }
	}

	/// Inclusive range to query, as of `today`.
	///
	/// Reversed bounds are swapped. A range longer than the chunk limit is cut
	/// on the side opposite to the favored direction.
	pub fn resolve(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
		let (mut from, mut to) = match (self.date_from, self.date_to) {
			(Some(from), Some(to)) if to < from => (Some(to), Some(from)),
			bounds => bounds,
		};
		if from.is_none() && to.is_none() && self.max_chunks >= 0 {
			if self.favors_backward {
				to = Some(today);
			} else {
				from = Some(today);
			}
		}

		let calc_from = to.and_then(|to| self.period.range_end(to, true, self.max_chunks));
		let calc_to = from.and_then(|from| self.period.range_end(from, false, self.max_chunks));

		match (from, to) {
			(Some(f), Some(t)) => {
				if self.favors_backward {
					if let Some(calc) = calc_from.filter(|calc| *calc > f) {
						from = Some(calc);
					}
				} else if let Some(calc) = calc_to.filter(|calc| *calc < t) {
					to = Some(calc);
				}
			}
			(None, Some(_)) => from = calc_from,
			(Some(_), None) => to = calc_to,
			(None, None) => {}
		}
		(from, to)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCount {
	pub label: String,
	pub value: u64,
}

/// Adds a zero entry for every period of the range without data. The result is
/// ordered by label. Open ranges are left as they are.
pub fn fill_missing_periods(
	period: AggregatePeriod,
	data: Vec<PeriodCount>,
	from: Option<NaiveDate>,
	to: Option<NaiveDate>,
) -> Vec<PeriodCount> {
	let (Some(from), Some(to)) = (from, to) else {
		return data;
	};
	let mut values: BTreeMap<String, u64> = data.into_iter().map(|item| (item.label, item.value)).collect();

	let mut date = from;
	while date <= to {
		values.entry(period.label(date)).or_insert(0);
		let next = period.next(date);
		if next <= date {
			break;
		}
		date = next;
	}
	values.into_iter().map(|(label, value)| PeriodCount { label, value }).collect()
}

/// Parses a `YYYY-MM-DD` query parameter
pub fn parse_date(name: &str, raw: &str) -> ClResult<NaiveDate> {
	NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
		Error::invalid_input(
			"Invalid dates. You must provide a valid date_from and date_to formatted as YYYY-MM-DD",
			serde_json::json!({ name: raw }),
		)
	})
}


// vim: ts=4
