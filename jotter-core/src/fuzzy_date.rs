//! Fuzzy calendar-date extraction from free text.
//!
//! Deterministic: regex + chrono, no LLM. Every relative form resolves against
//! an anchor date, and missing components (year, month) come from the anchor.
//!
//! Recognised, in order of preference:
//! 1. ISO dates: `2026-06-14`, `2026/06/14`, `2026-06-14T09:00:00`
//! 2. `today`, `tonight`, `tomorrow`, `yesterday`, `day after tomorrow`
//! 3. `in 3 days`, `in two weeks`, `a month ago`, `next week`, `next month`
//! 4. weekdays: `friday`, `this friday`, `next friday`, `last friday`
//! 5. month names: `June 14`, `14th of June`, `Jun 14, 2027`
//! 6. US numeric: `6/14`, `6/14/2027`
//! 7. ordinal day of the anchor's month: `the 15th`
//!
//! Bare integers ("buy 2 apples") never produce a date, and neither do
//! fractions in front of a unit ("1/2 cup sugar").
//!
//! When the text names several relative days ("started yesterday, finish by
//! tomorrow") the latest one wins.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use regex::Regex;

const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

const WEEKDAYS: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";

// A numeric `a/b` followed by one of these is a quantity, not a date.
const MEASURE_WORDS: &[&str] = &[
    "c", "cup", "cups", "tsp", "tsps", "teaspoon", "teaspoons", "tbsp", "tbsps", "tablespoon",
    "tablespoons", "oz", "ounce", "ounces", "lb", "lbs", "pound", "pounds", "g", "gram", "grams",
    "kg", "kilo", "kilos", "mg", "ml", "l", "liter", "liters", "litre", "litres", "gal", "gallon",
    "gallons", "qt", "quart", "quarts", "pt", "pint", "pints", "inch", "inches", "ft", "foot",
    "feet", "cm", "mm", "km", "mi", "mile", "miles", "hr", "hrs", "hour", "hours", "min", "mins",
    "minute", "minutes", "stick", "sticks", "can", "cans", "slice", "slices", "dozen", "of",
];

const COUNT_WORDS: &str = r"\d{1,3}|a|an|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve";

#[derive(Debug, Clone)]
pub struct DateParser {
    iso: Regex,
    relative_day: Regex,
    offset_ahead: Regex,
    offset_ago: Regex,
    next_span: Regex,
    weekday: Regex,
    month_day: Regex,
    day_month: Regex,
    numeric: Regex,
    ordinal: Regex,
}

impl DateParser {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            iso: Regex::new(r"\b(?P<y>\d{4})[-/](?P<m>\d{1,2})[-/](?P<d>\d{1,2})")?,
            relative_day: Regex::new(
                r"\b(?P<w>day after tomorrow|tomorrow|tmrw|tonight|today|yesterday)\b",
            )?,
            offset_ahead: Regex::new(&format!(
                r"\bin\s+(?P<n>{COUNT_WORDS})\s+(?P<unit>days?|weeks?|months?)\b"
            ))?,
            offset_ago: Regex::new(&format!(
                r"\b(?P<n>{COUNT_WORDS})\s+(?P<unit>days?|weeks?|months?)\s+ago\b"
            ))?,
            next_span: Regex::new(r"\bnext\s+(?P<unit>week|month)\b")?,
            weekday: Regex::new(&format!(
                r"\b(?:(?P<rel>next|last|this|coming)\s+)?(?P<wd>{WEEKDAYS})\b"
            ))?,
            month_day: Regex::new(&format!(
                r"\b(?P<mon>{MONTHS})\.?\s+(?P<d>\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(?P<y>\d{{4}})\b)?"
            ))?,
            day_month: Regex::new(&format!(
                r"\b(?P<d>\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?(?P<mon>{MONTHS})\b\.?(?:,?\s+(?P<y>\d{{4}})\b)?"
            ))?,
            numeric: Regex::new(
                r"\b(?P<m>\d{1,2})/(?P<d>\d{1,2})(?:/(?P<y>\d{4}|\d{2}))?\b(?:\s+(?P<next>[a-z]+))?",
            )?,
            ordinal: Regex::new(r"\bthe\s+(?P<d>\d{1,2})(?:st|nd|rd|th)\b")?,
        })
    }

    /// Extract a date from `text`, resolving relative parts against `anchor`.
    pub fn parse(&self, text: &str, anchor: NaiveDate) -> Option<NaiveDate> {
        let t = text.to_lowercase();

        self.parse_iso(&t)
            .or_else(|| self.parse_relative_day(&t, anchor))
            .or_else(|| self.parse_offset(&t, anchor))
            .or_else(|| self.parse_weekday(&t, anchor))
            .or_else(|| self.parse_month_name(&t, anchor))
            .or_else(|| self.parse_numeric(&t, anchor))
            .or_else(|| self.parse_ordinal(&t, anchor))
    }

    fn parse_iso(&self, t: &str) -> Option<NaiveDate> {
        let caps = self.iso.captures(t)?;
        NaiveDate::from_ymd_opt(
            caps["y"].parse().ok()?,
            caps["m"].parse().ok()?,
            caps["d"].parse().ok()?,
        )
    }

    fn parse_relative_day(&self, t: &str, anchor: NaiveDate) -> Option<NaiveDate> {
        self.relative_day
            .captures_iter(t)
            .filter_map(|caps| match &caps["w"] {
                "today" | "tonight" => Some(anchor),
                "tomorrow" | "tmrw" => anchor.checked_add_days(Days::new(1)),
                "day after tomorrow" => anchor.checked_add_days(Days::new(2)),
                "yesterday" => anchor.checked_sub_days(Days::new(1)),
                _ => None,
            })
            .max()
    }

    fn parse_offset(&self, t: &str, anchor: NaiveDate) -> Option<NaiveDate> {
        if let Some(caps) = self.offset_ahead.captures(t) {
            let n = parse_count(&caps["n"])?;
            return shift(anchor, n, &caps["unit"], true);
        }
        if let Some(caps) = self.offset_ago.captures(t) {
            let n = parse_count(&caps["n"])?;
            return shift(anchor, n, &caps["unit"], false);
        }
        let caps = self.next_span.captures(t)?;
        shift(anchor, 1, &caps["unit"], true)
    }

    fn parse_weekday(&self, t: &str, anchor: NaiveDate) -> Option<NaiveDate> {
        let caps = self.weekday.captures(t)?;
        let target: Weekday = caps["wd"].parse().ok()?;
        let today = i64::from(anchor.weekday().num_days_from_monday());
        let want = i64::from(target.num_days_from_monday());

        let delta = match caps.name("rel").map(|m| m.as_str()) {
            // Same weekday in the following Monday-started week.
            Some("next") => (7 - today) + want,
            // Most recent occurrence strictly before the anchor.
            Some("last") => {
                let back = (today - want).rem_euclid(7);
                -(if back == 0 { 7 } else { back })
            }
            // Next occurrence on or after the anchor.
            _ => (want - today).rem_euclid(7),
        };

        add_signed_days(anchor, delta)
    }

    fn parse_month_name(&self, t: &str, anchor: NaiveDate) -> Option<NaiveDate> {
        let caps = self
            .month_day
            .captures(t)
            .or_else(|| self.day_month.captures(t))?;
        let month = month_number(&caps["mon"])?;
        let day: u32 = caps["d"].parse().ok()?;
        let year = match caps.name("y") {
            Some(y) => y.as_str().parse().ok()?,
            None => anchor.year(),
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }

    fn parse_numeric(&self, t: &str, anchor: NaiveDate) -> Option<NaiveDate> {
        let caps = self.numeric.captures_iter(t).find(|caps| {
            !caps
                .name("next")
                .is_some_and(|w| MEASURE_WORDS.contains(&w.as_str()))
        })?;
        let month: u32 = caps["m"].parse().ok()?;
        let day: u32 = caps["d"].parse().ok()?;
        let year = match caps.name("y") {
            Some(y) if y.as_str().len() == 2 => 2000 + y.as_str().parse::<i32>().ok()?,
            Some(y) => y.as_str().parse().ok()?,
            None => anchor.year(),
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }

    fn parse_ordinal(&self, t: &str, anchor: NaiveDate) -> Option<NaiveDate> {
        let caps = self.ordinal.captures(t)?;
        let day: u32 = caps["d"].parse().ok()?;
        NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), day)
    }
}

/// One-shot convenience wrapper around [`DateParser`].
pub fn parse_fuzzy_date(text: &str, anchor: NaiveDate) -> Option<NaiveDate> {
    DateParser::new().ok()?.parse(text, anchor)
}

fn parse_count(s: &str) -> Option<u32> {
    let n = match s {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        digits => digits.parse().ok()?,
    };
    Some(n)
}

fn shift(anchor: NaiveDate, n: u32, unit: &str, forward: bool) -> Option<NaiveDate> {
    match unit.trim_end_matches('s') {
        "day" => step_days(anchor, u64::from(n), forward),
        "week" => step_days(anchor, u64::from(n) * 7, forward),
        "month" if forward => anchor.checked_add_months(Months::new(n)),
        "month" => anchor.checked_sub_months(Months::new(n)),
        _ => None,
    }
}

fn step_days(anchor: NaiveDate, days: u64, forward: bool) -> Option<NaiveDate> {
    if forward {
        anchor.checked_add_days(Days::new(days))
    } else {
        anchor.checked_sub_days(Days::new(days))
    }
}

fn add_signed_days(anchor: NaiveDate, delta: i64) -> Option<NaiveDate> {
    step_days(anchor, delta.unsigned_abs(), delta >= 0)
}

fn month_number(s: &str) -> Option<u32> {
    let m = match s {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(m)
}
