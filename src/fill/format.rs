//! Normalization of user-supplied values into the canonical shapes date,
//! time, datetime and color inputs accept. Unrecognized input passes
//! through untouched, except colors, which fall back to black.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::detect::field_model::FieldType;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("valid regex"));
static US_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4})$").expect("valid regex"));
static TIME_12H: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})(?::(\d{2}))?(?::\d{2})?\s*([AaPp])\.?[Mm]\.?$").expect("valid regex")
});
static TIME_24H: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(?::\d{2})?$").expect("valid regex"));
static DATE_TIME_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)(?:T|\s*,\s*|\s+)(\d{1,2}(?::\d{2}){1,2}(?:\s*[AaPp]\.?[Mm]\.?)?|\d{1,2}\s*[AaPp]\.?[Mm]\.?)$")
        .expect("valid regex")
});
static HEX_LONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid regex"));
static HEX_SHORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([0-9a-fA-F])([0-9a-fA-F])([0-9a-fA-F])$").expect("valid regex"));
static RGB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*[\d.]+\s*)?\)$")
        .expect("valid regex")
});

/// Date layouts tried after the explicit ISO and US shapes.
const DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M",
];

const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("white", "#ffffff"),
    ("red", "#ff0000"),
    ("green", "#008000"),
    ("blue", "#0000ff"),
    ("yellow", "#ffff00"),
    ("orange", "#ffa500"),
    ("purple", "#800080"),
    ("pink", "#ffc0cb"),
    ("brown", "#a52a2a"),
    ("gray", "#808080"),
    ("grey", "#808080"),
    ("cyan", "#00ffff"),
    ("magenta", "#ff00ff"),
    ("lime", "#00ff00"),
    ("navy", "#000080"),
    ("teal", "#008080"),
    ("maroon", "#800000"),
    ("olive", "#808000"),
    ("silver", "#c0c0c0"),
    ("gold", "#ffd700"),
    ("indigo", "#4b0082"),
    ("violet", "#ee82ee"),
    ("coral", "#ff7f50"),
    ("salmon", "#fa8072"),
    ("turquoise", "#40e0d0"),
    ("beige", "#f5f5dc"),
    ("lavender", "#e6e6fa"),
];

/// Format `value` for a field of `field_type`.
pub fn format_value(value: &str, field_type: FieldType) -> String {
    match field_type {
        FieldType::Date => format_date(value),
        FieldType::Time => format_time(value),
        FieldType::Datetime => format_datetime(value),
        FieldType::Color => format_color(value),
        _ => value.to_string(),
    }
}

// ============================================================================
// Dates and times
// ============================================================================

/// `YYYY-MM-DD`, or the input unchanged when it is not a date.
pub fn format_date(value: &str) -> String {
    parse_date(value.trim())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| value.to_string())
}

/// 24-hour `HH:MM`, or the input unchanged.
pub fn format_time(value: &str) -> String {
    parse_time(value.trim())
        .map(|(h, m)| format!("{:02}:{:02}", h, m))
        .unwrap_or_else(|| value.to_string())
}

/// `YYYY-MM-DDTHH:MM`, or the input unchanged. A bare date means midnight.
pub fn format_datetime(value: &str) -> String {
    let trimmed = value.trim();

    if let Some(caps) = DATE_TIME_SPLIT.captures(trimmed) {
        if let (Some(date), Some((h, m))) = (parse_date(&caps[1]), parse_time(&caps[2])) {
            return format!("{}T{:02}:{:02}", date.format("%Y-%m-%d"), h, m);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return dt.naive_local().format("%Y-%m-%dT%H:%M").to_string();
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(trimmed, f).ok())
    {
        return dt.format("%Y-%m-%dT%H:%M").to_string();
    }
    if let Some(date) = parse_date(trimmed) {
        return format!("{}T00:00", date.format("%Y-%m-%d"));
    }

    value.to_string()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Some(caps) = ISO_DATE.captures(value) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }
    if let Some(caps) = US_DATE.captures(value) {
        if let Some(date) = ymd(&caps[3], &caps[1], &caps[2]) {
            return Some(date);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn parse_time(value: &str) -> Option<(u32, u32)> {
    let value = value.trim();

    if let Some(caps) = TIME_12H.captures(value) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute = caps.get(2).map_or(Ok(0), |m| m.as_str().parse::<u32>()).ok()?;
        if !(1..=12).contains(&hour) || minute > 59 {
            return None;
        }
        let pm = caps[3].eq_ignore_ascii_case("p");
        let hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        return Some((hour, minute));
    }

    if let Some(caps) = TIME_24H.captures(value) {
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        return (hour < 24 && minute < 60).then_some((hour, minute));
    }

    None
}

// ============================================================================
// Colors
// ============================================================================

/// `#rrggbb`. Anything unrecognized becomes `#000000`.
pub fn format_color(value: &str) -> String {
    let trimmed = value.trim();

    if HEX_LONG.is_match(trimmed) {
        return trimmed.to_string();
    }
    if let Some(caps) = HEX_SHORT.captures(trimmed) {
        return format!("#{0}{0}{1}{1}{2}{2}", &caps[1], &caps[2], &caps[3]).to_lowercase();
    }

    let lowered = trimmed.to_lowercase();
    if let Some((_, hex)) = NAMED_COLORS.iter().find(|(name, _)| *name == lowered) {
        return hex.to_string();
    }

    if let Some(caps) = RGB.captures(trimmed) {
        let channel = |i: usize| caps[i].parse::<u32>().unwrap_or(0).min(255);
        return format!("#{:02x}{:02x}{:02x}", channel(1), channel(2), channel(3));
    }

    "#000000".to_string()
}
