//! Field extractors for loosely structured result pages.
//!
//! Every extractor is a pure function of its input and is total: empty or
//! malformed input produces `None` or an empty list, never a panic. Where a
//! field has several strategies they are tried in a fixed order and the first
//! hit wins, so a change in page layout degrades to "absent" deterministically.

mod tokens;

pub use tokens::{
    DEFAULT_NUMBERS_SELECTOR, extract_alphanumeric_codes, extract_mixed_tokens,
    extract_numeric_tokens, page_heading, visible_text,
};
pub(crate) use tokens::element_text;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static URL_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-([0-9]+)\b").unwrap());
static CELL_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9]{1,6}\b").unwrap());
static TITLE_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9]{3,6}\b").unwrap());

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9]{4}-[0-9]{2}-[0-9]{2}\b").unwrap());
static SLASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9]{2}/[0-9]{2}/[0-9]{4}\b").unwrap());
static DASH_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9]{2}-[0-9]{2}-[0-9]{4}\b").unwrap());
static MONTH_NAME_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([0-9]{4})-([A-Za-z]{3})-([0-9]{1,2})\b").unwrap());

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// One place a draw number may be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawNumberHint<'a> {
    /// `.../ada-kotipathi-2888`; the last `-<digits>` segment wins
    UrlSuffix(&'a str),
    /// `"2891 | 2026-Jan-31 Saturday"`; first 1-6 digit run left of the pipe
    PipeCell(&'a str),
    /// First 3-6 digit run of a page heading
    Title(&'a str),
}

impl<'a> DrawNumberHint<'a> {
    pub fn apply(self) -> Option<&'a str> {
        match self {
            Self::UrlSuffix(locator) => URL_SUFFIX
                .captures_iter(locator)
                .last()
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str()),
            Self::PipeCell(cell) => {
                let (left, _) = cell.split_once('|')?;
                CELL_DIGITS.find(left).map(|m| m.as_str())
            }
            Self::Title(title) => TITLE_DIGITS.find(title).map(|m| m.as_str()),
        }
    }
}

/// Raw digits of the draw number from the first hint that yields one.
///
/// The value is left as text; turning it into a number (and rejecting zero or
/// overflow) is the normalizer's job so the offending raw value can be reported.
pub fn extract_draw_number(hints: &[DrawNumberHint<'_>]) -> Option<String> {
    hints.iter().find_map(|hint| hint.apply()).map(str::to_owned)
}

/// Textual date layouts, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateShape {
    /// `2026-01-29`
    Iso,
    /// `29/01/2026`
    DayMonthYearSlash,
    /// `29-01-2026`
    DayMonthYearDash,
    /// `2026-Jan-31`, as used by fragment rows
    YearMonthName,
}

impl DateShape {
    pub const PRIORITY: [Self; 4] = [
        Self::Iso,
        Self::DayMonthYearSlash,
        Self::DayMonthYearDash,
        Self::YearMonthName,
    ];

    fn pattern(self) -> &'static Regex {
        match self {
            Self::Iso => &*ISO_DATE,
            Self::DayMonthYearSlash => &*SLASH_DATE,
            Self::DayMonthYearDash => &*DASH_DATE,
            Self::YearMonthName => &*MONTH_NAME_DATE,
        }
    }

    fn parse(self, matched: &str) -> Option<NaiveDate> {
        match self {
            Self::Iso => NaiveDate::parse_from_str(matched, "%Y-%m-%d").ok(),
            Self::DayMonthYearSlash => NaiveDate::parse_from_str(matched, "%d/%m/%Y").ok(),
            Self::DayMonthYearDash => NaiveDate::parse_from_str(matched, "%d-%m-%Y").ok(),
            Self::YearMonthName => parse_month_name_date(matched),
        }
    }
}

fn parse_month_name_date(matched: &str) -> Option<NaiveDate> {
    let caps = MONTH_NAME_DATE.captures(matched)?;
    let year: i32 = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// English three-letter month abbreviation, case-insensitive.
fn month_number(abbrev: &str) -> Option<u32> {
    let lower = abbrev.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .and_then(|idx| u32::try_from(idx + 1).ok())
}

/// The draw date found in free text.
///
/// Shapes are tried in [`DateShape::PRIORITY`] order regardless of where they
/// occur in the text. Within a shape, matches that are not real calendar dates
/// (`2026-02-30`) are skipped.
pub fn extract_draw_date(text: &str) -> Option<NaiveDate> {
    DateShape::PRIORITY.iter().find_map(|shape| {
        shape
            .pattern()
            .find_iter(text)
            .find_map(|m| shape.parse(m.as_str()))
    })
}
