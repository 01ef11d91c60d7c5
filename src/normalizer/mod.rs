//! Turns raw extractor output into an [`ExtractedRecord`]

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::error::ExtractionError;
use crate::models::{ExtractedRecord, Field, LotteryDefinition};

/// What a source adapter pulled out of one response, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExtraction {
    pub title: Option<String>,
    /// Digits as found; coerced by [`normalize`]
    pub draw_number: Option<String>,
    pub draw_date: Option<NaiveDate>,
    pub tokens: Vec<String>,
}

/// Builds the canonical record for `lottery`.
///
/// The lottery name always comes from the definition, never from the page.
/// A draw number that was found but is not a positive `u32` fails the whole
/// record rather than being dropped.
pub fn normalize(
    lottery: &LotteryDefinition,
    source_url: &str,
    raw: RawExtraction,
) -> Result<ExtractedRecord, ExtractionError> {
    let draw_number = raw.draw_number.as_deref().map(parse_draw_number).transpose()?;

    Ok(ExtractedRecord {
        lottery_name: lottery.display_name.trim().to_string(),
        draw_number,
        draw_date: raw.draw_date,
        numbers_or_codes: dedup_keep_order(raw.tokens),
        source_url: source_url.to_string(),
        title: raw.title.filter(|title| !title.trim().is_empty()),
    })
}

pub fn parse_draw_number(raw: &str) -> Result<u32, ExtractionError> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ExtractionError::Malformed {
            field: Field::DrawNumber,
            raw: raw.to_string(),
        }),
    }
}

/// Drops repeated tokens, keeping the first occurrence of each in place.
pub fn dedup_keep_order(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(tokens.len());
    tokens
        .into_iter()
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceLocator;

    fn lottery() -> LotteryDefinition {
        LotteryDefinition {
            id: 6,
            display_name: "Mahajana Sampatha".into(),
            source: SourceLocator::DirectPage {
                url: "https://results.govdoc.lk/results/mahajana-sampatha-6088".into(),
                numbers_selector: None,
                with_codes: false,
            },
        }
    }

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn dedup_preserves_first_seen_order() {
        assert_eq!(
            dedup_keep_order(tokens(&["05", "41", "05", "64", "41"])),
            tokens(&["05", "41", "64"])
        );
    }

    #[test]
    fn name_comes_from_definition() {
        let raw = RawExtraction {
            title: Some("MAHAJANA SAMPATHA - Results".into()),
            draw_number: Some("6088".into()),
            draw_date: NaiveDate::from_ymd_opt(2026, 1, 30),
            tokens: tokens(&["B", "1", "2", "2"]),
        };
        let record = normalize(&lottery(), "https://example.test/6088", raw).unwrap();
        assert_eq!(record.lottery_name, "Mahajana Sampatha");
        assert_eq!(record.draw_number, Some(6088));
        assert_eq!(record.result_numbers(), "B 1 2");
        assert_eq!(record.source_url, "https://example.test/6088");
    }

    #[test]
    fn missing_fields_stay_absent() {
        let record = normalize(&lottery(), "u", RawExtraction::default()).unwrap();
        assert_eq!(record.draw_number, None);
        assert_eq!(record.title, None);
        assert_eq!(
            record.missing_fields(),
            vec![Field::DrawNumber, Field::DrawDate]
        );
    }

    #[test]
    fn zero_and_overflow_are_malformed() {
        for raw in ["0", "99999999999", "12a"] {
            match parse_draw_number(raw) {
                Err(ExtractionError::Malformed { field, raw: found }) => {
                    assert_eq!(field, Field::DrawNumber);
                    assert_eq!(found, raw);
                }
                other => panic!("expected malformed draw number, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_draw_number_fails_the_record() {
        let raw = RawExtraction {
            draw_number: Some("0".into()),
            draw_date: NaiveDate::from_ymd_opt(2026, 1, 30),
            ..RawExtraction::default()
        };
        assert!(matches!(
            normalize(&lottery(), "u", raw),
            Err(ExtractionError::Malformed { .. })
        ));
    }
}
