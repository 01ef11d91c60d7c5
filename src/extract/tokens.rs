//! Ball number and winning code extraction

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Elements that usually hold one ball each on result page templates.
pub const DEFAULT_NUMBERS_SELECTOR: &str = "ul li, ol li, \
     .ball, .balls span, .number, .numbers span, \
     .winning, .winning-numbers span, \
     .result, .results span, \
     table td";

static SMALL_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{1,3}$").unwrap());
static BALL_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9]{1,2}\b").unwrap());
static WINNING_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{1,2}\s?[0-9]{6}\b").unwrap());
static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());

const HIDDEN_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Which pass produced a set of numeric tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPass {
    /// Whole-text elements matched by the numbers selector
    Structured,
    /// 1-2 digit words anywhere in the visible text
    PlainText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericTokens {
    pub pass: TokenPass,
    pub tokens: Vec<String>,
}

/// Ball numbers from a parsed page.
///
/// The plain-text pass only runs when the structured pass finds nothing, so
/// stray numbers elsewhere on the page never mix into a structured result.
pub fn extract_numeric_tokens(document: &Html, numbers: &Selector) -> NumericTokens {
    let tokens: Vec<String> = document
        .select(numbers)
        .map(element_text)
        .filter(|text| SMALL_NUMBER.is_match(text))
        .collect();

    if !tokens.is_empty() {
        return NumericTokens {
            pass: TokenPass::Structured,
            tokens,
        };
    }

    let text = visible_text(document);
    NumericTokens {
        pass: TokenPass::PlainText,
        tokens: BALL_TOKEN
            .find_iter(&text)
            .map(|m| m.as_str().to_owned())
            .collect(),
    }
}

/// `A123456` / `AB 123456` style codes, internal whitespace removed.
pub fn extract_alphanumeric_codes(text: &str) -> Vec<String> {
    WINNING_CODE
        .find_iter(text)
        .map(|m| m.as_str().split_whitespace().collect::<String>())
        .collect()
}

/// Text of every non-empty leaf element, in document order.
///
/// Letters and numbers stay together as one stream; fragment rows put the
/// letter code in the same list as the balls.
pub fn extract_mixed_tokens<'a, I>(elements: I) -> Vec<String>
where
    I: IntoIterator<Item = ElementRef<'a>>,
{
    elements
        .into_iter()
        .filter(|el| !el.children().any(|child| child.value().is_element()))
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect()
}

/// First `<h1>` with text.
pub fn page_heading(document: &Html) -> Option<String> {
    document
        .select(&HEADING)
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// Text of a document with whitespace collapsed, `<title>` included. Script
/// and style content is skipped.
pub fn visible_text(document: &Html) -> String {
    let mut words = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_TAGS.contains(&el.name()))
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }
    words.join(" ")
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_selector() -> Selector {
        Selector::parse(DEFAULT_NUMBERS_SELECTOR).unwrap()
    }

    #[test]
    fn structured_pass_wins_over_page_text() {
        let html = r#"
            <html><body>
              <h1>Ada Kotipathi 2888</h1>
              <p>Jackpot 45 million, next draw in 3 days</p>
              <ul class="numbers">
                <li>05</li><li>41</li><li>56</li><li>64</li>
                <li>Super prize</li>
              </ul>
            </body></html>"#;
        let document = Html::parse_document(html);
        let found = extract_numeric_tokens(&document, &default_selector());
        assert_eq!(found.pass, TokenPass::Structured);
        assert_eq!(found.tokens, vec!["05", "41", "56", "64"]);
    }

    #[test]
    fn structured_pass_accepts_three_digits_only() {
        let html = r#"<div class="balls"><span>7</span><span>123</span><span>1234</span></div>"#;
        let document = Html::parse_document(html);
        let found = extract_numeric_tokens(&document, &default_selector());
        assert_eq!(found.tokens, vec!["7", "123"]);
    }

    #[test]
    fn plain_text_pass_runs_when_structure_is_missing() {
        let html = r#"
            <html><head><title>Draw 12</title></head><body>
              <script>var balls = [99, 98];</script>
              <p>Winning numbers: 08 17 23 and 2888 tickets</p>
            </body></html>"#;
        let document = Html::parse_document(html);
        let found = extract_numeric_tokens(&document, &default_selector());
        assert_eq!(found.pass, TokenPass::PlainText);
        assert_eq!(found.tokens, vec!["12", "08", "17", "23"]);
    }

    #[test]
    fn title_text_is_visible() {
        let html = r#"
            <html><head>
              <title>Govi Setha 4330 - 2026-01-27 - G 123456</title>
              <style>.ball { color: red }</style>
            </head><body><p>Results</p></body></html>"#;
        let document = Html::parse_document(html);
        let text = visible_text(&document);
        assert_eq!(text, "Govi Setha 4330 - 2026-01-27 - G 123456 Results");
        assert_eq!(crate::extract::extract_draw_date(&text).unwrap().to_string(), "2026-01-27");
        assert_eq!(extract_alphanumeric_codes(&text), vec!["G123456"]);
    }

    #[test]
    fn custom_selector_limits_structured_pass() {
        let html = r#"
            <ul><li>01</li></ul>
            <div class="draw-balls"><b>11</b><b>22</b></div>"#;
        let document = Html::parse_document(html);
        let selector = Selector::parse(".draw-balls b").unwrap();
        let found = extract_numeric_tokens(&document, &selector);
        assert_eq!(found.tokens, vec!["11", "22"]);
    }

    #[test]
    fn empty_document_yields_nothing() {
        let document = Html::parse_document("");
        let found = extract_numeric_tokens(&document, &default_selector());
        assert!(found.tokens.is_empty());
        assert_eq!(page_heading(&document), None);
        assert_eq!(visible_text(&document), "");
    }

    #[test]
    fn codes_are_normalized() {
        let text = "Special prize A123456, super prize AB 654321, not ABC1234567 or a123456";
        assert_eq!(extract_alphanumeric_codes(text), vec!["A123456", "AB654321"]);
    }

    #[test]
    fn mixed_tokens_keep_letters_and_order() {
        let html = r#"<table><tbody><tr>
              <td>2891 | 2026-Jan-31 Saturday</td>
              <td><ol class="B"><li>K</li><li> 05 </li><li></li><li>41</li>
                <li><span>64</span></li></ol></td>
            </tr></tbody></table>"#;
        let fragment = Html::parse_fragment(html);
        let items = Selector::parse("ol li, ol li span").unwrap();
        assert_eq!(
            extract_mixed_tokens(fragment.select(&items)),
            vec!["K", "05", "41", "64"]
        );
    }

    #[test]
    fn heading_is_trimmed() {
        let document = Html::parse_document("<h1>\n  Super Ball\n  3062 </h1>");
        assert_eq!(page_heading(&document).as_deref(), Some("Super Ball 3062"));
    }
}
