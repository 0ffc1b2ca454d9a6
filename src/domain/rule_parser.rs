//! Rule list parser.
//!
//! Splits a `;`-delimited rule list into tokens and each token into
//! `,`-delimited numeric fields. Errors are per token: a malformed rule
//! becomes an `Err` entry carrying the byte offset of the problem, and
//! its siblings still parse.

use crate::domain::error::ParseError;
use crate::domain::rule::{PlanRule, RuleEntry, RuleSide};

const RULE_SEPARATOR: char = ';';
const FIELD_SEPARATOR: char = ',';

struct TokenParser<'a> {
    token: &'a str,
    /// Byte offset of `token` within the full rule-list string.
    offset: usize,
}

impl<'a> TokenParser<'a> {
    fn new(token: &'a str, offset: usize) -> Self {
        Self { token, offset }
    }

    fn error(&self, message: String, position: usize) -> ParseError {
        ParseError { message, position }
    }

    fn fields(&self) -> Result<Vec<f64>, ParseError> {
        let mut values = Vec::new();
        let mut field_start = 0usize;

        for raw in self.token.split(FIELD_SEPARATOR) {
            let lead = raw.len() - raw.trim_start().len();
            let position = self.offset + field_start + lead;
            field_start += raw.len() + FIELD_SEPARATOR.len_utf8();

            let text = raw.trim();
            if text.is_empty() {
                return Err(self.error("empty field".to_string(), position));
            }
            let value: f64 = text
                .parse()
                .map_err(|_| self.error(format!("invalid number '{}'", text), position))?;
            if !value.is_finite() {
                return Err(self.error(format!("number must be finite, found '{}'", text), position));
            }
            values.push(value);
        }

        Ok(values)
    }

    fn parse_buy(&self) -> Result<PlanRule, ParseError> {
        let fields = self.fields()?;
        match fields.as_slice() {
            &[factor, amount] => Ok(PlanRule::ThresholdBuy { factor, amount }),
            &[upper_factor, lower_factor, amount] => {
                if lower_factor > upper_factor {
                    return Err(self.error(
                        format!(
                            "range lower bound {} exceeds upper bound {}",
                            lower_factor, upper_factor
                        ),
                        self.offset,
                    ));
                }
                Ok(PlanRule::RangeBuy {
                    upper_factor,
                    lower_factor,
                    amount,
                })
            }
            other => Err(self.error(
                format!("buy rule expects 2 or 3 fields, found {}", other.len()),
                self.offset,
            )),
        }
    }

    fn parse_sell(&self) -> Result<PlanRule, ParseError> {
        let fields = self.fields()?;
        match fields.as_slice() {
            &[factor, position_pct] => Ok(PlanRule::ThresholdSell {
                factor,
                position_pct,
            }),
            other => Err(self.error(
                format!("sell rule expects 2 fields, found {}", other.len()),
                self.offset,
            )),
        }
    }
}

/// Parse a rule list for the given side.
///
/// Empty or whitespace-only input yields no entries. Whitespace-only tokens
/// (a trailing `;`, for instance) are skipped and do not take an index.
pub fn parse(input: &str, side: RuleSide) -> Vec<RuleEntry> {
    let mut entries = Vec::new();
    let mut token_start = 0usize;

    for raw in input.split(RULE_SEPARATOR) {
        let start = token_start;
        token_start += raw.len() + RULE_SEPARATOR.len_utf8();

        let token = raw.trim();
        if token.is_empty() {
            continue;
        }
        let lead = raw.len() - raw.trim_start().len();
        let parser = TokenParser::new(token, start + lead);
        let rule = match side {
            RuleSide::Buy => parser.parse_buy(),
            RuleSide::Sell => parser.parse_sell(),
        };

        entries.push(RuleEntry {
            index: entries.len(),
            source: token.to_string(),
            rule,
        });
    }

    entries
}

/// Errors of a parsed list, in index order.
pub fn errors(entries: &[RuleEntry]) -> Vec<(usize, &ParseError)> {
    entries
        .iter()
        .filter_map(|e| e.rule.as_ref().err().map(|err| (e.index, err)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(entry: &RuleEntry) -> PlanRule {
        entry.rule.clone().expect("expected a valid rule")
    }

    fn err(entry: &RuleEntry) -> ParseError {
        entry.rule.clone().expect_err("expected a parse error")
    }

    // --- Buy lists ---

    #[test]
    fn parse_threshold_buy() {
        let entries = parse("0.8,100", RuleSide::Buy);
        assert_eq!(entries.len(), 1);
        assert_eq!(
            ok(&entries[0]),
            PlanRule::ThresholdBuy {
                factor: 0.8,
                amount: 100.0
            }
        );
    }

    #[test]
    fn parse_range_buy() {
        let entries = parse("0.6,0.5,200", RuleSide::Buy);
        assert_eq!(
            ok(&entries[0]),
            PlanRule::RangeBuy {
                upper_factor: 0.6,
                lower_factor: 0.5,
                amount: 200.0
            }
        );
    }

    #[test]
    fn parse_mixed_buy_list_keeps_order() {
        let entries = parse("0.8,100;0.6,0.5,200;0.4,300", RuleSide::Buy);
        assert_eq!(entries.len(), 3);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.index, i);
            assert!(entry.is_valid());
        }
        assert!(matches!(ok(&entries[1]), PlanRule::RangeBuy { .. }));
        assert_eq!(entries[2].source, "0.4,300");
    }

    #[test]
    fn parse_range_equal_bounds_is_valid() {
        let entries = parse("0.5,0.5,10", RuleSide::Buy);
        assert!(entries[0].is_valid());
    }

    #[test]
    fn parse_range_inverted_bounds_is_error() {
        let entries = parse("0.5,0.6,200", RuleSide::Buy);
        let e = err(&entries[0]);
        assert!(e.message.contains("exceeds upper bound"), "{}", e.message);
        assert_eq!(e.position, 0);
    }

    #[test]
    fn parse_buy_wrong_field_count() {
        let entries = parse("0.8;0.1,0.2,0.3,4", RuleSide::Buy);
        assert_eq!(entries.len(), 2);
        assert!(err(&entries[0]).message.contains("found 1"));
        assert!(err(&entries[1]).message.contains("found 4"));
        assert_eq!(err(&entries[1]).position, 4);
    }

    // --- Sell lists ---

    #[test]
    fn parse_threshold_sell() {
        let entries = parse("2.0,50;1.5,25", RuleSide::Sell);
        assert_eq!(entries.len(), 2);
        assert_eq!(
            ok(&entries[0]),
            PlanRule::ThresholdSell {
                factor: 2.0,
                position_pct: 50.0
            }
        );
        assert_eq!(
            ok(&entries[1]),
            PlanRule::ThresholdSell {
                factor: 1.5,
                position_pct: 25.0
            }
        );
    }

    #[test]
    fn parse_sell_rejects_three_fields() {
        let entries = parse("0.6,0.5,200", RuleSide::Sell);
        assert!(err(&entries[0]).message.contains("expects 2 fields"));
    }

    // --- Error isolation ---

    #[test]
    fn bad_token_does_not_discard_siblings() {
        let entries = parse("2.0,50;abc,10;1.5,25", RuleSide::Sell);
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_valid());
        assert!(!entries[1].is_valid());
        assert!(entries[2].is_valid());
        assert_eq!(entries[2].index, 2);
    }

    #[test]
    fn error_position_points_at_field() {
        let input = "2.0,50; 3.0,x";
        let entries = parse(input, RuleSide::Sell);
        let e = err(&entries[1]);
        assert_eq!(e.message, "invalid number 'x'");
        assert_eq!(&input[e.position..], "x");
    }

    #[test]
    fn empty_field_is_error() {
        let entries = parse("2.0,", RuleSide::Sell);
        let e = err(&entries[0]);
        assert_eq!(e.message, "empty field");
        assert_eq!(e.position, 4);
    }

    #[test]
    fn non_finite_number_is_error() {
        let entries = parse("inf,50;NaN,10", RuleSide::Sell);
        assert!(err(&entries[0]).message.contains("finite"));
        assert!(err(&entries[1]).message.contains("finite"));
    }

    #[test]
    fn errors_lists_only_bad_tokens() {
        let entries = parse("0.8,100;bad;0.5,10", RuleSide::Buy);
        let errs = errors(&entries);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].0, 1);
    }

    // --- Whitespace & empty input ---

    #[test]
    fn empty_input_yields_no_entries() {
        assert!(parse("", RuleSide::Buy).is_empty());
        assert!(parse("   ", RuleSide::Sell).is_empty());
    }

    #[test]
    fn whitespace_tokens_are_skipped() {
        let entries = parse(" 0.8 , 100 ;  ; 0.6,0.5,200 ;", RuleSide::Buy);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source, "0.8 , 100");
        assert_eq!(entries[1].index, 1);
        assert!(entries.iter().all(|e| e.is_valid()));
    }

    #[test]
    fn scientific_notation_accepted() {
        let entries = parse("2e0,5e1", RuleSide::Sell);
        assert_eq!(
            ok(&entries[0]),
            PlanRule::ThresholdSell {
                factor: 2.0,
                position_pct: 50.0
            }
        );
    }
}
