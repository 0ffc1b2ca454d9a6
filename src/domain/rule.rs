//! Plan rule data structures.
//!
//! - `RuleSide`: Which rule list a string belongs to (buy or sell)
//! - `PlanRule`: A parsed trigger rule, expressed as factors of a base price
//! - `RuleEntry`: One token of a rule list, with its index and parse outcome
//!
//! The wire form of a rule list is `rule{;rule}*` with `rule := field{,field}*`.
//! `Display` on `PlanRule` writes a single token; [`encode_rules`] writes a list.

use std::fmt;

use crate::domain::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleSide {
    Buy,
    Sell,
}

impl fmt::Display for RuleSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSide::Buy => write!(f, "buy"),
            RuleSide::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlanRule {
    /// Buy `amount` when price <= base * factor.
    ThresholdBuy { factor: f64, amount: f64 },
    /// Buy `amount` when base * lower_factor <= price <= base * upper_factor.
    RangeBuy {
        upper_factor: f64,
        lower_factor: f64,
        amount: f64,
    },
    /// Sell `position_pct` percent of the remaining position when price >= base * factor.
    ThresholdSell { factor: f64, position_pct: f64 },
}

impl PlanRule {
    pub fn side(&self) -> RuleSide {
        match self {
            PlanRule::ThresholdBuy { .. } | PlanRule::RangeBuy { .. } => RuleSide::Buy,
            PlanRule::ThresholdSell { .. } => RuleSide::Sell,
        }
    }
}

impl fmt::Display for PlanRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanRule::ThresholdBuy { factor, amount } => write!(f, "{factor},{amount}"),
            PlanRule::RangeBuy {
                upper_factor,
                lower_factor,
                amount,
            } => write!(f, "{upper_factor},{lower_factor},{amount}"),
            PlanRule::ThresholdSell {
                factor,
                position_pct,
            } => write!(f, "{factor},{position_pct}"),
        }
    }
}

/// One token of a parsed rule list.
///
/// `index` is the token's position in the parsed sequence and is the index
/// the disabled-rule mask refers to. `source` is the trimmed token text.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEntry {
    pub index: usize,
    pub source: String,
    pub rule: Result<PlanRule, ParseError>,
}

impl RuleEntry {
    pub fn is_valid(&self) -> bool {
        self.rule.is_ok()
    }

    pub fn valid_rule(&self) -> Option<&PlanRule> {
        self.rule.as_ref().ok()
    }
}

/// Encode rules into the `rule{;rule}*` wire form.
pub fn encode_rules(rules: &[PlanRule]) -> String {
    rules
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// Valid rules of a parsed list, in index order. Malformed tokens are dropped.
pub fn valid_rules(entries: &[RuleEntry]) -> Vec<PlanRule> {
    entries.iter().filter_map(|e| e.valid_rule().copied()).collect()
}
