//! Rule evaluation engine.
//!
//! Evaluates parsed rule lists against a base reference price and the
//! current price.
//!
//! # Evaluation Semantics
//!
//! - Rules are walked in index order; the first match wins
//! - Comparisons are inclusive: a price exactly at a threshold triggers.
//!   The tolerance scales with the threshold, so sub-cent assets compare
//!   as strictly as large-cap ones
//! - Malformed entries and rules of the other side are skipped
//! - Buy rules ignore the disabled mask; sell rules honor it
//!
//! Both entry points are pure functions of their arguments.

use std::fmt;

use crate::domain::disabled_rules::DisabledRules;
use crate::domain::rule::{PlanRule, RuleEntry};

/// Relative tolerance at a trigger boundary.
const EPSILON: f64 = 1e-9;

/// The price condition that made a rule fire, in absolute prices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceTrigger {
    AtOrBelow(f64),
    Within { lower: f64, upper: f64 },
    AtOrAbove(f64),
}

impl fmt::Display for PriceTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceTrigger::AtOrBelow(p) => write!(f, "price <= {:.2}", p),
            PriceTrigger::Within { lower, upper } => {
                write!(f, "{:.2} <= price <= {:.2}", lower, upper)
            }
            PriceTrigger::AtOrAbove(p) => write!(f, "price >= {:.2}", p),
        }
    }
}

/// A recommended action produced by the first matching rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Buy {
        rule_index: usize,
        amount: f64,
        trigger: PriceTrigger,
    },
    Sell {
        rule_index: usize,
        position_pct: f64,
        trigger: PriceTrigger,
    },
}

impl Action {
    pub fn rule_index(&self) -> usize {
        match self {
            Action::Buy { rule_index, .. } | Action::Sell { rule_index, .. } => *rule_index,
        }
    }

    pub fn trigger(&self) -> PriceTrigger {
        match self {
            Action::Buy { trigger, .. } | Action::Sell { trigger, .. } => *trigger,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy {
                rule_index,
                amount,
                trigger,
            } => write!(f, "buy via rule {rule_index}, amount {amount} ({trigger})"),
            Action::Sell {
                rule_index,
                position_pct,
                trigger,
            } => write!(
                f,
                "sell {position_pct}% of position via rule {rule_index} ({trigger})"
            ),
        }
    }
}

/// Absolute trigger prices of a rule against `base`.
pub fn trigger_for(rule: &PlanRule, base: f64) -> PriceTrigger {
    match *rule {
        PlanRule::ThresholdBuy { factor, .. } => PriceTrigger::AtOrBelow(base * factor),
        PlanRule::RangeBuy {
            upper_factor,
            lower_factor,
            ..
        } => PriceTrigger::Within {
            lower: base * lower_factor,
            upper: base * upper_factor,
        },
        PlanRule::ThresholdSell { factor, .. } => PriceTrigger::AtOrAbove(base * factor),
    }
}

fn at_or_below(price: f64, target: f64) -> bool {
    price <= target + EPSILON * target.abs()
}

fn at_or_above(price: f64, target: f64) -> bool {
    price >= target - EPSILON * target.abs()
}

impl PriceTrigger {
    /// Inclusive at the boundaries, within `EPSILON` of the boundary price.
    pub fn matches(&self, price: f64) -> bool {
        match *self {
            PriceTrigger::AtOrBelow(target) => at_or_below(price, target),
            PriceTrigger::Within { lower, upper } => {
                at_or_above(price, lower) && at_or_below(price, upper)
            }
            PriceTrigger::AtOrAbove(target) => at_or_above(price, target),
        }
    }
}

/// First buy rule matching `price` against `base`, or `None` for no buy action.
pub fn evaluate_buy(entries: &[RuleEntry], base: f64, price: f64) -> Option<Action> {
    entries.iter().find_map(|entry| {
        let rule = entry.valid_rule()?;
        let amount = match *rule {
            PlanRule::ThresholdBuy { amount, .. } | PlanRule::RangeBuy { amount, .. } => amount,
            PlanRule::ThresholdSell { .. } => return None,
        };
        let trigger = trigger_for(rule, base);
        trigger.matches(price).then_some(Action::Buy {
            rule_index: entry.index,
            amount,
            trigger,
        })
    })
}

/// First enabled sell rule matching `price` against `base`, or `None` for no sell action.
pub fn evaluate_sell(
    entries: &[RuleEntry],
    base: f64,
    price: f64,
    disabled: &DisabledRules,
) -> Option<Action> {
    entries
        .iter()
        .filter(|entry| !disabled.contains(entry.index))
        .find_map(|entry| {
            let rule = entry.valid_rule()?;
            let PlanRule::ThresholdSell { position_pct, .. } = *rule else {
                return None;
            };
            let trigger = trigger_for(rule, base);
            trigger.matches(price).then_some(Action::Sell {
                rule_index: entry.index,
                position_pct,
                trigger,
            })
        })
}
