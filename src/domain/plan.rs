//! Investment plans and their evaluation against a price snapshot.
//!
//! Two variants:
//! - `AccumulationPlan`: buy rules against the observed ATH, sell rules
//!   against a manually recorded ATH
//! - `SingleEntryPlan`: sell rules against a purchase price
//!
//! Rule strings are parsed fresh on every evaluation. The disabled sell-rule
//! set is the only per-rule state and is changed through `toggle_sell_rule`.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::domain::disabled_rules::DisabledRules;
use crate::domain::error::{BitageError, MetricError};
use crate::domain::metrics::{DcaMetrics, ProfitMetrics, compute_dca_metrics, compute_profit_metrics};
use crate::domain::rule::{RuleEntry, RuleSide};
use crate::domain::rule_eval::{Action, evaluate_buy, evaluate_sell};
use crate::domain::rule_parser;
use crate::domain::snapshot::PriceSnapshot;

pub type PlanId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanKind {
    Accumulation,
    SingleEntry,
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanKind::Accumulation => write!(f, "accumulation"),
            PlanKind::SingleEntry => write!(f, "single-entry"),
        }
    }
}

impl FromStr for PlanKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accumulation" | "dca" => Ok(PlanKind::Accumulation),
            "single-entry" | "single_entry" | "single" => Ok(PlanKind::SingleEntry),
            other => Err(format!(
                "unknown plan kind '{}' (expected accumulation or single-entry)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccumulationPlan {
    pub id: Option<PlanId>,
    pub name: String,
    pub ticker: String,
    /// Manually recorded all-time high; base price for sell rules.
    pub ath_value: f64,
    pub ath_date: NaiveDate,
    pub buy_rules: String,
    pub sell_rules: String,
    pub disabled_sell: DisabledRules,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SingleEntryPlan {
    pub id: Option<PlanId>,
    pub name: String,
    pub ticker: String,
    /// Base price for sell rules.
    pub purchase_price: f64,
    pub sell_rules: String,
    pub disabled_sell: DisabledRules,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Accumulation(AccumulationPlan),
    SingleEntry(SingleEntryPlan),
}

impl Plan {
    pub fn kind(&self) -> PlanKind {
        match self {
            Plan::Accumulation(_) => PlanKind::Accumulation,
            Plan::SingleEntry(_) => PlanKind::SingleEntry,
        }
    }

    pub fn id(&self) -> Option<PlanId> {
        match self {
            Plan::Accumulation(p) => p.id,
            Plan::SingleEntry(p) => p.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Plan::Accumulation(p) => &p.name,
            Plan::SingleEntry(p) => &p.name,
        }
    }

    pub fn ticker(&self) -> &str {
        match self {
            Plan::Accumulation(p) => &p.ticker,
            Plan::SingleEntry(p) => &p.ticker,
        }
    }

    pub fn sell_rules(&self) -> &str {
        match self {
            Plan::Accumulation(p) => &p.sell_rules,
            Plan::SingleEntry(p) => &p.sell_rules,
        }
    }

    pub fn disabled_sell(&self) -> &DisabledRules {
        match self {
            Plan::Accumulation(p) => &p.disabled_sell,
            Plan::SingleEntry(p) => &p.disabled_sell,
        }
    }

    pub fn toggle_sell_rule(&mut self, index: usize) -> Result<bool, BitageError> {
        match self {
            Plan::Accumulation(p) => p.toggle_sell_rule(index),
            Plan::SingleEntry(p) => p.toggle_sell_rule(index),
        }
    }
}

/// Market-dependent half of an accumulation plan evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulationMarket {
    pub snapshot: PriceSnapshot,
    pub buy: Option<Action>,
    pub sell: Option<Action>,
    pub metrics: Result<DcaMetrics, MetricError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccumulationEvaluation {
    pub buy_rules: Vec<RuleEntry>,
    pub sell_rules: Vec<RuleEntry>,
    /// `None` while awaiting market data.
    pub market: Option<AccumulationMarket>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SingleEntryMarket {
    pub snapshot: PriceSnapshot,
    pub sell: Option<Action>,
    pub profit: Result<ProfitMetrics, MetricError>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SingleEntryEvaluation {
    pub sell_rules: Vec<RuleEntry>,
    /// `None` while awaiting market data.
    pub market: Option<SingleEntryMarket>,
}

fn toggle_in(
    disabled: &mut DisabledRules,
    sell_rules: &str,
    index: usize,
) -> Result<bool, BitageError> {
    let count = rule_parser::parse(sell_rules, RuleSide::Sell).len();
    if index >= count {
        return Err(BitageError::RuleIndexOutOfRange { index, count });
    }
    Ok(disabled.toggle(index))
}

impl AccumulationPlan {
    pub fn parse_buy_rules(&self) -> Vec<RuleEntry> {
        rule_parser::parse(&self.buy_rules, RuleSide::Buy)
    }

    pub fn parse_sell_rules(&self) -> Vec<RuleEntry> {
        rule_parser::parse(&self.sell_rules, RuleSide::Sell)
    }

    /// Buy rules are evaluated against the observed ATH of the snapshot,
    /// sell rules against `ath_value` with the disabled mask applied.
    pub fn evaluate(&self, snapshot: Option<&PriceSnapshot>) -> AccumulationEvaluation {
        let buy_rules = self.parse_buy_rules();
        let sell_rules = self.parse_sell_rules();

        let market = snapshot.map(|snap| AccumulationMarket {
            snapshot: *snap,
            buy: evaluate_buy(&buy_rules, snap.ath_now, snap.price),
            sell: evaluate_sell(&sell_rules, self.ath_value, snap.price, &self.disabled_sell),
            metrics: compute_dca_metrics(snap.price, snap.ath_now, snap.low_since_ath),
        });

        AccumulationEvaluation {
            buy_rules,
            sell_rules,
            market,
        }
    }

    /// Returns `true` if the rule is enabled after the toggle.
    pub fn toggle_sell_rule(&mut self, index: usize) -> Result<bool, BitageError> {
        toggle_in(&mut self.disabled_sell, &self.sell_rules, index)
    }
}

impl SingleEntryPlan {
    pub fn parse_sell_rules(&self) -> Vec<RuleEntry> {
        rule_parser::parse(&self.sell_rules, RuleSide::Sell)
    }

    pub fn evaluate(&self, snapshot: Option<&PriceSnapshot>) -> SingleEntryEvaluation {
        let sell_rules = self.parse_sell_rules();

        let market = snapshot.map(|snap| SingleEntryMarket {
            snapshot: *snap,
            sell: evaluate_sell(
                &sell_rules,
                self.purchase_price,
                snap.price,
                &self.disabled_sell,
            ),
            profit: compute_profit_metrics(snap.price, self.purchase_price),
        });

        SingleEntryEvaluation { sell_rules, market }
    }

    /// Returns `true` if the rule is enabled after the toggle.
    pub fn toggle_sell_rule(&mut self, index: usize) -> Result<bool, BitageError> {
        toggle_in(&mut self.disabled_sell, &self.sell_rules, index)
    }
}
