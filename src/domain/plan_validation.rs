//! Plan authoring validation.
//!
//! Drafts hold fields as entered. Validation rejects missing text fields,
//! non-numeric or non-positive prices and unparsable dates before a plan
//! record is created or updated. Rule strings are accepted as-is; their
//! malformed tokens surface later as per-rule diagnostics.

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::disabled_rules::DisabledRules;
use crate::domain::error::BitageError;
use crate::domain::plan::{AccumulationPlan, PlanId, SingleEntryPlan};
use crate::domain::rule::RuleSide;
use crate::domain::rule_parser;
use crate::ports::config_port::ConfigPort;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Caller-side authoring policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthoringPolicy {
    pub reject_future_ath_date: bool,
    pub today: NaiveDate,
}

impl AuthoringPolicy {
    pub fn permissive(today: NaiveDate) -> Self {
        Self {
            reject_future_ath_date: false,
            today,
        }
    }

    pub fn from_config(config: &dyn ConfigPort, today: NaiveDate) -> Self {
        Self {
            reject_future_ath_date: config.get_bool("plans", "reject_future_ath_date", false),
            today,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccumulationDraft {
    pub name: String,
    pub ticker: String,
    pub ath_value: String,
    pub ath_date: String,
    pub buy_rules: String,
    pub sell_rules: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SingleEntryDraft {
    pub name: String,
    pub ticker: String,
    pub purchase_price: String,
    pub sell_rules: String,
}

impl AccumulationDraft {
    /// Build a plan record. `id` is `None` for a new plan; the disabled set
    /// is carried over from the record being edited.
    pub fn validate(
        &self,
        policy: &AuthoringPolicy,
        id: Option<PlanId>,
        disabled_sell: DisabledRules,
    ) -> Result<AccumulationPlan, BitageError> {
        let name = required_text(&self.name, "name")?;
        let ticker = required_text(&self.ticker, "ticker")?.to_uppercase();
        let ath_value = positive_number(&self.ath_value, "ath")?;
        let ath_date = parse_date(&self.ath_date, "ath_date")?;

        if policy.reject_future_ath_date && ath_date > policy.today {
            return Err(BitageError::Validation {
                field: "ath_date".to_string(),
                reason: format!("{} is in the future", ath_date.format(DATE_FORMAT)),
            });
        }

        warn_on_invalid_rules(&self.buy_rules, RuleSide::Buy);
        warn_on_invalid_rules(&self.sell_rules, RuleSide::Sell);

        Ok(AccumulationPlan {
            id,
            name,
            ticker,
            ath_value,
            ath_date,
            buy_rules: self.buy_rules.trim().to_string(),
            sell_rules: self.sell_rules.trim().to_string(),
            disabled_sell,
        })
    }
}

impl SingleEntryDraft {
    pub fn validate(
        &self,
        id: Option<PlanId>,
        disabled_sell: DisabledRules,
    ) -> Result<SingleEntryPlan, BitageError> {
        let name = required_text(&self.name, "name")?;
        let ticker = required_text(&self.ticker, "ticker")?.to_uppercase();
        let purchase_price = positive_number(&self.purchase_price, "purchase_price")?;

        warn_on_invalid_rules(&self.sell_rules, RuleSide::Sell);

        Ok(SingleEntryPlan {
            id,
            name,
            ticker,
            purchase_price,
            sell_rules: self.sell_rules.trim().to_string(),
            disabled_sell,
        })
    }
}

fn required_text(value: &str, field: &str) -> Result<String, BitageError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BitageError::Validation {
            field: field.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn positive_number(value: &str, field: &str) -> Result<f64, BitageError> {
    let number: f64 = value.trim().parse().map_err(|_| BitageError::Validation {
        field: field.to_string(),
        reason: format!("'{}' is not a number", value.trim()),
    })?;
    if !number.is_finite() || number <= 0.0 {
        return Err(BitageError::Validation {
            field: field.to_string(),
            reason: format!("{} must be positive", field),
        });
    }
    Ok(number)
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, BitageError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| BitageError::Validation {
        field: field.to_string(),
        reason: format!("invalid {} format, expected YYYY-MM-DD", field),
    })
}

fn warn_on_invalid_rules(rules: &str, side: RuleSide) {
    let entries = rule_parser::parse(rules, side);
    for (index, err) in rule_parser::errors(&entries) {
        warn!(%side, index, error = %err, "plan saved with invalid rule");
    }
}
