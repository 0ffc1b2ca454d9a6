//! Core domain types and logic: rules, evaluation, metrics and plans.

pub mod ohlcv;
pub mod snapshot;
pub mod rule;
pub mod rule_parser;
pub mod rule_eval;
pub mod disabled_rules;
pub mod metrics;
pub mod plan;
pub mod plan_validation;
pub mod error;
