//! Domain error types.

use crate::domain::plan::{PlanId, PlanKind};

/// A parse error with position information for rule parsing.
///
/// `position` is the byte offset in the full rule-list string, so a
/// diagnostic can point at the offending token or field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// A metric whose denominator is zero. The metric is unavailable; nothing else is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MetricError {
    #[error("{metric} is undefined: denominator is zero")]
    DivisionUndefined { metric: &'static str },
}

/// Top-level error type for bitage.
#[derive(Debug, thiserror::Error)]
pub enum BitageError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {kind} plan with id {id}")]
    PlanNotFound { kind: PlanKind, id: PlanId },

    #[error("sell rule index {index} out of range: plan has {count} sell rules")]
    RuleIndexOutOfRange { index: usize, count: usize },

    #[error("no market data for {ticker}")]
    DataUnavailable { ticker: String },

    #[error("market data error for {ticker}: {reason}")]
    MarketData { ticker: String, reason: String },
}

impl From<&BitageError> for std::process::ExitCode {
    fn from(err: &BitageError) -> Self {
        let code: u8 = match err {
            BitageError::ConfigParse { .. }
            | BitageError::ConfigMissing { .. }
            | BitageError::ConfigInvalid { .. } => 2,
            BitageError::Database { .. } | BitageError::DatabaseQuery { .. } => 3,
            BitageError::Validation { .. }
            | BitageError::RuleIndexOutOfRange { .. } => 4,
            BitageError::DataUnavailable { .. } | BitageError::MarketData { .. } => 5,
            BitageError::PlanNotFound { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_caret_points_at_position() {
        let err = ParseError {
            message: "invalid number 'abc'".into(),
            position: 6,
        };
        let rendered = err.display_with_context("0.8,1;abc,2");
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "0.8,1;abc,2");
        assert_eq!(lines[1], "      ^");
        assert_eq!(lines[2], "parse error at position 6: invalid number 'abc'");
    }

    #[test]
    fn metric_error_names_the_metric() {
        let err = MetricError::DivisionUndefined {
            metric: "profit_pct",
        };
        assert_eq!(
            err.to_string(),
            "profit_pct is undefined: denominator is zero"
        );
    }

    #[test]
    fn exit_codes_by_category() {
        use std::process::ExitCode;

        let not_found = BitageError::PlanNotFound {
            kind: PlanKind::Accumulation,
            id: 3,
        };
        assert_eq!(ExitCode::from(&not_found), ExitCode::from(6));

        let validation = BitageError::Validation {
            field: "ticker".into(),
            reason: "must not be empty".into(),
        };
        assert_eq!(ExitCode::from(&validation), ExitCode::from(4));

        let missing = BitageError::ConfigMissing {
            section: "sqlite".into(),
            key: "path".into(),
        };
        assert_eq!(ExitCode::from(&missing), ExitCode::from(2));
    }

    #[test]
    fn plan_not_found_message() {
        let err = BitageError::PlanNotFound {
            kind: PlanKind::SingleEntry,
            id: 9,
        };
        assert_eq!(err.to_string(), "no single-entry plan with id 9");
    }
}
