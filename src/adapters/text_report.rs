//! Plain-text rendering of plans, rule diagnostics and recommendations.

use crate::domain::disabled_rules::DisabledRules;
use crate::domain::error::MetricError;
use crate::domain::plan::{
    AccumulationEvaluation, AccumulationPlan, Plan, SingleEntryEvaluation, SingleEntryPlan,
};
use crate::domain::plan_validation::DATE_FORMAT;
use crate::domain::rule::{PlanRule, RuleEntry, RuleSide};
use crate::domain::rule_eval::{Action, PriceTrigger, trigger_for};
use crate::domain::snapshot::PriceSnapshot;

const AWAITING_DATA: &str = "Awaiting market data...";
const NO_RULES: &str = "No rules defined.";
const NO_BUY: &str = "no buy action.";
const NO_SELL: &str = "no sell action.";

/// Format with two decimals and `,` thousands separators.
pub fn format_price(value: f64) -> String {
    format_grouped(value, 2)
}

fn format_grouped(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && raw.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// One-line description of a rule, in absolute prices when `base` is known.
pub fn describe_rule(rule: &PlanRule, base: Option<f64>) -> String {
    let condition = match (base.map(|b| trigger_for(rule, b)), rule) {
        (Some(PriceTrigger::AtOrBelow(p)), PlanRule::ThresholdBuy { factor, .. }) => {
            format!("p <= {} ({:.2})", format_grouped(p, 3), factor)
        }
        (
            Some(PriceTrigger::Within { lower, upper }),
            PlanRule::RangeBuy {
                upper_factor,
                lower_factor,
                ..
            },
        ) => format!(
            "p ~ {} - {} ({:.2}-{:.2})",
            format_grouped(lower, 3),
            format_grouped(upper, 3),
            lower_factor,
            upper_factor
        ),
        (Some(PriceTrigger::AtOrAbove(p)), PlanRule::ThresholdSell { factor, .. }) => {
            format!("p >= {} ({:.2})", format_grouped(p, 3), factor)
        }
        (_, PlanRule::ThresholdBuy { factor, .. }) => format!("p <= {:.2} x base", factor),
        (
            _,
            PlanRule::RangeBuy {
                upper_factor,
                lower_factor,
                ..
            },
        ) => format!("p ~ {:.2}-{:.2} x base", lower_factor, upper_factor),
        (_, PlanRule::ThresholdSell { factor, .. }) => format!("p >= {:.2} x base", factor),
    };

    let outcome = match rule {
        PlanRule::ThresholdBuy { amount, .. } | PlanRule::RangeBuy { amount, .. } => {
            format!("buy {}", amount)
        }
        PlanRule::ThresholdSell { position_pct, .. } => format!("sell {}%", position_pct),
    };

    format!("{condition} -> {outcome}")
}

fn describe_entry(entry: &RuleEntry, base: Option<f64>) -> String {
    match &entry.rule {
        Ok(rule) => format!("[{}] {}", entry.index, describe_rule(rule, base)),
        Err(e) => format!("[{}] invalid rule: '{}' ({})", entry.index, entry.source, e),
    }
}

fn render_buy_rules(out: &mut String, entries: &[RuleEntry], base: Option<f64>) {
    out.push_str("Buy plan\n");
    let Some(base) = base else {
        out.push_str(&format!("  {AWAITING_DATA}\n"));
        return;
    };
    if entries.is_empty() {
        out.push_str(&format!("  {NO_RULES}\n"));
        return;
    }
    out.push_str(&format!("  Base: observed ATH = {}\n", format_price(base)));
    for entry in entries {
        out.push_str(&format!("  {}\n", describe_entry(entry, Some(base))));
    }
}

fn render_sell_rules(
    out: &mut String,
    entries: &[RuleEntry],
    base: f64,
    base_label: &str,
    disabled: &DisabledRules,
) {
    out.push_str("Sell plan (enabled/disabled)\n");
    out.push_str(&format!("  Base: {} = {}\n", base_label, format_price(base)));
    if entries.is_empty() {
        out.push_str(&format!("  {NO_RULES}\n"));
        return;
    }
    for entry in entries {
        let mark = if disabled.contains(entry.index) { " " } else { "x" };
        out.push_str(&format!("  [{}] {}\n", mark, describe_entry(entry, Some(base))));
    }
}

fn render_action(out: &mut String, label: &str, action: Option<&Action>, none: &str) {
    match action {
        Some(a) => out.push_str(&format!("  {label}: {a}\n")),
        None => out.push_str(&format!("  {label}: {none}\n")),
    }
}

fn render_percent(out: &mut String, label: &str, value: Result<f64, MetricError>) {
    match value {
        Ok(v) => out.push_str(&format!("  {label}: {v:.2}%\n")),
        Err(e) => out.push_str(&format!("  {label}: unavailable ({e})\n")),
    }
}

pub fn render_accumulation(plan: &AccumulationPlan, eval: &AccumulationEvaluation) -> String {
    let mut out = String::new();
    out.push_str(&format!("--- {} ({}) ---\n", plan.name, plan.ticker));
    out.push_str(&format!(
        "Recorded ATH: {} USD ({})\n",
        format_price(plan.ath_value),
        plan.ath_date.format(DATE_FORMAT)
    ));
    out.push('\n');

    let observed_ath = eval.market.as_ref().map(|m| m.snapshot.ath_now);
    render_buy_rules(&mut out, &eval.buy_rules, observed_ath);
    out.push('\n');
    render_sell_rules(
        &mut out,
        &eval.sell_rules,
        plan.ath_value,
        "recorded ATH",
        &plan.disabled_sell,
    );
    out.push('\n');

    out.push_str("Market analysis\n");
    let Some(market) = &eval.market else {
        out.push_str(&format!("  No market data available for {}.\n", plan.ticker));
        return out;
    };
    let snap = &market.snapshot;
    out.push_str(&format!("  Price: {} USD\n", format_price(snap.price)));
    out.push_str(&format!(
        "  Observed ATH: {} USD ({})\n",
        format_price(snap.ath_now),
        snap.ath_date.format(DATE_FORMAT)
    ));
    render_percent(
        &mut out,
        "Price over ATH",
        market.metrics.map(|m| m.price_over_ath_pct),
    );
    render_percent(
        &mut out,
        "Current drawdown from ATH",
        market.metrics.map(|m| m.current_drawdown_pct),
    );
    render_percent(
        &mut out,
        "Max drawdown since ATH",
        market.metrics.map(|m| m.max_drawdown_pct),
    );
    out.push('\n');

    out.push_str("Recommended actions\n");
    render_action(&mut out, "Buy", market.buy.as_ref(), NO_BUY);
    render_action(&mut out, "Sell", market.sell.as_ref(), NO_SELL);
    out
}

pub fn render_single_entry(plan: &SingleEntryPlan, eval: &SingleEntryEvaluation) -> String {
    let mut out = String::new();
    out.push_str(&format!("--- {} ({}) ---\n", plan.name, plan.ticker));
    out.push_str(&format!("Purchase price: {} USD\n", format_price(plan.purchase_price)));
    out.push('\n');

    render_sell_rules(
        &mut out,
        &eval.sell_rules,
        plan.purchase_price,
        "purchase price",
        &plan.disabled_sell,
    );
    out.push('\n');

    out.push_str("Market analysis\n");
    let Some(market) = &eval.market else {
        out.push_str(&format!("  No market data available for {}.\n", plan.ticker));
        return out;
    };
    out.push_str(&format!("  Price: {} USD\n", format_price(market.snapshot.price)));
    render_percent(&mut out, "Profit/loss", market.profit.map(|p| p.profit_pct));
    out.push('\n');

    out.push_str("Recommended actions\n");
    render_action(&mut out, "Sell", market.sell.as_ref(), NO_SELL);
    out
}

pub fn render_plan_list(plans: &[Plan]) -> String {
    if plans.is_empty() {
        return "No plans.\n".to_string();
    }
    let mut out = String::new();
    out.push_str(&format!("{:<5} {:<13} {:<24} {}\n", "ID", "KIND", "NAME", "TICKER"));
    for plan in plans {
        let id = plan.id().map(|i| i.to_string()).unwrap_or_else(|| "-".into());
        out.push_str(&format!(
            "{:<5} {:<13} {:<24} {}\n",
            id,
            plan.kind().to_string(),
            plan.name(),
            plan.ticker()
        ));
    }
    out
}

/// Per-token diagnostics for a rule list; malformed tokens get a caret
/// pointing into `input`.
pub fn render_rule_check(input: &str, side: RuleSide, entries: &[RuleEntry]) -> String {
    let mut out = String::new();
    if entries.is_empty() {
        out.push_str(&format!("{NO_RULES}\n"));
        return out;
    }
    out.push_str(&format!("{} rules: {}\n", side, entries.len()));
    for entry in entries {
        match &entry.rule {
            Ok(rule) => {
                out.push_str(&format!("  [{}] ok: {}\n", entry.index, describe_rule(rule, None)));
            }
            Err(e) => {
                out.push_str(&format!("  [{}] invalid rule: '{}'\n", entry.index, entry.source));
                for line in e.display_with_context(input).lines() {
                    out.push_str(&format!("      {line}\n"));
                }
            }
        }
    }
    out
}

pub fn render_snapshot(ticker: &str, snapshot: Option<&PriceSnapshot>) -> String {
    match snapshot {
        None => format!("No market data available for {ticker}.\n"),
        Some(s) => {
            let mut out = String::new();
            out.push_str(&format!("{ticker}\n"));
            out.push_str(&format!("  Price: {} USD\n", format_price(s.price)));
            out.push_str(&format!(
                "  ATH: {} USD ({})\n",
                format_price(s.ath_now),
                s.ath_date.format(DATE_FORMAT)
            ));
            out.push_str(&format!("  Low since ATH: {} USD\n", format_price(s.low_since_ath)));
            out
        }
    }
}
