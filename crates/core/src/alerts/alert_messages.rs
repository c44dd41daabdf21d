//! Human-readable alert messages. Amounts are always rendered with two
//! decimal places.

use rust_decimal::Decimal;

use crate::constants::ALL_CATEGORIES_LABEL;
use crate::rules::{ConditionType, RulePeriod};
use crate::utils::decimal_utils::format_amount;

pub fn budget_exceeded_message(
    budget_name: &str,
    category_name: &str,
    limit_amount: Decimal,
    spent_amount: Decimal,
) -> String {
    format!(
        "Budget '{}': category '{}' has exceeded its limit of {} (spent {}, over by {}).",
        budget_name,
        category_name,
        format_amount(limit_amount),
        format_amount(spent_amount),
        format_amount(spent_amount - limit_amount),
    )
}

pub fn rule_triggered_message(
    category_name: Option<&str>,
    condition: ConditionType,
    threshold: Decimal,
    period: RulePeriod,
    current_sum: Decimal,
) -> String {
    format!(
        "Spending for {} has {} {} over {} (current total: {}).",
        category_name.unwrap_or(ALL_CATEGORIES_LABEL),
        condition.describe(),
        format_amount(threshold),
        period.describe(),
        format_amount(current_sum),
    )
}

pub fn goal_completed_message(goal_name: &str, target_amount: Decimal, currency: &str) -> String {
    format!(
        "Goal '{}' reached its target of {} {}.",
        goal_name,
        format_amount(target_amount),
        currency
    )
}

pub fn goal_at_risk_message(
    goal_name: &str,
    days_remaining: i64,
    percent_complete: Decimal,
    amount_required: Decimal,
    currency: &str,
) -> String {
    format!(
        "Goal '{}' is at risk: {} day{} remaining, {}% complete, {} {} still required.",
        goal_name,
        days_remaining,
        if days_remaining == 1 { "" } else { "s" },
        format_amount(percent_complete),
        format_amount(amount_required),
        currency
    )
}
