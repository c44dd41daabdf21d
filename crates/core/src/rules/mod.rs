//! Rules module - threshold rules evaluated over rolling windows.

mod rules_model;
mod rules_service;
mod rules_traits;


pub use rules_model::{
    ConditionType, NewRule, Rule, RuleEvaluation, RuleOutcome, RulePeriod, RuleSkipReason,
};
pub use rules_service::RuleService;
pub use rules_traits::{RuleRepositoryTrait, RuleServiceTrait};
