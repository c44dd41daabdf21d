/// Decimal places used when rendering amounts in alert messages.
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Share of a category limit (in percent) at which a budget needs attention.
pub const DEFAULT_ATTENTION_PERCENT: u32 = 80;

/// Days before a budget's end date at which it needs attention.
pub const DEFAULT_ENDING_SOON_DAYS: i64 = 7;

/// Goals due within this many days are candidates for a risk alert.
pub const DEFAULT_GOAL_RISK_WINDOW_DAYS: i64 = 30;

/// Goals below this completion percentage inside the risk window are at risk.
pub const DEFAULT_GOAL_RISK_PERCENT: u32 = 25;

/// Entities evaluated concurrently by a scheduled batch.
pub const DEFAULT_WORKER_CONCURRENCY: usize = 4;

/// Label used in messages for rules without a category restriction.
pub const ALL_CATEGORIES_LABEL: &str = "all categories";
