use std::str::FromStr;

use chrono_tz::Tz;
use spendwatch_core::settings::EvaluationSettings;

const DEFAULT_DB_PATH: &str = "./db/spendwatch.db";
const DEFAULT_DAILY_RUN_HOUR: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Daemon configuration, read from `SW_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub log_format: LogFormat,
    pub timezone: Tz,
    /// UTC hour at which the daily batches run.
    pub daily_run_hour: u32,
    pub settings: EvaluationSettings,
    /// Rejected values, logged once tracing is up.
    pub warnings: Vec<String>,
}

impl Config {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();
        let defaults = EvaluationSettings::default();
        let settings = EvaluationSettings {
            worker_concurrency: parse_or(
                &lookup,
                &mut warnings,
                "SW_WORKER_CONCURRENCY",
                defaults.worker_concurrency,
                |v: &usize| *v > 0,
            ),
            ending_soon_days: parse_or(
                &lookup,
                &mut warnings,
                "SW_ENDING_SOON_DAYS",
                defaults.ending_soon_days,
                |v: &i64| *v >= 0,
            ),
            ..defaults
        };

        let log_format = match lookup("SW_LOG_FORMAT") {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(v) if v.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(v) => {
                warnings.push(format!("Invalid SW_LOG_FORMAT='{}', using text", v));
                LogFormat::Text
            }
            None => LogFormat::Text,
        };

        Self {
            db_path: lookup("SW_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            log_format,
            timezone: parse_or(&lookup, &mut warnings, "SW_TIMEZONE", Tz::UTC, |_| true),
            daily_run_hour: parse_or(
                &lookup,
                &mut warnings,
                "SW_DAILY_RUN_HOUR",
                DEFAULT_DAILY_RUN_HOUR,
                |v: &u32| *v < 24,
            ),
            settings,
            warnings,
        }
    }
}

/// Parses `key`, falling back to `default` with a warning when the value is
/// malformed or rejected by `valid`.
fn parse_or<T, F, V>(
    lookup: &F,
    warnings: &mut Vec<String>,
    key: &str,
    default: T,
    valid: V,
) -> T
where
    T: FromStr + std::fmt::Debug,
    F: Fn(&str) -> Option<String>,
    V: Fn(&T) -> bool,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) if valid(&value) => value,
        _ => {
            warnings.push(format!("Invalid {}='{}', using default {:?}", key, raw, default));
            default
        }
    }
}
