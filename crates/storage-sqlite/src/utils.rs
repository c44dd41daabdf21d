//! Utility functions for SQLite storage operations.
//!
//! Decimal columns are stored as TEXT. Decoding is strict: a value that does
//! not parse is reported as a corrupt column instead of being read as zero.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::errors::StorageError;

/// Maximum number of parameters for SQLite IN (...) queries.
///
/// SQLite limits bound parameters per statement (SQLITE_MAX_VARIABLE_NUMBER,
/// typically 999). 500 leaves room for the other parameters of a query.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Splits a slice into chunks that fit in one `IN (...)` clause.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Parses a decimal column, accepting scientific notation as a fallback.
pub fn parse_decimal(column: &'static str, value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|e| StorageError::decode(column, format!("'{}': {}", value, e)))
}

/// Parses an enum stored by its `as_str()` text.
pub fn parse_enum<T>(column: &'static str, value: &str) -> Result<T, StorageError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    T::from_str(value).map_err(|e| StorageError::decode(column, e))
}

/// Canonical text for a decimal column.
pub fn decimal_text(value: Decimal) -> String {
    value.normalize().to_string()
}
