use qupled::core::theory::{TableKey, UnknownTableError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),

    #[error("Key cannot be empty in '{0}'.")]
    EmptyKey(String),

    #[error(
        "{0}. Expected one of: adr, bf, idr, rdf, sdr, slfc, ssf, ssfHF."
    )]
    UnknownTable(#[from] UnknownTableError),
}

/// Splits `KEY=VALUE` at the first `=`.
pub fn parse_key_value(pair: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidKeyValue(pair.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::EmptyKey(pair.to_string()));
    }
    Ok((key, value))
}

/// Parses table names, skipping empty entries left by trailing commas.
pub fn parse_tables(names: &[String]) -> Result<Vec<TableKey>, ParseError> {
    names
        .iter()
        .filter(|name| !name.trim().is_empty())
        .map(|name| name.parse::<TableKey>().map_err(ParseError::from))
        .collect()
}
