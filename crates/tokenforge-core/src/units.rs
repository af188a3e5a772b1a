//! Fixed-point token units
//!
//! The ledger only ever works with integer base units. These helpers convert
//! between base units and the decimal strings operators type and read
//! (`1 TFG = 10^18` base units).

use crate::types::Amount;
use thiserror::Error;

/// Decimal places of the default token
pub const DECIMALS: u8 = 18;

/// Largest decimals value whose scale factor fits in an [`Amount`]
pub const MAX_DECIMALS: u8 = 38;

/// One whole token in base units
pub const TOKEN: Amount = 10u128.pow(DECIMALS as u32);

/// Supply minted to the owner at deployment: 1 billion tokens
pub const INITIAL_SUPPLY: Amount = 1_000_000_000 * TOKEN;

/// Hard issuance ceiling: 10 billion tokens
pub const MAX_SUPPLY: Amount = 10_000_000_000 * TOKEN;

/// Errors parsing a decimal amount
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid character in amount: {0:?}")]
    InvalidDigit(char),

    #[error("amount has more than one decimal point")]
    MultiplePoints,

    #[error("amount has {found} fractional digits, at most {max} allowed")]
    TooManyDecimals { found: usize, max: u8 },

    #[error("amount does not fit in 128 bits")]
    Overflow,
}

/// Scale factor `10^decimals`, if it fits
pub fn scale(decimals: u8) -> Option<Amount> {
    10u128.checked_pow(decimals as u32)
}

/// Render base units as a decimal string
///
/// Always carries at least one fractional digit and never trailing zeros
/// beyond it: `1000 * TOKEN` renders as `"1000.0"`, `TOKEN / 2` as `"0.5"`.
pub fn format_units(amount: Amount, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return format!("{digits}.0");
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{fraction}")
    }
}

/// Parse a decimal string into base units
pub fn parse_units(text: &str, decimals: u8) -> Result<Amount, UnitsError> {
    let text = text.trim().replace('_', "");
    if text.is_empty() {
        return Err(UnitsError::Empty);
    }

    let mut parts = text.split('.');
    let whole = parts.next().unwrap_or_default();
    let mut fraction = parts.next().unwrap_or_default();
    if parts.next().is_some() {
        return Err(UnitsError::MultiplePoints);
    }
    if whole.is_empty() && fraction.is_empty() {
        return Err(UnitsError::Empty);
    }
    if let Some(c) = whole.chars().chain(fraction.chars()).find(|c| !c.is_ascii_digit()) {
        return Err(UnitsError::InvalidDigit(c));
    }
    if fraction.len() > decimals as usize {
        // Trailing zeros past the precision carry no value, e.g. "42.0" at zero decimals
        let (kept, excess) = fraction.split_at(decimals as usize);
        if excess.bytes().any(|b| b != b'0') {
            return Err(UnitsError::TooManyDecimals {
                found: fraction.len(),
                max: decimals,
            });
        }
        fraction = kept;
    }

    let base = scale(decimals).ok_or(UnitsError::Overflow)?;
    let whole_units = if whole.is_empty() {
        0
    } else {
        whole.parse::<Amount>().map_err(|_| UnitsError::Overflow)?
    };
    let fraction_units = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{fraction:0<width$}", width = decimals as usize);
        padded.parse::<Amount>().map_err(|_| UnitsError::Overflow)?
    };

    whole_units
        .checked_mul(base)
        .and_then(|v| v.checked_add(fraction_units))
        .ok_or(UnitsError::Overflow)
}
