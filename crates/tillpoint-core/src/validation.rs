//! # Input Validation
//!
//! Field-level validation run at the edge, before business logic and before
//! any I/O. The front end calls these on form submit; the server calls the
//! same functions again on receipt, so a request that slipped past the
//! client never reaches the database.
//!
//! ## Validation Order
//! ```text
//! form input ──▶ validation (this module) ──▶ business rules ──▶ persistence
//!                     │
//!                     └── on failure: inline field error, no network call
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Field Limits
// =============================================================================

/// Maximum length for short text fields (names, SKUs, categories).
pub const MAX_NAME_LEN: usize = 120;

/// Maximum length for free-form notes and descriptions.
pub const MAX_NOTES_LEN: usize = 1000;

/// Highest amount a single form accepts, in cents (10 million units).
///
/// Catches fat-finger entries like a missing decimal point.
pub const MAX_AMOUNT_CENTS: i64 = 1_000_000_000;

/// Highest tax rate accepted, in basis points (100%).
pub const MAX_TAX_RATE_BPS: i64 = 10_000;

// =============================================================================
// Amount Parsing
// =============================================================================

/// Parses a user-typed decimal amount into [`Money`].
///
/// Accepts plain decimal notation with up to two fraction digits
/// (`"50"`, `"50.5"`, `"50.00"`). Rejects empty input, non-numeric input,
/// non-positive amounts, more than two fraction digits, and anything above
/// [`MAX_AMOUNT_CENTS`]. `"50.00"` parses to exactly 5000 cents; no float
/// ever touches the value.
pub fn parse_cash_amount(field: &str, input: &str) -> Result<Money, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let invalid = || ValidationError::InvalidAmount {
        field: field.to_string(),
    };

    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if whole.is_empty() || frac.len() > 2 {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let units: i64 = whole.parse().map_err(|_| invalid())?;
    let mut cents_part: i64 = if frac.is_empty() {
        0
    } else {
        frac.parse().map_err(|_| invalid())?
    };
    if frac.len() == 1 {
        cents_part *= 10;
    }

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(cents_part))
        .ok_or_else(invalid)?;

    if cents <= 0 {
        return Err(invalid());
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(Money::from_cents(cents))
}

/// Validates an amount already expressed in cents (API payloads).
pub fn validate_amount_cents(field: &str, cents: i64) -> Result<Money, ValidationError> {
    if cents <= 0 {
        return Err(ValidationError::InvalidAmount {
            field: field.to_string(),
        });
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(Money::from_cents(cents))
}

// =============================================================================
// Text Fields
// =============================================================================

/// Requires a non-empty trimmed value, capped at `max` characters.
pub fn require_text(field: &str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(trimmed.to_string())
}

/// Caps an optional text field at `max` characters; empty becomes `None`.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => {
            if trimmed.chars().count() > max {
                return Err(ValidationError::TooLong {
                    field: field.to_string(),
                    max,
                });
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

// =============================================================================
// Identifiers and Ranges
// =============================================================================

/// Validates a UUID path or payload parameter.
pub fn validate_uuid(field: &str, value: &str) -> Result<String, ValidationError> {
    uuid::Uuid::parse_str(value)
        .map(|u| u.to_string())
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected a UUID".to_string(),
        })
}

/// Validates a tax rate in basis points (0 ..= 100%).
pub fn validate_rate_bps(field: &str, bps: i64) -> Result<u32, ValidationError> {
    if !(0..=MAX_TAX_RATE_BPS).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_TAX_RATE_BPS,
        });
    }
    Ok(bps as u32)
}

/// Validates a period: both endpoints present and start <= end.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if start > end {
        return Err(ValidationError::InvalidDateRange {
            reason: format!("start {start} is after end {end}"),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_cents() {
        assert_eq!(parse_cash_amount("amount", "50.00").unwrap().cents(), 5000);
        assert_eq!(parse_cash_amount("amount", "50").unwrap().cents(), 5000);
        assert_eq!(parse_cash_amount("amount", "50.5").unwrap().cents(), 5050);
        assert_eq!(parse_cash_amount("amount", "0.01").unwrap().cents(), 1);
        assert_eq!(parse_cash_amount("amount", " 12.34 ").unwrap().cents(), 1234);
    }

    #[test]
    fn rejects_bad_amounts() {
        // Property: amount must parse as a finite number > 0; otherwise the
        // submission is rejected locally.
        for input in ["", "abc", "-5", "0", "0.00", "1.234", "1e3", ".50", "1,50", "NaN"] {
            assert!(
                parse_cash_amount("amount", input).is_err(),
                "accepted {input:?}"
            );
        }
    }

    #[test]
    fn rejects_implausibly_large_amounts() {
        let err = parse_cash_amount("amount", "99999999999").unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
        assert!(parse_cash_amount("amount", "10000000.00").is_ok());
    }

    #[test]
    fn cents_validation_mirrors_parsing() {
        assert!(validate_amount_cents("amount", 1).is_ok());
        assert!(validate_amount_cents("amount", 0).is_err());
        assert!(validate_amount_cents("amount", -100).is_err());
        assert!(validate_amount_cents("amount", MAX_AMOUNT_CENTS + 1).is_err());
    }

    #[test]
    fn text_fields_trim_and_cap() {
        assert_eq!(require_text("name", "  Rent  ", 10).unwrap(), "Rent");
        assert!(require_text("name", "   ", 10).is_err());
        assert!(require_text("name", "abcdefghijk", 10).is_err());

        assert_eq!(optional_text("notes", None, 10).unwrap(), None);
        assert_eq!(optional_text("notes", Some("  "), 10).unwrap(), None);
        assert_eq!(
            optional_text("notes", Some(" hi "), 10).unwrap(),
            Some("hi".to_string())
        );
    }

    #[test]
    fn uuid_and_range_checks() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "not-a-uuid").is_err());

        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert!(validate_date_range(d("2026-01-01"), d("2026-03-31")).is_ok());
        assert!(validate_date_range(d("2026-01-01"), d("2026-01-01")).is_ok());
        assert!(validate_date_range(d("2026-03-31"), d("2026-01-01")).is_err());

        assert_eq!(validate_rate_bps("rate", 1500).unwrap(), 1500);
        assert!(validate_rate_bps("rate", 10_001).is_err());
        assert!(validate_rate_bps("rate", -1).is_err());
    }
}
