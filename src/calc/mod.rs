/*!
 * Calculators
 * Pure tax computations behind the /api/calculators routes
 */
pub mod gst;
pub mod gstin;
pub mod hra;
pub mod income_tax;
pub mod tds;

use thiserror::Error;

/// Input rejected by a calculator before any arithmetic runs.
#[derive(Debug, Error, PartialEq)]
pub enum CalcError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} cannot be negative")]
    Negative { field: &'static str },

    #[error("Unsupported GST rate: {0}%")]
    UnsupportedGstRate(f64),

    #[error("Unknown TDS section: {0}")]
    UnknownSection(String),
}

/// Reject NaN, infinities and negative amounts.
pub(crate) fn ensure_amount(field: &'static str, value: f64) -> Result<(), CalcError> {
    if !value.is_finite() {
        return Err(CalcError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(CalcError::Negative { field });
    }
    Ok(())
}

/// Round to the nearest multiple of `step` (half away from zero).
pub fn round_to_nearest(value: f64, step: f64) -> f64 {
    (value / step).round() * step
}

/// Round to paise so responses don't leak float noise.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_amount_rejects_negative_and_nan() {
        assert_eq!(
            ensure_amount("amount", -1.0),
            Err(CalcError::Negative { field: "amount" })
        );
        assert_eq!(
            ensure_amount("amount", f64::NAN),
            Err(CalcError::NotFinite { field: "amount" })
        );
        assert!(ensure_amount("amount", 0.0).is_ok());
    }

    #[test]
    fn test_round_to_nearest_ten() {
        assert_eq!(round_to_nearest(81_900.0, 10.0), 81_900.0);
        assert_eq!(round_to_nearest(81_904.0, 10.0), 81_900.0);
        assert_eq!(round_to_nearest(81_905.0, 10.0), 81_910.0);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(10.005_000_1), 10.01);
        assert_eq!(round2(3.14159), 3.14);
    }
}
