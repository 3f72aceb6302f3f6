//! Goods and Services Tax on a single amount.

use serde::{Deserialize, Serialize};

use super::{ensure_amount, round2, CalcError};

/// Notified GST slabs, in percent.
pub const GST_RATES: &[f64] = &[0.0, 0.1, 0.25, 1.0, 1.5, 3.0, 5.0, 6.0, 7.5, 12.0, 18.0, 28.0, 40.0];

/// Whether the entered amount already contains GST.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GstMode {
    #[default]
    Exclusive,
    Inclusive,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GstInput {
    pub amount: f64,
    pub rate: f64,
    #[serde(default)]
    pub mode: GstMode,
    /// Inter-state supplies attract IGST instead of CGST + SGST.
    #[serde(default)]
    pub inter_state: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GstResult {
    pub base_amount: f64,
    pub gst_amount: f64,
    pub total_amount: f64,
    pub rate: f64,
    pub cgst: f64,
    pub sgst: f64,
    pub igst: f64,
}

pub fn is_supported_rate(rate: f64) -> bool {
    GST_RATES.iter().any(|r| (r - rate).abs() < f64::EPSILON)
}

pub fn calculate(input: &GstInput) -> Result<GstResult, CalcError> {
    ensure_amount("amount", input.amount)?;
    ensure_amount("rate", input.rate)?;
    if !is_supported_rate(input.rate) {
        return Err(CalcError::UnsupportedGstRate(input.rate));
    }

    let (base, gst) = match input.mode {
        GstMode::Exclusive => {
            let gst = input.amount * input.rate / 100.0;
            (input.amount, gst)
        }
        GstMode::Inclusive => {
            let base = input.amount * 100.0 / (100.0 + input.rate);
            (base, input.amount - base)
        }
    };

    let (cgst, sgst, igst) = if input.inter_state {
        (0.0, 0.0, gst)
    } else {
        (gst / 2.0, gst / 2.0, 0.0)
    };

    Ok(GstResult {
        base_amount: round2(base),
        gst_amount: round2(gst),
        total_amount: round2(base + gst),
        rate: input.rate,
        cgst: round2(cgst),
        sgst: round2(sgst),
        igst: round2(igst),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exclusive(amount: f64, rate: f64) -> GstInput {
        GstInput {
            amount,
            rate,
            mode: GstMode::Exclusive,
            inter_state: false,
        }
    }

    #[test]
    fn test_exclusive_adds_gst_on_top() {
        let result = calculate(&exclusive(10_000.0, 18.0)).unwrap();
        assert_eq!(result.base_amount, 10_000.0);
        assert_eq!(result.gst_amount, 1_800.0);
        assert_eq!(result.total_amount, 11_800.0);
        assert_eq!(result.cgst, 900.0);
        assert_eq!(result.sgst, 900.0);
        assert_eq!(result.igst, 0.0);
    }

    #[test]
    fn test_total_is_base_plus_rate_for_every_slab() {
        for &rate in GST_RATES {
            let result = calculate(&exclusive(2_500.0, rate)).unwrap();
            let expected = round2(2_500.0 + 2_500.0 * rate / 100.0);
            assert_eq!(result.total_amount, expected, "rate {rate}");
        }
    }

    #[test]
    fn test_inclusive_extracts_gst() {
        let result = calculate(&GstInput {
            amount: 11_800.0,
            rate: 18.0,
            mode: GstMode::Inclusive,
            inter_state: false,
        })
        .unwrap();
        assert_eq!(result.base_amount, 10_000.0);
        assert_eq!(result.gst_amount, 1_800.0);
        assert_eq!(result.total_amount, 11_800.0);
    }

    #[test]
    fn test_inter_state_goes_to_igst() {
        let mut input = exclusive(1_000.0, 12.0);
        input.inter_state = true;
        let result = calculate(&input).unwrap();
        assert_eq!(result.igst, 120.0);
        assert_eq!(result.cgst, 0.0);
    }

    #[test]
    fn test_unsupported_rate_is_rejected() {
        assert_eq!(
            calculate(&exclusive(1_000.0, 17.0)),
            Err(CalcError::UnsupportedGstRate(17.0))
        );
    }

    #[test]
    fn test_mode_deserializes_lowercase() {
        let input: GstInput =
            serde_json::from_str(r#"{"amount":100,"rate":5,"mode":"inclusive"}"#).unwrap();
        assert_eq!(input.mode, GstMode::Inclusive);
        assert!(!input.inter_state);
    }
}
