//! House Rent Allowance exemption (section 10(13A)).

use serde::{Deserialize, Serialize};

use super::{ensure_amount, round2, CalcError};

/// Share of basic+DA exempt in metro cities (Delhi, Mumbai, Kolkata, Chennai).
const METRO_RATE: f64 = 0.50;
const NON_METRO_RATE: f64 = 0.40;
/// Share of basic+DA that rent must exceed before any of it counts.
const RENT_FLOOR_RATE: f64 = 0.10;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HraInput {
    pub basic_salary: f64,
    #[serde(default)]
    pub dearness_allowance: f64,
    pub hra_received: f64,
    pub rent_paid: f64,
    #[serde(default)]
    pub metro: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HraResult {
    pub exemption: f64,
    pub taxable_hra: f64,
    /// Actual HRA received.
    pub actual_hra: f64,
    /// 50% / 40% of basic+DA.
    pub salary_limit: f64,
    /// Rent paid in excess of 10% of basic+DA (never negative).
    pub rent_excess: f64,
}

impl HraInput {
    fn validate(&self) -> Result<(), CalcError> {
        ensure_amount("basicSalary", self.basic_salary)?;
        ensure_amount("dearnessAllowance", self.dearness_allowance)?;
        ensure_amount("hraReceived", self.hra_received)?;
        ensure_amount("rentPaid", self.rent_paid)
    }
}

/// Exemption is the least of the three statutory limbs.
pub fn calculate(input: &HraInput) -> Result<HraResult, CalcError> {
    input.validate()?;

    let salary = input.basic_salary + input.dearness_allowance;
    let rate = if input.metro { METRO_RATE } else { NON_METRO_RATE };

    let actual_hra = input.hra_received;
    let salary_limit = salary * rate;
    let rent_excess = (input.rent_paid - salary * RENT_FLOOR_RATE).max(0.0);

    let exemption = actual_hra.min(salary_limit).min(rent_excess);

    Ok(HraResult {
        exemption: round2(exemption),
        taxable_hra: round2(actual_hra - exemption),
        actual_hra: round2(actual_hra),
        salary_limit: round2(salary_limit),
        rent_excess: round2(rent_excess),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(basic: f64, hra: f64, rent: f64, metro: bool) -> HraInput {
        HraInput {
            basic_salary: basic,
            dearness_allowance: 0.0,
            hra_received: hra,
            rent_paid: rent,
            metro,
        }
    }

    #[test]
    fn test_metro_example_picks_rent_limb() {
        let result = calculate(&input(600_000.0, 300_000.0, 240_000.0, true)).unwrap();
        assert_eq!(result.salary_limit, 300_000.0);
        assert_eq!(result.rent_excess, 180_000.0);
        assert_eq!(result.exemption, 180_000.0);
        assert_eq!(result.taxable_hra, 120_000.0);
    }

    #[test]
    fn test_non_metro_uses_forty_percent() {
        let result = calculate(&input(500_000.0, 250_000.0, 600_000.0, false)).unwrap();
        assert_eq!(result.salary_limit, 200_000.0);
        assert_eq!(result.exemption, 200_000.0);
    }

    #[test]
    fn test_no_rent_means_no_exemption() {
        let result = calculate(&input(600_000.0, 300_000.0, 0.0, true)).unwrap();
        assert_eq!(result.rent_excess, 0.0);
        assert_eq!(result.exemption, 0.0);
        assert_eq!(result.taxable_hra, 300_000.0);
    }

    #[test]
    fn test_rent_below_floor_means_no_exemption() {
        let result = calculate(&input(600_000.0, 300_000.0, 50_000.0, true)).unwrap();
        assert_eq!(result.exemption, 0.0);
    }

    #[test]
    fn test_dearness_allowance_counts_towards_salary() {
        let mut hra = input(400_000.0, 300_000.0, 240_000.0, true);
        hra.dearness_allowance = 200_000.0;
        let result = calculate(&hra).unwrap();
        assert_eq!(result.salary_limit, 300_000.0);
        assert_eq!(result.exemption, 180_000.0);
    }

    #[test]
    fn test_actual_hra_caps_exemption() {
        let result = calculate(&input(1_000_000.0, 100_000.0, 600_000.0, true)).unwrap();
        assert_eq!(result.exemption, 100_000.0);
        assert_eq!(result.taxable_hra, 0.0);
    }

    #[test]
    fn test_negative_rent_is_rejected() {
        let err = calculate(&input(600_000.0, 300_000.0, -1.0, true)).unwrap_err();
        assert_eq!(err, CalcError::Negative { field: "rentPaid" });
    }
}
