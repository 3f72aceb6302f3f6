//! Individual income tax under the old and new regimes.
//!
//! Pipeline for both regimes: taxable income → slab tax → section 87A
//! rebate → surcharge (with marginal relief) → 4% cess → round to ₹10.

use serde::{Deserialize, Serialize};

use super::{ensure_amount, hra, round2, round_to_nearest, CalcError};

const CESS_RATE: f64 = 4.0;
const OLD_STANDARD_DEDUCTION: f64 = 50_000.0;
const OLD_REBATE_THRESHOLD: f64 = 500_000.0;
const OLD_REBATE_MAX: f64 = 12_500.0;

const CAP_80C: f64 = 150_000.0;
const CAP_80D: f64 = 25_000.0;
const CAP_80D_SENIOR: f64 = 50_000.0;
const CAP_80CCD_1B: f64 = 50_000.0;
const CAP_HOME_LOAN_INTEREST: f64 = 200_000.0;
const CAP_PROFESSIONAL_TAX: f64 = 2_500.0;
const CAP_80TTA: f64 = 10_000.0;
const CAP_80TTB: f64 = 50_000.0;

/// A band starting at `from` taxed at `rate` percent up to the next band.
#[derive(Debug, Clone, Copy)]
struct Band {
    from: f64,
    rate: f64,
}

const fn band(from: f64, rate: f64) -> Band {
    Band { from, rate }
}

const NEW_SLABS_FY2024_25: &[Band] = &[
    band(0.0, 0.0),
    band(300_000.0, 5.0),
    band(600_000.0, 10.0),
    band(900_000.0, 15.0),
    band(1_200_000.0, 20.0),
    band(1_500_000.0, 30.0),
];

const NEW_SLABS_FY2025_26: &[Band] = &[
    band(0.0, 0.0),
    band(400_000.0, 5.0),
    band(800_000.0, 10.0),
    band(1_200_000.0, 15.0),
    band(1_600_000.0, 20.0),
    band(2_000_000.0, 25.0),
    band(2_400_000.0, 30.0),
];

const OLD_SURCHARGE: &[Band] = &[
    band(5_000_000.0, 10.0),
    band(10_000_000.0, 15.0),
    band(20_000_000.0, 25.0),
    band(50_000_000.0, 37.0),
];

/// The new regime caps surcharge at 25%.
const NEW_SURCHARGE: &[Band] = &[
    band(5_000_000.0, 10.0),
    band(10_000_000.0, 15.0),
    band(20_000_000.0, 25.0),
];

// ============================================================================
// Input types
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinancialYear {
    #[serde(rename = "2024-25")]
    Fy2024_25,
    #[default]
    #[serde(rename = "2025-26")]
    Fy2025_26,
}

impl FinancialYear {
    fn new_regime_slabs(self) -> &'static [Band] {
        match self {
            FinancialYear::Fy2024_25 => NEW_SLABS_FY2024_25,
            FinancialYear::Fy2025_26 => NEW_SLABS_FY2025_26,
        }
    }

    pub fn new_regime_standard_deduction(self) -> f64 {
        match self {
            FinancialYear::Fy2024_25 | FinancialYear::Fy2025_26 => 75_000.0,
        }
    }

    pub fn new_regime_rebate_threshold(self) -> f64 {
        match self {
            FinancialYear::Fy2024_25 => 700_000.0,
            FinancialYear::Fy2025_26 => 1_200_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeGroup {
    #[default]
    #[serde(rename = "below60")]
    BelowSixty,
    #[serde(rename = "60to80")]
    Senior,
    #[serde(rename = "above80")]
    SuperSenior,
}

impl AgeGroup {
    pub fn basic_exemption(self) -> f64 {
        match self {
            AgeGroup::BelowSixty => 250_000.0,
            AgeGroup::Senior => 300_000.0,
            AgeGroup::SuperSenior => 500_000.0,
        }
    }

    fn is_senior(self) -> bool {
        !matches!(self, AgeGroup::BelowSixty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Old,
    New,
}

/// Claimed deductions. Only the new regime's standard deduction applies
/// under the new regime; everything here is old-regime only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Deductions {
    pub section_80c: f64,
    pub section_80d: f64,
    pub section_80ccd_1b: f64,
    pub home_loan_interest: f64,
    /// Pre-computed HRA exemption; ignored when `hra` is supplied.
    pub hra_exemption: f64,
    pub hra: Option<hra::HraInput>,
    pub lta: f64,
    pub professional_tax: f64,
    /// Savings/deposit interest claimed under 80TTA (80TTB for seniors).
    pub savings_interest: f64,
    pub other: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeTaxInput {
    #[serde(default)]
    pub financial_year: FinancialYear,
    #[serde(default)]
    pub age_group: AgeGroup,
    /// `None` runs both regimes and compares them.
    #[serde(default)]
    pub regime: Option<Regime>,
    #[serde(default, alias = "grossSalary")]
    pub salary_income: f64,
    #[serde(default)]
    pub interest_income: f64,
    #[serde(default)]
    pub other_income: f64,
    #[serde(default)]
    pub deductions: Deductions,
}

impl IncomeTaxInput {
    fn validate(&self) -> Result<(), CalcError> {
        ensure_amount("salaryIncome", self.salary_income)?;
        ensure_amount("interestIncome", self.interest_income)?;
        ensure_amount("otherIncome", self.other_income)?;

        let d = &self.deductions;
        ensure_amount("section80c", d.section_80c)?;
        ensure_amount("section80d", d.section_80d)?;
        ensure_amount("section80ccd1b", d.section_80ccd_1b)?;
        ensure_amount("homeLoanInterest", d.home_loan_interest)?;
        ensure_amount("hraExemption", d.hra_exemption)?;
        ensure_amount("lta", d.lta)?;
        ensure_amount("professionalTax", d.professional_tax)?;
        ensure_amount("savingsInterest", d.savings_interest)?;
        ensure_amount("other", d.other)
    }

    fn gross_income(&self) -> f64 {
        self.salary_income + self.interest_income + self.other_income
    }
}

// ============================================================================
// Output types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlabLine {
    pub from: f64,
    pub to: Option<f64>,
    pub rate: f64,
    pub taxable_amount: f64,
    pub tax: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeductionLine {
    pub label: String,
    pub claimed: f64,
    pub allowed: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IncomeTaxResult {
    pub regime: Regime,
    pub financial_year: FinancialYear,
    pub gross_income: f64,
    pub total_deductions: f64,
    pub taxable_income: f64,
    /// Tax from the slab table before any rebate.
    pub slab_tax: f64,
    pub rebate: f64,
    pub tax_after_rebate: f64,
    pub surcharge_rate: f64,
    pub surcharge: f64,
    /// Surcharge forgone because of marginal relief.
    pub surcharge_relief: f64,
    /// Tax plus surcharge, before cess.
    pub tax_before_cess: f64,
    pub cess: f64,
    pub total_tax: f64,
    pub effective_rate: f64,
    pub deductions: Vec<DeductionLine>,
    pub slabs: Vec<SlabLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegimeComparison {
    pub old_regime: IncomeTaxResult,
    pub new_regime: IncomeTaxResult,
    pub recommended: Regime,
    pub savings: f64,
}

// ============================================================================
// Regime rules
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Rebate {
    /// Rebate up to `max` while taxable income stays at or under `threshold`.
    Capped { threshold: f64, max: f64 },
    /// Full rebate up to `threshold`; above it tax may not exceed the excess.
    MarginalRelief { threshold: f64 },
}

impl Rebate {
    fn amount(self, taxable: f64, tax: f64) -> f64 {
        match self {
            Rebate::Capped { threshold, max } => {
                if taxable <= threshold {
                    tax.min(max)
                } else {
                    0.0
                }
            }
            Rebate::MarginalRelief { threshold } => {
                if taxable <= threshold {
                    tax
                } else {
                    (tax - (taxable - threshold)).max(0.0)
                }
            }
        }
    }
}

struct Rules {
    slabs: Vec<Band>,
    surcharge: &'static [Band],
    rebate: Rebate,
}

impl Rules {
    fn for_regime(regime: Regime, year: FinancialYear, age: AgeGroup) -> Self {
        match regime {
            Regime::Old => Rules {
                slabs: vec![
                    band(0.0, 0.0),
                    band(age.basic_exemption(), 5.0),
                    band(500_000.0, 20.0),
                    band(1_000_000.0, 30.0),
                ],
                surcharge: OLD_SURCHARGE,
                rebate: Rebate::Capped {
                    threshold: OLD_REBATE_THRESHOLD,
                    max: OLD_REBATE_MAX,
                },
            },
            Regime::New => Rules {
                slabs: year.new_regime_slabs().to_vec(),
                surcharge: NEW_SURCHARGE,
                rebate: Rebate::MarginalRelief {
                    threshold: year.new_regime_rebate_threshold(),
                },
            },
        }
    }

    fn tax_after_rebate(&self, taxable: f64) -> f64 {
        let (tax, _) = slab_tax(taxable, &self.slabs);
        tax - self.rebate.amount(taxable, tax)
    }
}

/// Progressive tax over `bands`, with the per-band breakdown.
fn slab_tax(income: f64, bands: &[Band]) -> (f64, Vec<SlabLine>) {
    let mut total = 0.0;
    let mut lines = Vec::new();

    for (i, b) in bands.iter().enumerate() {
        let upper = bands.get(i + 1).map(|next| next.from);
        // Zero-width band, e.g. the 5% band when the exemption is ₹5L.
        if upper.is_some_and(|u| u <= b.from) {
            continue;
        }
        if income <= b.from {
            break;
        }
        let top = upper.map_or(income, |u| income.min(u));
        let portion = top - b.from;
        let tax = portion * b.rate / 100.0;
        total += tax;
        lines.push(SlabLine {
            from: b.from,
            to: upper,
            rate: b.rate,
            taxable_amount: round2(portion),
            tax: round2(tax),
        });
    }

    (total, lines)
}

/// Surcharge on `tax`, capped so that crossing a threshold never costs more
/// than the income above it. Returns `(surcharge, rate, relief)`.
fn surcharge_with_relief(
    taxable: f64,
    tax: f64,
    bands: &[Band],
    tax_at: impl Fn(f64) -> f64,
) -> (f64, f64, f64) {
    let Some(idx) = bands.iter().rposition(|b| taxable > b.from) else {
        return (0.0, 0.0, 0.0);
    };
    let Band {
        from: threshold,
        rate,
    } = bands[idx];
    let previous_rate = if idx == 0 { 0.0 } else { bands[idx - 1].rate };

    let raw = tax * rate / 100.0;
    let threshold_tax = tax_at(threshold);
    let ceiling = threshold_tax + threshold_tax * previous_rate / 100.0 + (taxable - threshold);

    if tax + raw > ceiling {
        let capped = (ceiling - tax).max(0.0);
        (capped, rate, raw - capped)
    } else {
        (raw, rate, 0.0)
    }
}

fn deduction_line(lines: &mut Vec<DeductionLine>, label: &str, claimed: f64, allowed: f64) {
    if claimed > 0.0 || allowed > 0.0 {
        lines.push(DeductionLine {
            label: label.to_string(),
            claimed: round2(claimed),
            allowed: round2(allowed),
        });
    }
}

fn old_regime_deductions(input: &IncomeTaxInput) -> Result<Vec<DeductionLine>, CalcError> {
    let d = &input.deductions;
    let senior = input.age_group.is_senior();
    let mut lines = Vec::new();

    let standard = OLD_STANDARD_DEDUCTION.min(input.salary_income);
    deduction_line(&mut lines, "Standard deduction", standard, standard);

    let hra_exemption = match &d.hra {
        Some(hra_input) => hra::calculate(hra_input)?.exemption,
        None => d.hra_exemption,
    };
    deduction_line(&mut lines, "HRA exemption", hra_exemption, hra_exemption);
    deduction_line(&mut lines, "LTA", d.lta, d.lta);
    deduction_line(
        &mut lines,
        "Professional tax",
        d.professional_tax,
        d.professional_tax.min(CAP_PROFESSIONAL_TAX),
    );
    deduction_line(&mut lines, "Section 80C", d.section_80c, d.section_80c.min(CAP_80C));

    let cap_80d = if senior { CAP_80D_SENIOR } else { CAP_80D };
    deduction_line(&mut lines, "Section 80D", d.section_80d, d.section_80d.min(cap_80d));
    deduction_line(
        &mut lines,
        "Section 80CCD(1B)",
        d.section_80ccd_1b,
        d.section_80ccd_1b.min(CAP_80CCD_1B),
    );
    deduction_line(
        &mut lines,
        "Home loan interest (24b)",
        d.home_loan_interest,
        d.home_loan_interest.min(CAP_HOME_LOAN_INTEREST),
    );

    let (label, cap) = if senior {
        ("Section 80TTB", CAP_80TTB)
    } else {
        ("Section 80TTA", CAP_80TTA)
    };
    let savings = d.savings_interest.min(cap).min(input.interest_income);
    deduction_line(&mut lines, label, d.savings_interest, savings);
    deduction_line(&mut lines, "Other deductions", d.other, d.other);

    Ok(lines)
}

fn new_regime_deductions(input: &IncomeTaxInput) -> Vec<DeductionLine> {
    let mut lines = Vec::new();
    let standard = input
        .financial_year
        .new_regime_standard_deduction()
        .min(input.salary_income);
    deduction_line(&mut lines, "Standard deduction", standard, standard);
    lines
}

// ============================================================================
// Entry points
// ============================================================================

/// Tax under a single regime.
pub fn calculate(input: &IncomeTaxInput, regime: Regime) -> Result<IncomeTaxResult, CalcError> {
    input.validate()?;

    let deductions = match regime {
        Regime::Old => old_regime_deductions(input)?,
        Regime::New => new_regime_deductions(input),
    };
    let total_deductions: f64 = deductions.iter().map(|l| l.allowed).sum();

    let gross_income = input.gross_income();
    let taxable_income = (gross_income - total_deductions).max(0.0);

    let rules = Rules::for_regime(regime, input.financial_year, input.age_group);
    let (slab_tax, slabs) = slab_tax(taxable_income, &rules.slabs);
    let rebate = rules.rebate.amount(taxable_income, slab_tax);
    let tax_after_rebate = slab_tax - rebate;

    let (surcharge, surcharge_rate, surcharge_relief) =
        surcharge_with_relief(taxable_income, tax_after_rebate, rules.surcharge, |income| {
            rules.tax_after_rebate(income)
        });

    let tax_before_cess = tax_after_rebate + surcharge;
    let cess = tax_before_cess * CESS_RATE / 100.0;
    let total_tax = round_to_nearest(tax_before_cess + cess, 10.0);

    let effective_rate = if gross_income > 0.0 {
        round2(total_tax / gross_income * 100.0)
    } else {
        0.0
    };

    Ok(IncomeTaxResult {
        regime,
        financial_year: input.financial_year,
        gross_income: round2(gross_income),
        total_deductions: round2(total_deductions),
        taxable_income: round2(taxable_income),
        slab_tax: round2(slab_tax),
        rebate: round2(rebate),
        tax_after_rebate: round2(tax_after_rebate),
        surcharge_rate,
        surcharge: round2(surcharge),
        surcharge_relief: round2(surcharge_relief),
        tax_before_cess: round2(tax_before_cess),
        cess: round2(cess),
        total_tax,
        effective_rate,
        deductions,
        slabs,
    })
}

/// Run both regimes; ties go to the new regime since it is the default.
pub fn compare(input: &IncomeTaxInput) -> Result<RegimeComparison, CalcError> {
    let old_regime = calculate(input, Regime::Old)?;
    let new_regime = calculate(input, Regime::New)?;

    let recommended = if new_regime.total_tax <= old_regime.total_tax {
        Regime::New
    } else {
        Regime::Old
    };
    let savings = (old_regime.total_tax - new_regime.total_tax).abs();

    Ok(RegimeComparison {
        old_regime,
        new_regime,
        recommended,
        savings,
    })
}
