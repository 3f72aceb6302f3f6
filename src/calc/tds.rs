//! Tax Deducted at Source against the fixed section table.

use serde::{Deserialize, Serialize};

use super::{ensure_amount, round2, CalcError};

/// Rate applied under section 206AA when the deductee has no PAN.
pub const NO_PAN_RATE: f64 = 20.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TdsSection {
    pub code: &'static str,
    pub description: &'static str,
    /// Percent.
    pub rate: f64,
    /// Annual/single-payment threshold below which no deduction is required.
    pub threshold: Option<f64>,
}

const fn section(
    code: &'static str,
    description: &'static str,
    rate: f64,
    threshold: Option<f64>,
) -> TdsSection {
    TdsSection {
        code,
        description,
        rate,
        threshold,
    }
}

pub const SECTIONS: &[TdsSection] = &[
    section("192A", "EPF premature withdrawal", 10.0, Some(50_000.0)),
    section("193", "Interest on securities", 10.0, Some(10_000.0)),
    section("194", "Dividends", 10.0, Some(5_000.0)),
    section("194A", "Interest other than on securities", 10.0, Some(40_000.0)),
    section("194B", "Lottery and game show winnings", 30.0, Some(10_000.0)),
    section("194BB", "Horse race winnings", 30.0, Some(10_000.0)),
    section("194C", "Contractor payments (individual/HUF)", 1.0, Some(30_000.0)),
    section("194C-O", "Contractor payments (others)", 2.0, Some(30_000.0)),
    section("194D", "Insurance commission", 5.0, Some(15_000.0)),
    section("194DA", "Life insurance policy payout", 5.0, Some(100_000.0)),
    section("194G", "Commission on lottery tickets", 5.0, Some(15_000.0)),
    section("194H", "Commission or brokerage", 5.0, Some(15_000.0)),
    section("194I-A", "Rent on plant and machinery", 2.0, Some(240_000.0)),
    section("194I-B", "Rent on land, building or furniture", 10.0, Some(240_000.0)),
    section("194IA", "Transfer of immovable property", 1.0, Some(5_000_000.0)),
    section("194IB", "Rent paid by individuals/HUF", 5.0, Some(50_000.0)),
    section("194J-A", "Fees for technical services", 2.0, Some(30_000.0)),
    section("194J-B", "Fees for professional services", 10.0, Some(30_000.0)),
    section("194K", "Income from mutual fund units", 10.0, Some(5_000.0)),
    section("194M", "Payments by individuals/HUF to contractors and professionals", 5.0, Some(5_000_000.0)),
    section("194N", "Cash withdrawal", 2.0, Some(10_000_000.0)),
    section("194O", "E-commerce operators", 1.0, Some(500_000.0)),
    section("194Q", "Purchase of goods", 0.1, Some(5_000_000.0)),
    section("194R", "Business perquisites", 10.0, Some(20_000.0)),
    section("194S", "Transfer of virtual digital assets", 1.0, Some(50_000.0)),
];

/// Case-insensitive lookup by section code.
pub fn find_section(code: &str) -> Option<&'static TdsSection> {
    let code = code.trim();
    SECTIONS.iter().find(|s| s.code.eq_ignore_ascii_case(code))
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TdsInput {
    pub amount: f64,
    pub section: String,
    #[serde(default = "default_pan_available")]
    pub pan_available: bool,
}

fn default_pan_available() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TdsResult {
    pub section: &'static str,
    pub description: &'static str,
    pub amount: f64,
    pub rate: f64,
    pub tds_amount: f64,
    pub net_amount: f64,
    pub threshold: Option<f64>,
}

pub fn calculate(input: &TdsInput) -> Result<TdsResult, CalcError> {
    ensure_amount("amount", input.amount)?;
    let section =
        find_section(&input.section).ok_or_else(|| CalcError::UnknownSection(input.section.clone()))?;

    let rate = if input.pan_available {
        section.rate
    } else {
        section.rate.max(NO_PAN_RATE)
    };
    let tds = input.amount * rate / 100.0;

    Ok(TdsResult {
        section: section.code,
        description: section.description,
        amount: round2(input.amount),
        rate,
        tds_amount: round2(tds),
        net_amount: round2(input.amount - tds),
        threshold: section.threshold,
    })
}
