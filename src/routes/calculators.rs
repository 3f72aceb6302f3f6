/**
 * Calculator Routes
 * Thin JSON wrappers over the pure functions in `calc`
 */
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::calc::{
    gst::{self, GstInput, GstResult},
    gstin::{self, GstinDetails},
    hra::{self, HraInput, HraResult},
    income_tax::{self, IncomeTaxInput, IncomeTaxResult, RegimeComparison},
    tds::{self, TdsInput, TdsResult, TdsSection},
};
use crate::error::AppError;

/// Single-regime result, or both regimes side by side when no regime was
/// requested.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IncomeTaxResponse {
    Single { result: IncomeTaxResult },
    Comparison { comparison: RegimeComparison },
}

#[derive(Debug, Serialize)]
pub struct TdsSectionsResponse {
    pub sections: &'static [TdsSection],
}

#[derive(Debug, Deserialize, Serialize)]
pub struct GstSearchRequest {
    #[serde(default)]
    pub gstin: String,
}

/// POST /api/calculators/gst
pub async fn gst_calculator(Json(input): Json<GstInput>) -> Result<Json<GstResult>, AppError> {
    Ok(Json(gst::calculate(&input)?))
}

/// POST /api/calculators/hra
pub async fn hra_calculator(Json(input): Json<HraInput>) -> Result<Json<HraResult>, AppError> {
    Ok(Json(hra::calculate(&input)?))
}

/// POST /api/calculators/income-tax
pub async fn income_tax_calculator(
    Json(input): Json<IncomeTaxInput>,
) -> Result<Json<IncomeTaxResponse>, AppError> {
    let response = match input.regime {
        Some(regime) => IncomeTaxResponse::Single {
            result: income_tax::calculate(&input, regime)?,
        },
        None => IncomeTaxResponse::Comparison {
            comparison: income_tax::compare(&input)?,
        },
    };
    Ok(Json(response))
}

/// POST /api/calculators/tds
pub async fn tds_calculator(Json(input): Json<TdsInput>) -> Result<Json<TdsResult>, AppError> {
    Ok(Json(tds::calculate(&input)?))
}

/// GET /api/calculators/tds/sections
pub async fn tds_sections() -> Json<TdsSectionsResponse> {
    Json(TdsSectionsResponse {
        sections: tds::SECTIONS,
    })
}

/// POST /api/gst-search - format check and positional decode. A malformed
/// GSTIN is still a 200 with `valid: false`.
pub async fn gst_search(
    Json(payload): Json<GstSearchRequest>,
) -> Result<Json<GstinDetails>, AppError> {
    if payload.gstin.trim().is_empty() {
        return Err(AppError::validation("GSTIN is required"));
    }
    let details = gstin::lookup(&payload.gstin);
    tracing::debug!(valid = details.valid, "gstin lookup");
    Ok(Json(details))
}
