//! Fee-rate lookup and the fixed transaction size model.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// mempool.space keeps the JSON shape of the original bitcoinfees.earn.com
/// recommendation endpoint: `{"fastestFee": <sat/vB>, ...}`.
pub const DEFAULT_FEE_API: &str = "https://mempool.space/api/v1/fees/recommended";

const FEE_API_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct RecommendedFees {
    #[serde(rename = "fastestFee")]
    fastest_fee: u64,
}

/// Map an HTTP status and body to a fee rate or one of the two fee-service
/// error kinds. Split out from the request so the taxonomy is testable
/// without a live endpoint.
pub fn fee_rate_from_response(status: u16, body: &str) -> Result<u64> {
    match status {
        200 => {
            let fees: RecommendedFees = serde_json::from_str(body)
                .map_err(|e| Error::FeeServiceRequest(format!("malformed response: {e}")))?;
            Ok(fees.fastest_fee)
        }
        404 => Err(Error::FeeServiceNotFound),
        other => Err(Error::FeeServiceRequest(format!("HTTP status {other}"))),
    }
}

/// One synchronous GET with a bounded timeout. No retry, no caching.
pub fn recommended_fee_rate(url: &str) -> Result<u64> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FEE_API_TIMEOUT)
        .build()
        .map_err(|e| Error::FeeServiceRequest(e.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| Error::FeeServiceRequest(e.to_string()))?;
    let status = response.status().as_u16();
    let body = response
        .text()
        .map_err(|e| Error::FeeServiceRequest(e.to_string()))?;
    fee_rate_from_response(status, &body)
}

/// Linear size estimate in bytes for a legacy (non-segwit) transaction.
pub fn estimate_tx_size(inputs: usize, outputs: usize) -> usize {
    inputs * 180 + outputs * 34 + 10 + inputs
}
