//! Chart envelope decoder.
//!
//! The provider has served two response shapes over time:
//!
//! - **Legacy**: `{"data": {"chart": [...]}}` with no status to check.
//! - **Status-checked**: `{"data": {...}, "status": {"rCode": 200, ...}}`. The
//!   chart is only trusted when `rCode == 200`; `data.symbol` confirms the ticker.
//!
//! The shape is picked by the presence of a non-null top-level `status`.

use crate::data::provider::DataError;
use crate::domain::{PricePoint, PriceSeries, RawPayload};
use flate2::read::GzDecoder;
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;

const STATUS_OK: i64 = 200;

/// Decoded chart for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChart {
    pub series: PriceSeries,
    /// Symbol echoed back by a status-checked envelope, uppercased.
    pub confirmed_symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderStatus {
    #[serde(rename = "rCode")]
    r_code: i64,
    #[serde(rename = "bCodeMessage", default)]
    b_code_message: Option<Vec<BCodeMessage>>,
    #[serde(rename = "developerMessage", default)]
    developer_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BCodeMessage {
    #[serde(rename = "errorMessage", default)]
    error_message: Option<String>,
}

impl ProviderStatus {
    fn reason(&self) -> Option<String> {
        self.b_code_message
            .iter()
            .flatten()
            .find_map(|m| m.error_message.clone())
            .or_else(|| self.developer_message.clone())
    }
}

enum Envelope {
    Legacy { data: Value },
    StatusChecked { status: ProviderStatus, data: Value },
}

impl Envelope {
    fn detect(mut root: Value) -> Result<Self, DataError> {
        let obj = root
            .as_object_mut()
            .ok_or_else(|| DataError::InvalidJson("top level is not an object".into()))?;
        let data = obj.remove("data").unwrap_or(Value::Null);

        match obj.remove("status") {
            None | Some(Value::Null) => Ok(Self::Legacy { data }),
            Some(status) => {
                let status: ProviderStatus = serde_json::from_value(status)
                    .map_err(|e| DataError::InvalidJson(format!("malformed status object: {e}")))?;
                Ok(Self::StatusChecked { status, data })
            }
        }
    }

    fn into_chart(self) -> Result<DecodedChart, DataError> {
        match self {
            Self::Legacy { data } => Ok(DecodedChart {
                series: parse_chart(&data)?,
                confirmed_symbol: None,
            }),
            Self::StatusChecked { status, data } => {
                if status.r_code != STATUS_OK {
                    return Err(DataError::TickerNotFound {
                        code: status.r_code,
                        message: status.reason(),
                    });
                }
                let series = parse_chart(&data)?;
                let confirmed_symbol = data
                    .get("symbol")
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_uppercase())
                    .filter(|s| !s.is_empty());
                Ok(DecodedChart {
                    series,
                    confirmed_symbol,
                })
            }
        }
    }
}

/// Decode a raw chart payload: gunzip, parse, check status, flatten points.
///
/// Each step short-circuits; a series is either fully parsed or not returned.
pub fn decode(payload: &RawPayload) -> Result<DecodedChart, DataError> {
    let body = gunzip(payload.as_bytes())?;
    let root: Value =
        serde_json::from_slice(&body).map_err(|e| DataError::InvalidJson(e.to_string()))?;
    Envelope::detect(root)?.into_chart()
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>, DataError> {
    if bytes.is_empty() {
        return Err(DataError::NotGzip("empty payload".into()));
    }
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut out)
        .map_err(|e| DataError::NotGzip(e.to_string()))?;
    Ok(out)
}

fn parse_chart(data: &Value) -> Result<PriceSeries, DataError> {
    if data.is_null() {
        return Err(DataError::InvalidJson("data is null".into()));
    }
    let chart = data
        .get("chart")
        .and_then(Value::as_array)
        .ok_or_else(|| DataError::InvalidJson("data.chart is missing or not a list".into()))?;

    chart
        .iter()
        .enumerate()
        .map(|(index, point)| parse_point(index, point))
        .collect()
}

fn parse_point(index: usize, point: &Value) -> Result<PricePoint, DataError> {
    let close = point
        .get("y")
        .ok_or_else(|| DataError::UnparseablePoint {
            index,
            reason: "missing closing price field `y`".into(),
        })?
        .as_f64()
        .ok_or_else(|| DataError::UnparseablePoint {
            index,
            reason: "closing price `y` is not a number".into(),
        })?;

    Ok(PricePoint {
        close,
        timestamp_ms: point.get("x").and_then(Value::as_i64),
    })
}
