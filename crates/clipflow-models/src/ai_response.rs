//! Typed shape of a generation model's response, after JSON decoding but
//! before per-moment validation. See [`crate::moment::Moment`] for the
//! validated form.

use serde::{Deserialize, Serialize};

/// One moment as it appears straight out of the model's JSON, before range
/// validation, sorting, or overlap pruning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMoment {
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub title: String,
}

/// Outcome of decoding a generation model's response body.
#[derive(Debug, Clone, PartialEq)]
pub enum AiResponse {
    /// The response was a bare JSON array of moments.
    Array(Vec<RawMoment>),
    /// The response was a JSON object wrapping the moment array under a
    /// known key (`moments`, `output`, `final_output`, ...) or under the
    /// first list-valued field whose elements look like moments.
    ObjectWrapping(Vec<RawMoment>),
    /// Neither of the above; `recovered` holds whatever objects the regex
    /// fallback could salvage (possibly empty).
    Malformed { recovered: Vec<RawMoment> },
}

impl AiResponse {
    pub fn moments(&self) -> &[RawMoment] {
        match self {
            AiResponse::Array(m) => m,
            AiResponse::ObjectWrapping(m) => m,
            AiResponse::Malformed { recovered } => recovered,
        }
    }
}
