use serde::Deserialize;

/// Query parameters for the prime endpoint (`?n=` or `?key=`).
///
/// Both are kept as raw strings so that malformed values reach the handler
/// and get a structured answer instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PrimeParams {
    pub n: Option<String>,
    pub key: Option<String>,
}
