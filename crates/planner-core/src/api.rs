//! JSON envelope used by the calendar backend.
//!
//! Plugin endpoints answer `{"data": <payload>}`; some host adapters unwrap the
//! payload before handing it over. Both shapes are accepted.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::Result;

#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

/// Parse a backend payload, with or without the `data` envelope.
pub fn from_api_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    let envelope: Envelope<T> = serde_json::from_str(json)?;
    Ok(match envelope {
        Envelope::Wrapped { data } => data,
        Envelope::Bare(payload) => payload,
    })
}
